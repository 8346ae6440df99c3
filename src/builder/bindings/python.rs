//! Python loader generation.
//!
//! Produces a single `__init__.py` that finds and loads the compiled
//! library with `ctypes` and defines one wrapper per exported function.
//! No other generated files are needed.

use std::collections::HashSet;

use super::types::{ExportedFunction, TypeDescriptor};

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Names a wrapper body reads; a parameter with one of these names would
/// shadow it.
const WRAPPER_NAMES: &[&str] = &[
    "ctypes",
    "getattr",
    "_load_library",
    "_release_gil",
    "_zw_lib",
    "_zw_fn",
];

/// Generator for the ctypes loader module.
#[derive(Debug, Clone)]
pub struct PythonGenerator {
    module_name: String,
    lib_filename: String,
    lock_release: bool,
    version: String,
}

impl PythonGenerator {
    /// Create a generator for `module_name` loading `lib_filename`.
    pub fn new(module_name: impl Into<String>, lib_filename: impl Into<String>) -> Self {
        PythonGenerator {
            module_name: module_name.into(),
            lib_filename: lib_filename.into(),
            lock_release: true,
            version: "0.1.0".to_string(),
        }
    }

    /// Enable or disable the GIL release scope around native calls.
    pub fn with_lock_release(mut self, enabled: bool) -> Self {
        self.lock_release = enabled;
        self
    }

    /// Set the `__version__` recorded in the module.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Generate the module source.
    pub fn generate(&self, functions: &[ExportedFunction]) -> String {
        let mut out = String::new();

        self.emit_header(&mut out, functions);
        self.emit_loader(&mut out);
        if self.lock_release {
            emit_release_scope(&mut out);
        }

        section(&mut out, "Function Bindings");
        for func in functions {
            self.emit_function(&mut out, func);
        }

        section(&mut out, "Module Initialization");
        out.push_str("# Load eagerly so the first call is fast; on failure, retry at first call.\n");
        out.push_str("try:\n");
        out.push_str("    _load_library()\n");
        out.push_str("except OSError:\n");
        out.push_str("    pass\n");

        out
    }

    fn emit_header(&self, out: &mut String, functions: &[ExportedFunction]) {
        out.push_str("\"\"\"\n");
        out.push_str(&format!(
            "{} - Python bindings for a Zig library.\n",
            escape_docstring(&self.module_name)
        ));
        out.push_str("\nThis module was generated by zigwheel. Do not edit.\n");
        out.push_str("\"\"\"\n\n");
        out.push_str("from __future__ import annotations\n\n");
        out.push_str("import ctypes\n");
        out.push_str("import sys\n");
        out.push_str("import threading\n");
        out.push_str("from pathlib import Path\n");
        out.push_str("from typing import Any, List, Optional\n\n");

        out.push_str(&format!("__version__ = {}\n", py_str(&self.version)));
        out.push_str("__all__ = [\n");
        for func in functions {
            out.push_str(&format!("    {},\n", py_str(&python_name(&func.name))));
        }
        out.push_str("]\n\n");
    }

    fn emit_loader(&self, out: &mut String) {
        let loader = if self.lock_release {
            "ctypes.CDLL"
        } else {
            "ctypes.PyDLL"
        };

        section(out, "Library Loading");
        out.push_str(&format!("_MODULE_NAME = {}\n", py_str(&self.module_name)));
        out.push_str(&format!("_LIB_FILENAME = {}\n", py_str(&self.lib_filename)));
        out.push_str("_lib: Optional[ctypes.CDLL] = None\n");
        out.push_str("_lib_lock = threading.Lock()\n\n\n");

        out.push_str(
            r#"def _library_candidates() -> List[str]:
    """File names the native library may have on this platform."""
    if sys.platform == "win32":
        return [_LIB_FILENAME, f"{_MODULE_NAME}.dll", f"lib{_MODULE_NAME}.dll"]
    if sys.platform == "darwin":
        return [_LIB_FILENAME, f"lib{_MODULE_NAME}.dylib", f"{_MODULE_NAME}.dylib"]
    return [_LIB_FILENAME, f"lib{_MODULE_NAME}.so", f"{_MODULE_NAME}.so"]


def _get_lib_path() -> Path:
    """Find the native library next to this module."""
    module_dir = Path(__file__).resolve().parent
    lib_names = _library_candidates()
    for name in lib_names:
        lib_path = module_dir / name
        if lib_path.exists():
            return lib_path
    raise OSError(
        f"Could not find {_MODULE_NAME} native library. "
        f"Searched in {module_dir} for: {lib_names}"
    )


"#,
        );

        out.push_str(&format!(
            r#"def _load_library() -> ctypes.CDLL:
    """Load the native library on first use and reuse the handle afterwards."""
    global _lib
    lib = _lib
    if lib is not None:
        return lib
    with _lib_lock:
        if _lib is None:
            lib_path = _get_lib_path()
            try:
                _lib = {loader}(str(lib_path))
            except OSError as e:
                raise OSError(
                    f"Failed to load {{_MODULE_NAME}} native library from {{lib_path}}: {{e}}"
                ) from e
        return _lib


"#
        ));
    }

    fn emit_function(&self, out: &mut String, func: &ExportedFunction) {
        let py_func = python_name(&func.name);
        if py_func != func.name {
            tracing::warn!(
                "Exported function `{}` is a Python keyword; it is bound as `{}`",
                func.name,
                py_func
            );
        }

        let arg_names = python_param_names(func);
        let param_list = arg_names.join(", ");

        let argtypes: Vec<&str> = func
            .params
            .iter()
            .map(|p| {
                warn_if_fallback(&func.name, &format!("parameter `{}`", p.name), &p.ty);
                TypeDescriptor::map(&p.ty).as_ctypes()
            })
            .collect();

        warn_if_fallback(&func.name, "return value", &func.return_type);
        let restype = TypeDescriptor::map(&func.return_type).as_ctypes();

        out.push_str(&format!("def {}({}):\n", py_func, param_list));
        emit_docstring(out, func);

        out.push_str("    _zw_lib = _load_library()\n");
        out.push_str(&format!(
            "    _zw_fn = getattr(_zw_lib, {})\n",
            py_str(&func.name)
        ));
        out.push_str(&format!("    _zw_fn.argtypes = [{}]\n", argtypes.join(", ")));
        out.push_str(&format!("    _zw_fn.restype = {}\n", restype));

        if self.lock_release && func.release_lock {
            out.push_str("    with _release_gil:\n");
            out.push_str(&format!("        return _zw_fn({})\n", param_list));
        } else {
            out.push_str(&format!("    return _zw_fn({})\n", param_list));
        }
        out.push_str("\n\n");
    }
}

fn section(out: &mut String, title: &str) {
    let rule = "# ".to_string() + &"=".repeat(77);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("# {}\n", title));
    out.push_str(&rule);
    out.push_str("\n\n");
}

fn emit_release_scope(out: &mut String) {
    section(out, "GIL Management");
    out.push_str(
        r#"class _ReleaseGIL:
    """Scope around a native call that runs without the GIL.

    The library is loaded with ctypes.CDLL, which drops the GIL for the whole
    foreign call and takes it back before returning, including when the call
    raises. The scope counts calls in flight and always balances on exit.
    """

    __slots__ = ("_active", "_lock")

    def __init__(self) -> None:
        self._active = 0
        self._lock = threading.Lock()

    def __enter__(self) -> "_ReleaseGIL":
        with self._lock:
            self._active += 1
        return self

    def __exit__(self, *args: Any) -> None:
        with self._lock:
            self._active -= 1

    @property
    def active(self) -> int:
        """Number of native calls currently in flight."""
        return self._active


_release_gil = _ReleaseGIL()


"#,
    );
}

fn emit_docstring(out: &mut String, func: &ExportedFunction) {
    out.push_str(&format!("    \"\"\"{}\n", func.name));

    if !func.doc.is_empty() {
        out.push('\n');
        for line in func.doc.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                out.push_str(&format!("    {}\n", escape_docstring(line)));
            }
        }
    }

    if !func.params.is_empty() {
        out.push_str("\n    Args:\n");
        for p in &func.params {
            out.push_str(&format!(
                "        {}: {}\n",
                escape_docstring(&p.name),
                escape_docstring(&p.ty)
            ));
        }
    }

    if func.returns_value() {
        out.push_str("\n    Returns:\n");
        out.push_str(&format!("        {}\n", escape_docstring(&func.return_type)));
    }

    out.push_str("    \"\"\"\n");
}

fn warn_if_fallback(func: &str, position: &str, ty: &str) {
    if TypeDescriptor::lookup(ty).is_none() {
        tracing::warn!(
            "`{}`: {} has unrecognized type `{}`; it is passed as an opaque pointer (ctypes.c_void_p)",
            func,
            position,
            ty
        );
    }
}

/// Identifier safe to use in Python source.
fn python_name(name: &str) -> String {
    if PY_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Python argument names in declaration order, made unique.
fn python_param_names(func: &ExportedFunction) -> Vec<String> {
    let mut seen = HashSet::new();
    func.params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut name = python_name(&p.name);
            if WRAPPER_NAMES.contains(&name.as_str()) {
                name.push('_');
            }
            if !seen.insert(name.clone()) {
                name = format!("{}_{}", name, i);
                seen.insert(name.clone());
            }
            name
        })
        .collect()
}

/// A double-quoted Python string literal.
fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text that can sit inside a `"""` docstring unchanged.
fn escape_docstring(s: &str) -> String {
    s.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}
