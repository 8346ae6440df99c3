//! Exported-function records and the Zig-to-ctypes type mapping.

use serde::{Deserialize, Serialize};

/// A function declared with `export fn` in Zig source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFunction {
    /// Symbol name
    pub name: String,

    /// Return type as spelled in the source
    pub return_type: String,

    /// Runtime parameters, in declaration order
    pub params: Vec<ExportParam>,

    /// Text of the `///` comment block above the declaration
    #[serde(default)]
    pub doc: String,

    /// Whether the call may run with the GIL released.
    ///
    /// The scanner always sets this; the generator also honors the global
    /// `lock-release` setting.
    #[serde(default = "default_release_lock")]
    pub release_lock: bool,
}

fn default_release_lock() -> bool {
    true
}

impl ExportedFunction {
    /// Create a function with the given name and return type.
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        ExportedFunction {
            name: name.into(),
            return_type: return_type.into(),
            params: Vec::new(),
            doc: String::new(),
            release_lock: true,
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(ExportParam::new(name, ty));
        self
    }

    /// Set the doc text.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Whether the function returns a value.
    pub fn returns_value(&self) -> bool {
        !self.return_type.is_empty() && TypeDescriptor::map(&self.return_type) != TypeDescriptor::Void
    }
}

/// A runtime parameter of an exported function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParam {
    /// Parameter name
    pub name: String,

    /// Type as spelled in the source
    #[serde(rename = "type")]
    pub ty: String,
}

impl ExportParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        ExportParam {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// How a value crosses the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// No value (`void`)
    Void,

    /// Fixed-width signed integers
    Int8,
    Int16,
    Int32,
    Int64,

    /// Fixed-width unsigned integers
    UInt8,
    UInt16,
    UInt32,
    UInt64,

    /// C ABI integers whose width follows the platform
    CChar,
    CShort,
    CUShort,
    CInt,
    CUInt,
    CLong,
    CULong,
    CLongLong,
    CULongLong,

    /// Size types
    Size,
    SSize,

    /// Floating point. `f16` maps to `Float32`: ctypes has no half float.
    Float32,
    Float64,

    /// Boolean
    Bool,

    /// Null-terminated byte string
    CString,

    /// Anything else that is passed as an address
    Pointer,
}

impl TypeDescriptor {
    /// Map a Zig type spelling. Unknown spellings become [`TypeDescriptor::Pointer`].
    pub fn map(raw: &str) -> Self {
        Self::lookup(raw).unwrap_or(TypeDescriptor::Pointer)
    }

    /// Map a Zig type spelling if a rule covers it.
    ///
    /// Returns `None` for spellings that only the opaque-pointer default
    /// would cover.
    pub fn lookup(raw: &str) -> Option<Self> {
        let spelling = normalize(raw);
        let mut s = spelling.as_str();

        loop {
            if let Some(desc) = Self::lookup_exact(s) {
                return Some(desc);
            }

            if is_pointer_shaped(s) {
                return Some(TypeDescriptor::Pointer);
            }

            // Optionals map like their payload; an optional pointer is opaque.
            s = s.strip_prefix('?')?.trim_start();
            if is_pointer_shaped(s) {
                return Some(TypeDescriptor::Pointer);
            }
        }
    }

    fn lookup_exact(s: &str) -> Option<Self> {
        let desc = match s {
            "i8" => TypeDescriptor::Int8,
            "i16" => TypeDescriptor::Int16,
            "i32" => TypeDescriptor::Int32,
            "i64" => TypeDescriptor::Int64,
            "u8" => TypeDescriptor::UInt8,
            "u16" => TypeDescriptor::UInt16,
            "u32" => TypeDescriptor::UInt32,
            "u64" => TypeDescriptor::UInt64,
            "f16" | "f32" => TypeDescriptor::Float32,
            "f64" => TypeDescriptor::Float64,
            "bool" => TypeDescriptor::Bool,
            "c_char" => TypeDescriptor::CChar,
            "c_short" => TypeDescriptor::CShort,
            "c_ushort" => TypeDescriptor::CUShort,
            "c_int" => TypeDescriptor::CInt,
            "c_uint" => TypeDescriptor::CUInt,
            "c_long" => TypeDescriptor::CLong,
            "c_ulong" => TypeDescriptor::CULong,
            "c_longlong" => TypeDescriptor::CLongLong,
            "c_ulonglong" => TypeDescriptor::CULongLong,
            "usize" => TypeDescriptor::Size,
            "isize" => TypeDescriptor::SSize,
            "void" => TypeDescriptor::Void,
            "[*c]const u8" | "[*c]u8" | "*const u8" | "*u8" | "[*]const u8" | "[*]u8"
            | "[*:0]const u8" | "[*:0]u8" => TypeDescriptor::CString,
            _ => return None,
        };
        Some(desc)
    }

    /// The ctypes expression for this descriptor.
    pub fn as_ctypes(&self) -> &'static str {
        match self {
            TypeDescriptor::Void => "None",
            TypeDescriptor::Int8 => "ctypes.c_int8",
            TypeDescriptor::Int16 => "ctypes.c_int16",
            TypeDescriptor::Int32 => "ctypes.c_int32",
            TypeDescriptor::Int64 => "ctypes.c_int64",
            TypeDescriptor::UInt8 => "ctypes.c_uint8",
            TypeDescriptor::UInt16 => "ctypes.c_uint16",
            TypeDescriptor::UInt32 => "ctypes.c_uint32",
            TypeDescriptor::UInt64 => "ctypes.c_uint64",
            TypeDescriptor::CChar => "ctypes.c_char",
            TypeDescriptor::CShort => "ctypes.c_short",
            TypeDescriptor::CUShort => "ctypes.c_ushort",
            TypeDescriptor::CInt => "ctypes.c_int",
            TypeDescriptor::CUInt => "ctypes.c_uint",
            TypeDescriptor::CLong => "ctypes.c_long",
            TypeDescriptor::CULong => "ctypes.c_ulong",
            TypeDescriptor::CLongLong => "ctypes.c_longlong",
            TypeDescriptor::CULongLong => "ctypes.c_ulonglong",
            TypeDescriptor::Size => "ctypes.c_size_t",
            TypeDescriptor::SSize => "ctypes.c_ssize_t",
            TypeDescriptor::Float32 => "ctypes.c_float",
            TypeDescriptor::Float64 => "ctypes.c_double",
            TypeDescriptor::Bool => "ctypes.c_bool",
            TypeDescriptor::CString => "ctypes.c_char_p",
            TypeDescriptor::Pointer => "ctypes.c_void_p",
        }
    }
}

/// Trim and collapse internal whitespace runs to one space.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_pointer_shaped(s: &str) -> bool {
    s.starts_with('*') || s.starts_with("[*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_table() {
        assert_eq!(TypeDescriptor::map("i32"), TypeDescriptor::Int32);
        assert_eq!(TypeDescriptor::map("u64"), TypeDescriptor::UInt64);
        assert_eq!(TypeDescriptor::map("f64"), TypeDescriptor::Float64);
        assert_eq!(TypeDescriptor::map("bool"), TypeDescriptor::Bool);
        assert_eq!(TypeDescriptor::map("usize"), TypeDescriptor::Size);
        assert_eq!(TypeDescriptor::map("c_long"), TypeDescriptor::CLong);
        assert_eq!(TypeDescriptor::map("void"), TypeDescriptor::Void);
    }

    #[test]
    fn test_half_float_is_approximated() {
        assert_eq!(TypeDescriptor::map("f16"), TypeDescriptor::Float32);
    }

    #[test]
    fn test_byte_pointers_are_strings() {
        for s in ["[*c]const u8", "[*c]u8", "*const u8", "*u8", "[*]const u8", "[*:0]const u8"] {
            assert_eq!(TypeDescriptor::map(s), TypeDescriptor::CString, "{}", s);
        }
        assert_eq!(TypeDescriptor::map("  [*c]const   u8 "), TypeDescriptor::CString);
    }

    #[test]
    fn test_other_pointers_are_opaque() {
        assert_eq!(TypeDescriptor::map("*const i32"), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::map("[*]f64"), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::lookup("*Context"), Some(TypeDescriptor::Pointer));
    }

    #[test]
    fn test_optional_types() {
        assert_eq!(TypeDescriptor::map("?*anyopaque"), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::map("?[*c]const u8"), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::map("?i32"), TypeDescriptor::Int32);
    }

    #[test]
    fn test_deeply_nested_optionals() {
        let spelling = format!("{}i32", "?".repeat(100_000));
        assert_eq!(TypeDescriptor::map(&spelling), TypeDescriptor::Int32);
        let spelling = format!("{}Handle", "? ".repeat(100_000));
        assert_eq!(TypeDescriptor::lookup(&spelling), None);
    }

    #[test]
    fn test_unknown_falls_back_to_pointer() {
        assert_eq!(TypeDescriptor::lookup("MyStruct"), None);
        assert_eq!(TypeDescriptor::map("MyStruct"), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::map(""), TypeDescriptor::Pointer);
        assert_eq!(TypeDescriptor::map("?"), TypeDescriptor::Pointer);
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let inputs = ["i32", "?*u8", "garbage!!", "[*c]u8", "??i8", "\u{1F600}"];
        for s in inputs {
            assert_eq!(TypeDescriptor::map(s), TypeDescriptor::map(s));
        }
    }

    #[test]
    fn test_ctypes_names() {
        assert_eq!(TypeDescriptor::Int32.as_ctypes(), "ctypes.c_int32");
        assert_eq!(TypeDescriptor::Void.as_ctypes(), "None");
        assert_eq!(TypeDescriptor::CString.as_ctypes(), "ctypes.c_char_p");
        assert_eq!(TypeDescriptor::Pointer.as_ctypes(), "ctypes.c_void_p");
    }

    #[test]
    fn test_returns_value() {
        assert!(ExportedFunction::new("f", "i32").returns_value());
        assert!(!ExportedFunction::new("f", "void").returns_value());
    }
}
