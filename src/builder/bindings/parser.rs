//! Zig export scanner.
//!
//! Finds `export fn` declarations in Zig source text without parsing Zig.
//! Only the declaration head is matched (doc comments, optional `pub`,
//! `export fn`, name, parameter list, return type, opening brace); function
//! bodies are never looked at.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use super::types::{ExportParam, ExportedFunction};

/// File extension of recognized source files.
pub const SOURCE_EXTENSION: &str = "zig";

fn export_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?m)^(?P<doc>(?:[ \t]*///[^\n]*\n)*)",
            r"[ \t]*(?:pub\s+)?export\s+fn\s+",
            r"(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*",
            r"\((?P<params>(?:[^()]|\([^()]*\))*)\)\s*",
            r"(?P<ret>[^{};]+?)\s*\{",
        ))
        .expect("export pattern is valid")
    })
}

fn callconv_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^callconv\s*\([^)]*\)\s*").expect("callconv pattern is valid")
    })
}

/// Scanner for exported functions in Zig sources.
#[derive(Debug, Default)]
pub struct ExportScanner;

impl ExportScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every `.zig` file under `src_dir`, in sorted path order.
    ///
    /// Unreadable files are skipped with a warning; this never fails.
    pub fn scan_dir(&self, src_dir: &Path) -> Vec<ExportedFunction> {
        let mut functions = Vec::new();

        for path in source_files(src_dir) {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            let source = match String::from_utf8(bytes) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    continue;
                }
            };

            let found = self.parse_content(&source);
            tracing::debug!("{}: {} exported functions", path.display(), found.len());
            functions.extend(found);
        }

        warn_duplicates(&functions);
        functions
    }

    /// Extract exported functions from one source text, in source order.
    pub fn parse_content(&self, source: &str) -> Vec<ExportedFunction> {
        let mut functions = Vec::new();

        for cap in export_regex().captures_iter(source) {
            let name = &cap["name"];

            let return_type = callconv_regex()
                .replace(cap["ret"].trim(), "")
                .trim()
                .to_string();

            functions.push(ExportedFunction {
                name: name.to_string(),
                return_type,
                params: parse_params(&cap["params"]),
                doc: parse_doc(&cap["doc"]),
                release_lock: true,
            });
        }

        functions
    }
}

/// Sorted list of `.zig` files below `dir`. Walk errors are logged.
fn source_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
                {
                    files.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!("Failed to scan {}: {}", dir.display(), e),
        }
    }
    files
}

fn warn_duplicates(functions: &[ExportedFunction]) {
    let mut seen = std::collections::HashSet::new();
    for func in functions {
        if !seen.insert(func.name.as_str()) {
            tracing::warn!(
                "Exported function `{}` is declared more than once; the last one wins",
                func.name
            );
        }
    }
}

/// Join `///` lines, stripping the marker and surrounding whitespace.
fn parse_doc(block: &str) -> String {
    block
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("///"))
        .map(|line| line.trim_start_matches('/').trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a parameter list into runtime `(name, type)` pairs.
///
/// Skips empty entries, `...`, `comptime` parameters and anything without a
/// colon.
fn parse_params(params: &str) -> Vec<ExportParam> {
    split_top_level(params)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "..." && !p.starts_with("comptime"))
        .filter_map(|p| {
            let (name, ty) = p.split_once(':')?;
            Some(ExportParam::new(name.trim(), ty.trim()))
        })
        .collect()
}

/// Split on commas that are not nested inside `()`, `[]` or `{}`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan(src: &str) -> Vec<ExportedFunction> {
        ExportScanner::new().parse_content(src)
    }

    #[test]
    fn test_parse_simple_export() {
        let funcs = scan("export fn add(a: i32, b: i32) i32 {\n    return a + b;\n}\n");

        assert_eq!(funcs.len(), 1);
        let f = &funcs[0];
        assert_eq!(f.name, "add");
        assert_eq!(f.return_type, "i32");
        assert_eq!(
            f.params,
            vec![ExportParam::new("a", "i32"), ExportParam::new("b", "i32")]
        );
        assert_eq!(f.doc, "");
        assert!(f.release_lock);
    }

    #[test]
    fn test_doc_comments_and_pub() {
        let src = r#"
const std = @import("std");

/// Multiply two floats.
///   Second line.
pub export fn mul(x: f64, y: f64) f64 {
    return x * y;
}
"#;
        let funcs = scan(src);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "mul");
        assert_eq!(funcs[0].doc, "Multiply two floats.\nSecond line.");
    }

    #[test]
    fn test_mixed_text_keeps_source_order() {
        let src = r#"
fn helper(x: i32) i32 { return x; }

export fn first() void {}

// export fn commented_out() void {}
const x: i32 = 5;

/// Doc for second.
export fn second(n: usize) usize {
    return n;
}

pub fn not_exported() void {}

    export fn third(s: [*c]const u8) bool { return s != null; }
"#;
        let funcs = scan(src);
        let names: Vec<_> = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(funcs[0].doc, "");
        assert_eq!(funcs[1].doc, "Doc for second.");
        assert_eq!(funcs[2].params[0].ty, "[*c]const u8");
    }

    #[test]
    fn test_comptime_and_variadic_are_skipped() {
        let funcs = scan("export fn f(comptime T: type, a: u8, ...) callconv(.C) void {}\n");
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].params, vec![ExportParam::new("a", "u8")]);
        assert_eq!(funcs[0].return_type, "void");
    }

    #[test]
    fn test_function_pointer_param() {
        let src = "export fn run(cb: *const fn (i32, i32) callconv(.C) i32, n: i32) i32 {}\n";
        let funcs = scan(src);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].params.len(), 2);
        assert_eq!(funcs[0].params[0].name, "cb");
        assert_eq!(funcs[0].params[1], ExportParam::new("n", "i32"));
    }

    #[test]
    fn test_no_params() {
        let funcs = scan("export fn version() u32 { return 1; }");
        assert_eq!(funcs.len(), 1);
        assert!(funcs[0].params.is_empty());
    }

    #[test]
    fn test_many_declarations() {
        let mut src = String::new();
        for i in 0..25 {
            src.push_str(&format!("/// fn {i}\nexport fn f{i}(x{i}: i64) i64 {{ return x{i}; }}\n"));
            src.push_str("const filler = struct { a: i32, b: i32 };\n\n");
        }
        let funcs = scan(&src);
        assert_eq!(funcs.len(), 25);
        for (i, f) in funcs.iter().enumerate() {
            assert_eq!(f.name, format!("f{i}"));
            assert_eq!(f.doc, format!("fn {i}"));
            assert_eq!(f.params[0].name, format!("x{i}"));
        }
    }

    #[test]
    fn test_scan_dir_skips_undecodable_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.zig"), "export fn a() void {}\n").unwrap();
        std::fs::write(src.join("b.zig"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        std::fs::write(src.join("sub/c.zig"), "export fn c(x: i8) i8 { return x; }\n").unwrap();
        std::fs::write(src.join("notes.txt"), "export fn ignored() void {}\n").unwrap();

        let funcs = ExportScanner::new().scan_dir(&src);
        let names: Vec<_> = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(ExportScanner::new().scan_dir(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("a: i32, b: [2]u8"), vec!["a: i32", " b: [2]u8"]);
        assert_eq!(split_top_level("f: fn (a, b) void, x: u8").len(), 2);
        assert_eq!(split_top_level(""), vec![""]);
    }
}
