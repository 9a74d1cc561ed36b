//! Textual preprocessor: `#include` splicing and object-like `#define`
//! substitution, operating on raw source text before lexing begins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CompilerConfig;

pub struct Preprocessor<'cfg> {
    defines: HashMap<String, String>,
    search_path: Vec<PathBuf>,
    config: &'cfg CompilerConfig,
    include_depth: u32,
}

impl<'cfg> Preprocessor<'cfg> {
    pub fn new(base_dir: &Path, config: &'cfg CompilerConfig) -> Self {
        let mut search_path = vec![base_dir.to_path_buf()];
        search_path.extend(config.include_dirs.iter().cloned());
        if let Ok(env_path) = std::env::var("CC_INCLUDE_PATH") {
            search_path.extend(env_path.split(':').filter(|s| !s.is_empty()).map(PathBuf::from));
        }
        Preprocessor { defines: HashMap::new(), search_path, config, include_depth: 0 }
    }

    /// Preprocess `source`, returning the fully spliced and substituted text.
    pub fn run(&mut self, source: &str) -> String {
        self.process(source)
    }

    fn process(&mut self, source: &str) -> String {
        if self.include_depth >= self.config.max_include_depth {
            eprintln!("warning: include depth too deep, truncating");
            return String::new();
        }
        self.include_depth += 1;
        let mut out = String::with_capacity(source.len() * 2);

        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if c == b'#' {
                let line_end = find_line_end(bytes, i + 1);
                self.handle_directive(&source[i + 1..line_end], &mut out);
                i = if line_end < bytes.len() { line_end + 1 } else { line_end };
                continue;
            }

            if is_ident_start(c) {
                let start = i;
                while i < bytes.len() && is_ident_char(bytes[i]) {
                    i += 1;
                }
                let ident = &source[start..i];
                match self.defines.get(ident) {
                    Some(value) if !value.is_empty() => out.push_str(value),
                    _ => out.push_str(ident),
                }
                continue;
            }

            out.push(c as char);
            i += 1;
        }

        self.include_depth -= 1;
        out
    }

    fn handle_directive(&mut self, rest: &str, out: &mut String) {
        let rest = rest.trim_start();
        let (directive, remainder) = split_word(rest);
        let remainder = remainder.trim_start();

        match directive {
            "include" => self.handle_include(remainder, out),
            "define" => self.handle_define(remainder),
            _ => {} // pragma, ifdef, ifndef, endif, and unknown directives are dropped
        }
    }

    fn handle_include(&mut self, rest: &str, out: &mut String) {
        let mut chars = rest.chars();
        let (open, close) = match chars.next() {
            Some('"') => ('"', '"'),
            Some('<') => ('<', '>'),
            _ => return,
        };
        let body = &rest[open.len_utf8()..];
        let Some(end) = body.find(close) else { return };
        let filename = &body[..end];

        let Some(path) = self.resolve_include(filename) else { return };
        let Ok(content) = fs::read_to_string(&path) else { return };
        let processed = self.process(&content);
        out.push_str(&processed);
        out.push('\n');
    }

    fn resolve_include(&self, filename: &str) -> Option<PathBuf> {
        if filename.contains('/') || filename.contains('\\') {
            let p = PathBuf::from(filename);
            return p.is_file().then_some(p);
        }
        for dir in &self.search_path {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    fn handle_define(&mut self, rest: &str) {
        let (name, value) = split_word(rest);
        if name.is_empty() {
            return;
        }
        if self.defines.len() >= self.config.max_defines as usize && !self.defines.contains_key(name) {
            eprintln!("warning: too many #defines, ignoring '{name}'");
            return;
        }
        self.defines.insert(name.to_string(), value.trim().to_string());
    }
}

fn find_line_end(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

fn split_word(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '.' || *c == '/' || *c == '\\'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    (&s[..end], &s[end..])
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cfg() -> CompilerConfig {
        CompilerConfig::default()
    }

    #[test]
    fn expands_object_like_define() {
        let dir = tempfile::tempdir().unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#define WIDTH 80\nint w = WIDTH;\n");
        assert!(out.contains("int w = 80;"));
    }

    #[test]
    fn redefinition_replaces_prior_value() {
        let dir = tempfile::tempdir().unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#define N 1\n#define N 2\nint x = N;\n");
        assert!(out.contains("int x = 2;"));
    }

    #[test]
    fn does_not_rescan_macro_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#define A B\n#define B 5\nint x = A;\n");
        assert!(out.contains("int x = B;"));
    }

    #[test]
    fn splices_quoted_include_from_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join("defs.h")).unwrap();
        writeln!(f, "int included_global;").unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#include \"defs.h\"\nint main(){return 0;}\n");
        assert!(out.contains("int included_global;"));
        assert!(out.contains("int main(){return 0;}"));
    }

    #[test]
    fn failed_include_is_silently_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#include \"missing.h\"\nint x;\n");
        assert!(out.contains("int x;"));
    }

    #[test]
    fn unknown_directives_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let c = cfg();
        let mut pp = Preprocessor::new(dir.path(), &c);
        let out = pp.run("#ifndef FOO\n#pragma once\nint x;\n#endif\n");
        assert!(!out.contains('#'));
        assert!(out.contains("int x;"));
    }

    #[test]
    fn include_depth_cap_yields_empty_splice() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rec.h"), "#include \"rec.h\"\n").unwrap();
        let mut c = cfg();
        c.max_include_depth = 3;
        let mut pp = Preprocessor::new(dir.path(), &c);
        // Should terminate rather than recurse forever, and not panic.
        let _ = pp.run("#include \"rec.h\"\nint x;\n");
    }
}
