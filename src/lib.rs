//! A bootstrap compiler for a C subset targeting bare-metal 32-bit x86: it
//! preprocesses, lexes, and parses source into a typed AST, then emits
//! complete NASM assembly through a fixed runtime library and a freestanding
//! `_start` entry point.
//!
//! ```rust,ignore
//! use kc32::{compile_source, CompilerConfig};
//!
//! let nasm = compile_source("int main(){return 0;}", &CompilerConfig::new())?;
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod token;
pub mod types;

pub use ast::Program;
pub use codegen::CodeGenError;
pub use config::CompilerConfig;

use std::fmt;
use std::fs;
use std::path::Path;

use lexer::Lexer;
use parser::Parser;
use preprocessor::Preprocessor;

/// A fatal error from any compilation stage, along with the diagnostic line
/// a batch invocation would print before exiting.
#[derive(Debug)]
pub enum CompileError {
    Parse(String),
    CodeGen(CodeGenError),
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(msg) => write!(f, "parse error: {msg}"),
            CompileError::CodeGen(e) => write!(f, "codegen error: {e}"),
            CompileError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<CodeGenError> for CompileError {
    fn from(e: CodeGenError) -> Self {
        CompileError::CodeGen(e)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

/// Runs the preprocessor and parser over `source`, returning the AST.
/// `base_dir` is the directory `#include` is resolved relative to.
pub fn parse_source(source: &str, base_dir: &Path, config: &CompilerConfig) -> Result<Program, CompileError> {
    let mut preprocessor = Preprocessor::new(base_dir, config);
    let preprocessed = preprocessor.run(source);
    let tokens = Lexer::new(&preprocessed).tokenize_all();
    Parser::new(tokens).parse_program().map_err(CompileError::Parse)
}

/// Compiles `source` to a complete NASM source string.
pub fn compile_source(source: &str, base_dir: &Path, config: &CompilerConfig) -> Result<String, CompileError> {
    let program = parse_source(source, base_dir, config)?;
    Ok(codegen::compile_program(&program, config.warnings_as_errors)?)
}

/// Compiles `source` to NASM and returns the AST alongside it, for callers
/// that want to inspect the parsed tree (e.g. `--dump-ast`).
pub fn compile_source_with_ast(
    source: &str,
    base_dir: &Path,
    config: &CompilerConfig,
) -> Result<(String, Program), CompileError> {
    let program = parse_source(source, base_dir, config)?;
    let nasm = codegen::compile_program(&program, config.warnings_as_errors)?;
    Ok((nasm, program))
}

/// Reads `input_path`, compiles it, and writes the resulting NASM to
/// `output_path`.
pub fn compile_file(input_path: &Path, output_path: &Path, config: &CompilerConfig) -> Result<(), CompileError> {
    let source = fs::read_to_string(input_path)?;
    let base_dir = input_path.parent().unwrap_or_else(|| Path::new("."));
    let nasm = compile_source(&source, base_dir, config)?;
    fs::write(output_path, nasm)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_program_to_nasm() {
        let nasm = compile_source("int main(){return 0;}", Path::new("."), &CompilerConfig::new()).unwrap();
        assert!(nasm.contains("main:"));
        assert!(nasm.contains("_start:"));
    }

    #[test]
    fn reports_a_parse_error_rather_than_panicking() {
        let result = compile_source("int main(", Path::new("."), &CompilerConfig::new());
        assert!(result.is_err());
    }
}
