//! Command-line entry point for the `kc32` compiler.

use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use kc32::CompilerConfig;

#[derive(ClapParser)]
#[command(name = "kc32")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bootstrap C-subset compiler targeting 32-bit x86 NASM for bare-metal kernels")]
struct Cli {
    /// Input C source file
    input: PathBuf,

    /// Output NASM assembly path
    #[arg(short, long)]
    output: PathBuf,

    /// Print the parsed AST to stderr before codegen
    #[arg(long)]
    dump_ast: bool,

    /// Extra `#include` search directory, searched before CC_INCLUDE_PATH
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let mut config = CompilerConfig::new();
    for dir in cli.include {
        config = config.with_include_dir(dir);
    }

    if let Err(e) = run(&cli.input, &cli.output, cli.dump_ast, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(input: &PathBuf, output: &PathBuf, dump_ast: bool, config: &CompilerConfig) -> Result<(), kc32::CompileError> {
    let source = std::fs::read_to_string(input)?;
    let base_dir = input.parent().unwrap_or_else(|| std::path::Path::new("."));

    if dump_ast {
        let (nasm, program) = kc32::compile_source_with_ast(&source, base_dir, config)?;
        eprintln!("{program:#?}");
        std::fs::write(output, nasm)?;
    } else {
        let nasm = kc32::compile_source(&source, base_dir, config)?;
        std::fs::write(output, nasm)?;
    }

    println!("Compiled {} -> {}", input.display(), output.display());
    Ok(())
}
