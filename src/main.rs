use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use elan::{ast, compiler::Compiler, Target};

#[derive(Parser, Debug)]
#[command(author, version, about="A compiler for the Elan language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Parsed program, as the JSON tree the parser front-end emits
    input: PathBuf,
    #[arg(long, short)]
    output: PathBuf,
    #[arg(long, short, value_enum, default_value = "js")]
    target: Target,
}

fn main() -> Result<()> {
    let cli = Cli::try_parse()?;
    match cli.command {
        Commands::Compile(CompileArgs {
            input,
            output,
            target,
        }) => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("could not read {}", input.display()))?;
            let tree: serde_json::Value =
                serde_json::from_str(&raw).context("input is not a JSON syntax tree")?;
            let root = match ast::decode(&tree) {
                Ok(root) => root,
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    std::process::exit(1);
                }
            };
            let code = match Compiler::compile(target, &root) {
                Ok(code) => code,
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    std::process::exit(1);
                }
            };
            std::fs::write(&output, code)
                .with_context(|| format!("could not write {}", output.display()))?;
        }
    }
    Ok(())
}
