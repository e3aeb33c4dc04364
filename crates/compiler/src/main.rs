//! Squawk Compiler CLI
//!
//! Command-line interface for compiling .sq programs to pseudo-assembly
//! and inspecting the intermediate stages.

use clap::{CommandFactory, Parser as ClapParser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use serde::Serialize;
use squawkc::{CompileError, CompilerConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};

#[derive(ClapParser)]
#[command(name = "squawkc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Squawk compiler - lower functional programs to pseudo-assembly", long_about = None)]
struct Cli {
    /// Log each pipeline stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Pipeline stage to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    Tokens,
    Ast,
    Fir,
    Ir,
    Asm,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .sq file
    Build {
        /// Input .sq source file
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stage to emit
        #[arg(long, value_enum, default_value = "asm")]
        emit: Stage,

        /// Emit intermediate stages as JSON instead of debug output
        #[arg(long)]
        json: bool,

        /// Compiler configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verify imperative IR invariants after lowering
        #[arg(long)]
        verify: bool,

        /// Omit the comment banner from assembly output
        #[arg(long)]
        no_header: bool,
    },

    /// Lex and parse a .sq file without lowering it
    Check {
        /// Input .sq source file
        input: PathBuf,

        /// Compiler configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            emit,
            json,
            config,
            verify,
            no_header,
        } => {
            let mut config = load_config(config.as_deref());
            if verify {
                config.verify_ir = true;
            }
            if no_header {
                config.emit_header = false;
            }
            run_build(&input, output.as_deref(), emit, json, &config);
        }
        Commands::Check { input, config } => {
            let config = load_config(config.as_deref());
            run_check(&input, &config);
        }
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn init_logging(verbose: bool) {
    let directive = if verbose { "squawkc=debug" } else { "squawkc=warn" };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::WARN.into()),
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "squawkc", &mut io::stdout());
}

fn load_config(path: Option<&Path>) -> CompilerConfig {
    match path {
        Some(path) => CompilerConfig::load(path).unwrap_or_else(|e| fail(&e)),
        None => CompilerConfig::default(),
    }
}

fn read_source(input: &Path) -> String {
    fs::read_to_string(input).unwrap_or_else(|e| {
        fail(&CompileError::Io {
            path: input.to_path_buf(),
            message: e.to_string(),
        })
    })
}

fn run_build(
    input: &Path,
    output: Option<&Path>,
    emit: Stage,
    json: bool,
    config: &CompilerConfig,
) {
    info!(input = %input.display(), ?emit, "compiling");
    let source = read_source(input);

    let text = match emit_stage(&source, emit, json, config) {
        Ok(text) => text,
        Err(e) => fail(&e),
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, &text) {
                fail(&CompileError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
            println!("Compiled {} -> {}", input.display(), path.display());
        }
        None => print!("{}", text),
    }
}

fn emit_stage(
    source: &str,
    emit: Stage,
    json: bool,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    if emit == Stage::Tokens {
        let tokens = squawkc::tokenize(source)?;
        if json {
            return to_json(&tokens);
        }
        return Ok(tokens
            .iter()
            .map(|t| format!("{}:{}\t{}\n", t.line, t.column, t.kind))
            .collect());
    }

    let program = squawkc::parse_source(source, config)?;
    match emit {
        Stage::Ast => dump(&program, json),
        Stage::Fir => dump(&squawkc::fir::from_ast(&program), json),
        Stage::Ir => dump(&squawkc::lower_program(&program, config)?, json),
        _ => {
            let ir = squawkc::lower_program(&program, config)?;
            let text = squawkc::codegen::render_program(&ir, config);
            debug!(lines = text.lines().count(), "generated code");
            Ok(text)
        }
    }
}

fn dump<T: Serialize + std::fmt::Debug>(value: &T, json: bool) -> Result<String, CompileError> {
    if json {
        to_json(value)
    } else {
        Ok(format!("{:#?}\n", value))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CompileError> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| CompileError::Output(format!("Failed to serialize: {}", e)))
}

fn run_check(input: &Path, config: &CompilerConfig) {
    let source = read_source(input);
    match squawkc::parse_source(&source, config) {
        Ok(program) => println!(
            "{}: {} function(s) parsed",
            input.display(),
            program.functions.len()
        ),
        Err(e) => fail(&e),
    }
}

fn fail(error: &CompileError) -> ! {
    eprintln!("Error: {}", error);
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_config() {
        let cli = Cli::try_parse_from(["squawkc", "check", "deep.sq", "--config", "squawk.toml"])
            .unwrap();
        match cli.command {
            Commands::Check { input, config } => {
                assert_eq!(input, PathBuf::from("deep.sq"));
                assert_eq!(config, Some(PathBuf::from("squawk.toml")));
            }
            _ => panic!("Expected check command"),
        }
    }

    #[test]
    fn test_check_uses_configured_limits() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("squawk.toml");
        std::fs::write(&config_path, "[compiler]\nmax_nesting_depth = 512\n").unwrap();

        let source = format!("fn f() -> Int = {}1{}", "(".repeat(300), ")".repeat(300));
        let config = load_config(Some(config_path.as_path()));
        assert!(squawkc::parse_source(&source, &CompilerConfig::default()).is_err());
        assert!(squawkc::parse_source(&source, &config).is_ok());
    }
}
