#![deny(missing_docs)]

//! # oapigen CLI
//!
//! Command line interface of the OpenAPI 3 to Rust generator.
//!
//! Supported Commands:
//! - `generate`: OpenAPI document -> Rust module (types, params, server glue).

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod config;
mod error;
mod generate;
mod logging;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI 3 to Rust generator")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a Rust module from an OpenAPI document.
    Generate(generate::GenerateArgs),
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate(args) => generate::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::parse_from([
            "oapigen",
            "-vv",
            "generate",
            "api.yaml",
            "-o",
            "src/api.rs",
            "--generate-server",
            "--include-tags",
            "pets,store",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Generate(args) = cli.command;
        assert_eq!(args.input.to_str(), Some("api.yaml"));
        assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("src/api.rs"));
        assert!(args.generate_server);
        assert_eq!(args.include_tags, vec!["pets,store".to_string()]);
    }
}
