use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "minipy")]
#[command(about = "A tree-walking interpreter for a small Python-like scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a script
    #[command(alias = "r")]
    Run {
        /// Script file to execute
        input: PathBuf,
    },

    /// Parse a script and dump its syntax tree
    #[command(alias = "a")]
    Ast {
        /// Script file to parse
        input: PathBuf,
    },

    /// Tokenize a script and dump the token stream
    #[command(alias = "t")]
    Tokens {
        /// Script file to tokenize
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input } => {
            minipy::cli::run(input)?;
        }
        Commands::Ast { input } => {
            minipy::cli::dump_ast(input)?;
        }
        Commands::Tokens { input } => {
            minipy::cli::dump_tokens(input)?;
        }
    }

    Ok(())
}
