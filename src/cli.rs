use crate::engine::Engine;
use crate::lexer::tokenize;
use crate::parser::parse;
use std::path::PathBuf;

/// Load a script and execute it against a fresh engine.
pub fn run(input: PathBuf) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&input)?;

    let mut engine = Engine::new();
    engine.execute_source(&source)?;

    Ok(())
}

/// Parse a script and dump its syntax tree.
pub fn dump_ast(input: PathBuf) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&input)?;

    let tokens = tokenize(&source)?;
    let program = parse(&tokens)?;
    println!("{program:#?}");

    Ok(())
}

/// Tokenize a script and dump the token stream.
pub fn dump_tokens(input: PathBuf) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&input)?;

    let tokens = tokenize(&source)?;
    for token in &tokens {
        println!("{token}");
    }

    Ok(())
}
