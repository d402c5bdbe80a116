use crate::interpreter::{Interpreter, RuntimeError};
use crate::lexer::{LexerError, tokenize};
use crate::parser::{ParseError, parse};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Wires the stages together: tokenize, parse, walk. The environment
/// survives across calls, so several sources can run in sequence
/// against the same bindings.
pub struct Engine<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
}

impl Engine<io::Stdout> {
    pub fn new() -> Self {
        Engine {
            interpreter: Interpreter::new(),
        }
    }
}

impl Default for Engine<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Engine<W> {
    pub fn with_output(out: W) -> Self {
        Engine {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Execute a program from source text.
    pub fn execute_source(&mut self, source: &str) -> Result<(), EngineError> {
        // Tokenize
        let tokens = tokenize(source)?;

        // Parse
        let program = parse(&tokens)?;

        // Walk the tree
        self.interpreter.execute_program(&program)?;
        Ok(())
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        let mut engine = Engine::with_output(Vec::new());
        engine.execute_source(source).unwrap();
        String::from_utf8(engine.into_output()).unwrap()
    }

    #[test]
    fn test_print_formatting_end_to_end() {
        let source = "\
print(3)
print(3.0)
print(3.5)
print(True)
print(None)
print('text')
";
        assert_eq!(run(source), "3\n3.0\n3.5\nTrue\nNone\ntext\n");
    }

    #[test]
    fn test_loop_with_branches() {
        let source = "\
i = 0
total = 0
while i < 5:
    i += 1
    if i % 2 == 0:
        total += i
print(total)
";
        assert_eq!(run(source), "6\n");
    }

    #[test]
    fn test_elif_chain_selects_first_truthy_branch() {
        let source = "\
x = 7
if x < 5:
    print('low')
elif x < 10:
    print('mid')
else:
    print('high')
";
        assert_eq!(run(source), "mid\n");
    }

    #[test]
    fn test_chained_comparison_prints_bool() {
        assert_eq!(run("print(1 < 2 < 3)\nprint(1 < 3 < 2)\n"), "True\nFalse\n");
    }

    #[test]
    fn test_string_repetition() {
        assert_eq!(run("print('ab' * 3)\n"), "ababab\n");
    }

    #[test]
    fn test_division_prints_float() {
        assert_eq!(run("print(7 / 2)\nprint(7 // 2)\n"), "3.5\n3\n");
    }

    #[test]
    fn test_environment_survives_across_sources() {
        let mut engine = Engine::with_output(Vec::new());
        engine.execute_source("x = 41\n").unwrap();
        engine.execute_source("print(x + 1)\n").unwrap();
        assert_eq!(
            String::from_utf8(engine.into_output()).unwrap(),
            "42\n"
        );
    }

    #[test]
    fn test_lexer_errors_surface() {
        let mut engine = Engine::with_output(Vec::new());
        assert!(matches!(
            engine.execute_source("x = 'oops\n"),
            Err(EngineError::Lexer(_))
        ));
    }

    #[test]
    fn test_parse_errors_surface() {
        let mut engine = Engine::with_output(Vec::new());
        assert!(matches!(
            engine.execute_source("if x\n    y = 1\n"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_runtime_errors_surface() {
        let mut engine = Engine::with_output(Vec::new());
        assert!(matches!(
            engine.execute_source("print(1 / 0)\n"),
            Err(EngineError::Runtime(RuntimeError::DivisionByZero))
        ));
    }
}
