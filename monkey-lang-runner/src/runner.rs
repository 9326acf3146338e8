use std::path::Path;

use monkey_lang_core::lexer;
use monkey_lang_core::parser;
use monkey_lang_interpreter::environment;
use monkey_lang_interpreter::evaluator;
use monkey_lang_interpreter::object::Object;
use thiserror::Error;

use crate::Emit;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not read source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing failed:\n{}", render_errors(.0))]
    Parse(Vec<parser::ParseError>),
    #[error("{0}")]
    Evaluation(String),
}

fn render_errors(errors: &[parser::ParseError]) -> String {
    errors
        .iter()
        .map(|error| format!("  {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_file(path: &Path, emit: Emit) -> Result<String, RunError> {
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "read source");
    execute(&source, emit)
}

/// Runs `source` up to the requested stage and returns what should be printed.
pub fn execute(source: &str, emit: Emit) -> Result<String, RunError> {
    let tokenizer = lexer::Tokenizer::new(source);
    if let Emit::Tokens = emit {
        return Ok(tokenizer
            .map(|token| format!("{}..{} {:?}\n", token.start, token.end, token.kind))
            .collect());
    }

    let program = parser::Parser::new(tokenizer)
        .parse_program()
        .map_err(RunError::Parse)?;
    tracing::info!(statements = program.statements.len(), "parsed program");
    if let Emit::Ast = emit {
        return Ok(program.to_string());
    }

    let mut env = environment::Environment::new();
    let evaluated = evaluator::eval_program(&program, &mut env);
    match &*evaluated {
        Object::Error(_) => Err(RunError::Evaluation(evaluated.inspect())),
        _ => Ok(format!("{}\n", evaluated.inspect())),
    }
}
