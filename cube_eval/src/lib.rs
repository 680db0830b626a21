pub mod builtins;
pub mod environment;
pub mod eval;
pub mod object;

use cube_syntax::{error::Error, lex::Lexer, parse::Parser};
use eval::Evaluator;
use log::trace;
use object::Object;

/// Runs a source string through the lex → parse → eval pipeline against
/// the given evaluator. Parse errors refuse evaluation.
pub fn run(source: &str, evaluator: &mut Evaluator) -> Result<Object, Vec<Error>> {
    trace!("Lexing {source}");
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        return Err(parser.errors().to_vec());
    }
    trace!("Evaluating {program:#?}");
    Ok(evaluator.eval_program(&program))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_evaluates_a_program() {
        let mut evaluator = Evaluator::new();
        assert_eq!(
            run("let x = 2; x * 21", &mut evaluator),
            Ok(Object::Integer(42))
        );
    }

    #[test]
    fn run_surfaces_parse_errors() {
        let mut evaluator = Evaluator::new();
        let errors = run("let = 1;", &mut evaluator).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn run_returns_runtime_errors_as_values() {
        let mut evaluator = Evaluator::new();
        assert_eq!(
            run("5 + true", &mut evaluator),
            Ok(Object::Error("type mismatch: INTEGER + BOOLEAN".to_string()))
        );
    }
}
