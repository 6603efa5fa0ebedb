use anyhow::Result;
use rustyline::DefaultEditor;
use thiserror::Error;

use crate::ast::Var;
use crate::parser::parse_program;
use crate::{builtins, eval, EvalError, Scope};

#[derive(Error, Debug)]
pub enum ReplError {
    #[error("Parse error: {0}")]
    Parse(#[from] anyhow::Error),

    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
}

/// An interpreter session: one scope, one capability registry, kept across
/// every piece of text it evaluates.
pub struct Repl {
    scope: Scope,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Repl {
            scope: builtins().child(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Evaluate every form in `text`, in order, and return the last value
    /// (nil for empty text).
    ///
    /// The first failing form stops evaluation; whatever the forms before it
    /// defined or registered is kept.
    pub fn eval_text(&mut self, text: &str) -> Result<Var, ReplError> {
        let forms = parse_program(text)?;
        let mut result = Var::nil();
        for form in forms.iter() {
            tracing::trace!(%form, "eval");
            result = eval(form, &mut self.scope).inspect_err(|err| {
                tracing::debug!(%form, %err, "evaluation failed");
            })?;
        }
        Ok(result)
    }
}

/// A line editor configured the way the interactive prompt wants it
pub fn rl_editor(tab_stop: u8) -> Result<DefaultEditor> {
    let cfg = rustyline::Config::builder()
        .tab_stop(tab_stop.into())
        .auto_add_history(true)
        .bracketed_paste(true)
        .build();

    DefaultEditor::with_config(cfg).map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn test_empty_text_is_nil() {
        let mut repl = Repl::new();
        assert_eq!(repl.eval_text("").unwrap(), Var::nil());
        assert_eq!(repl.eval_text("; just a comment").unwrap(), Var::nil());
    }

    #[test]
    fn test_returns_last_value() {
        let mut repl = Repl::new();
        let result = repl.eval_text("(defvar x 1) (+ x 1)").unwrap();
        assert_eq!(result, Var::from(Value::Int(2)));
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut repl = Repl::new();
        assert!(matches!(
            repl.eval_text("(+ 1"),
            Err(ReplError::Parse(_))
        ));
    }
}
