//! Errores recuperables de generación de código.

use std::fmt::{self, Display};
use thiserror::Error;

/// Error local a una sentencia.
///
/// La sentencia afectada no produce código, pero la generación continúa
/// con el resto del árbol.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("Variable missing in {0} statement")]
    UndefinedVariable(&'static str),

    #[error("Expected {expected} operand in {statement} statement")]
    UnexpectedOperand {
        statement: &'static str,
        expected: &'static str,
    },
}

pub struct Diagnostics {
    kind: &'static str,
    errors: Vec<CodegenError>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    pub fn push(&mut self, error: CodegenError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CodegenError] {
        &self.errors
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            errors: Default::default(),
        }
    }
}

impl From<CodegenError> for Diagnostics {
    fn from(error: CodegenError) -> Self {
        Diagnostics {
            errors: vec![error],
            ..Default::default()
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics { kind, errors } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error)?;
        }

        let statement_or_statements = if errors.len() == 1 {
            "statement"
        } else {
            "statements"
        };

        writeln!(
            fmt,
            "Skipped {} {}, output is incomplete",
            errors.len(),
            statement_or_statements
        )
    }
}
