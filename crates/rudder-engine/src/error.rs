//! Name template error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("name template {template:?} produced an empty name")]
    EmptyName { template: String },
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    InvalidOperation,
    Other,
}

impl TemplateErrorKind {
    /// Whether the template text itself is at fault, as opposed to a
    /// failure inside the renderer
    pub fn is_user_error(self) -> bool {
        !matches!(self, Self::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined variable",
            Self::UnknownFilter => "unknown filter",
            Self::UnknownFunction => "unknown function",
            Self::SyntaxError => "syntax error",
            Self::InvalidOperation => "invalid operation",
            Self::Other => "render failure",
        }
    }
}

/// Template failure with the offending source attached
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(rudder::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = match err.kind() {
            minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
            minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
            minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
            minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
            minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
            _ => TemplateErrorKind::Other,
        };

        let message = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };
        let span = err
            .range()
            .map(|range| SourceSpan::from((range.start, range.end.saturating_sub(range.start))));

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
