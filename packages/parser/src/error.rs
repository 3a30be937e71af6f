use crate::ast::Span;
use serde::Serialize;
use thiserror::Error;

/// Parse diagnostic. Most are recoverable; `DepthLimitExceeded` and
/// `TooManyErrors` abort the parse and leave the result without a tree.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ParseError {
    #[error("Unclosed element <{name}> at {}..{}", .span.start, .span.end)]
    UnclosedElement { name: String, span: Span },

    #[error("Unexpected closing tag </{name}> at {}..{}", .span.start, .span.end)]
    UnexpectedClosingTag { name: String, span: Span },

    #[error("Unterminated tag at {}", .span.start)]
    UnterminatedTag { span: Span },

    #[error("Unterminated expression at {}", .span.start)]
    UnterminatedExpression { span: Span },

    #[error("Invalid attribute at {}..{}: {message}", .span.start, .span.end)]
    InvalidAttribute { span: Span, message: String },

    #[error("Nesting deeper than {limit} levels at {}", .span.start)]
    DepthLimitExceeded { limit: usize, span: Span },

    #[error("Too many errors (more than {limit})")]
    TooManyErrors { limit: usize },
}

impl ParseError {
    pub fn unclosed_element(name: Option<&str>, span: Span) -> Self {
        Self::UnclosedElement {
            name: name.unwrap_or_default().to_string(),
            span,
        }
    }

    pub fn invalid_attribute(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnclosedElement { span, .. }
            | ParseError::UnexpectedClosingTag { span, .. }
            | ParseError::UnterminatedTag { span }
            | ParseError::UnterminatedExpression { span }
            | ParseError::InvalidAttribute { span, .. }
            | ParseError::DepthLimitExceeded { span, .. } => Some(*span),
            ParseError::TooManyErrors { .. } => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ParseError::DepthLimitExceeded { .. } | ParseError::TooManyErrors { .. }
        )
    }
}

/// Pretty-print diagnostics with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, filename: &str, errors: &[ParseError]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for error in errors {
        let span = error.span().unwrap_or(Span {
            start: source.len().saturating_sub(1),
            end: source.len(),
        });

        let kind = if error.is_fatal() {
            ReportKind::Error
        } else {
            ReportKind::Warning
        };

        let report = Report::build(kind, filename, span.start)
            .with_message(error.to_string())
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_color(Color::Red)
                    .with_message(match error {
                        ParseError::UnclosedElement { name, .. } => {
                            format!("<{}> is never closed", name)
                        }
                        ParseError::UnexpectedClosingTag { .. } => {
                            "nothing open matches this tag".to_string()
                        }
                        ParseError::InvalidAttribute { message, .. } => message.clone(),
                        other => other.to_string(),
                    }),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            break;
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}
