//! Delimiter configuration.
//!
//! `left`/`right` mark an expression. Block and comment markers follow the
//! expression markers unless set explicitly: `{{ }}` gives `{% %}` / `{# #}`,
//! `[[ ]]` gives `[% %]` / `[# #]`.

use minijinja::syntax::SyntaxConfig;
use minijinja::ErrorKind;
use serde::Deserialize;

use crate::error::{ViewError, ViewResult};

const DEFAULT_LEFT: &str = "{{";
const DEFAULT_RIGHT: &str = "}}";

/// Marker strings used to parse templates. Empty strings mean "default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Delimiters {
    pub left: String,
    pub right: String,
    pub block: Option<(String, String)>,
    pub comment: Option<(String, String)>,
}

impl Delimiters {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            ..Self::default()
        }
    }

    /// Override the statement markers instead of deriving them.
    #[must_use]
    pub fn with_block(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.block = Some((left.into(), right.into()));
        self
    }

    /// Override the comment markers instead of deriving them.
    #[must_use]
    pub fn with_comment(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.comment = Some((left.into(), right.into()));
        self
    }

    pub fn variable_pair(&self) -> (String, String) {
        (
            or_default(&self.left, DEFAULT_LEFT),
            or_default(&self.right, DEFAULT_RIGHT),
        )
    }

    pub fn block_pair(&self) -> (String, String) {
        self.explicit_or_derived(self.block.as_ref(), '%')
    }

    pub fn comment_pair(&self) -> (String, String) {
        self.explicit_or_derived(self.comment.as_ref(), '#')
    }

    /// Build the parser configuration; fails on ambiguous marker sets.
    pub fn to_syntax(&self) -> ViewResult<SyntaxConfig> {
        let (var_start, var_end) = self.variable_pair();
        let (block_start, block_end) = self.block_pair();
        let (comment_start, comment_end) = self.comment_pair();

        if var_start == block_start || var_start == comment_start || block_start == comment_start {
            return Err(ViewError::Syntax(minijinja::Error::new(
                ErrorKind::InvalidDelimiter,
                "variable, block and comment delimiters must start differently",
            )));
        }

        SyntaxConfig::builder()
            .block_delimiters(block_start, block_end)
            .variable_delimiters(var_start, var_end)
            .comment_delimiters(comment_start, comment_end)
            .build()
            .map_err(ViewError::Syntax)
    }

    fn explicit_or_derived(&self, explicit: Option<&(String, String)>, marker: char) -> (String, String) {
        match explicit {
            Some((start, end)) if !start.is_empty() && !end.is_empty() => {
                (start.clone(), end.clone())
            }
            _ => {
                let (left, right) = self.variable_pair();
                (derive_start(&left, marker), derive_end(&right, marker))
            }
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn derive_start(left: &str, marker: char) -> String {
    let mut chars = left.chars();
    match (chars.next_back(), chars.as_str()) {
        (Some(_), head) if !head.is_empty() => format!("{head}{marker}"),
        _ => format!("{left}{marker}"),
    }
}

fn derive_end(right: &str, marker: char) -> String {
    let mut chars = right.chars();
    match (chars.next(), chars.as_str()) {
        (Some(_), tail) if !tail.is_empty() => format!("{marker}{tail}"),
        _ => format!("{marker}{right}"),
    }
}
