//! Message selector: `tag`, `.class`, or `tag.class.other`.

use std::fmt;
use std::str::FromStr;

use crate::core::dom::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("invalid character {0:?} in selector {1:?}")]
    InvalidChar(char, String),
    #[error("empty class name in selector {0:?}")]
    EmptyClass(String),
}

/// Identifies message elements inside the watched container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSelector {
    tag: Option<String>,
    classes: Vec<String>,
}

impl MessageSelector {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if let Some(want) = &self.tag
            && want != tag
        {
            return false;
        }
        self.classes.iter().all(|c| doc.has_class(node, c))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl FromStr for MessageSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SelectorError::Empty);
        }
        if let Some(bad) = s.chars().find(|c| !is_ident_char(*c) && *c != '.') {
            return Err(SelectorError::InvalidChar(bad, s.to_string()));
        }
        let mut parts = s.split('.');
        let tag = parts
            .next()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_ascii_lowercase());
        let classes: Vec<String> = parts.map(str::to_string).collect();
        if classes.iter().any(String::is_empty) {
            return Err(SelectorError::EmptyClass(s.to_string()));
        }
        Ok(Self { tag, classes })
    }
}

impl fmt::Display for MessageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}
