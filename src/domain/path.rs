//! Dotted child-index addressing for condition tree nodes.
//!
//! `/` (or an empty string) is the root group, `0` its first child,
//! `1.0` the first child of the root's second child.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            write!(f, "{}", self.0.iter().join("."))
        }
    }
}

impl FromStr for NodePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::root());
        }
        trimmed
            .trim_start_matches('/')
            .split('.')
            .map(|segment| {
                segment.parse::<usize>().map_err(|_| DomainError::InvalidPath {
                    path: s.to_string(),
                    reason: format!("'{}' is not a child index", segment),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
