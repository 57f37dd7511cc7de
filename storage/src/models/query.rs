//! Parameterized statements.
//!
//! Statements reference parameters as `$name`. Drivers that bind by position call
//! [`Query::to_positional`], which rewrites each distinct name to `$1`, `$2`, ... in order
//! of first appearance.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

use super::value::Value;

/// Statement text plus named parameter values. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    statement: String,
    params: BTreeMap<String, Value>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("no value supplied for parameter ${0}")]
    MissingParameter(String),
}

impl Query {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: BTreeMap::new(),
        }
    }

    /// Sets parameter `name` (without the `$`).
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// Rewrites `$name` placeholders to `$N` and returns the values in bind order.
    ///
    /// Text inside single or double quotes and `--` comments is copied untouched, as is a `$`
    /// not followed by an identifier (`$1`, `$$`). Parameters that are supplied but never
    /// referenced are ignored.
    pub fn to_positional(&self) -> Result<(String, Vec<Value>), BindError> {
        let src = self.statement.as_str();
        let mut sql = String::with_capacity(src.len());
        let mut order: Vec<&str> = Vec::new();
        let mut chars = src.char_indices().peekable();
        let mut quote: Option<char> = None;

        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                sql.push(c);
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    sql.push(c);
                }
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    sql.push(c);
                    for (_, c) in chars.by_ref() {
                        sql.push(c);
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '$' => {
                    let start = i + 1;
                    let mut end = start;
                    if let Some(&(_, first)) = chars.peek() {
                        if first.is_ascii_alphabetic() || first == '_' {
                            while let Some(&(j, next)) = chars.peek() {
                                if next.is_ascii_alphanumeric() || next == '_' {
                                    end = j + next.len_utf8();
                                    chars.next();
                                } else {
                                    break;
                                }
                            }
                        }
                    }
                    if end == start {
                        sql.push('$');
                        continue;
                    }
                    let name = &src[start..end];
                    let position = match order.iter().position(|n| *n == name) {
                        Some(p) => p,
                        None => {
                            order.push(name);
                            order.len() - 1
                        }
                    };
                    let _ = write!(sql, "${}", position + 1);
                }
                _ => sql.push(c),
            }
        }

        let values = order
            .into_iter()
            .map(|name| {
                self.params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| BindError::MissingParameter(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((sql, values))
    }
}
