//! Raw query text with named substitutions.
//!
//! A model can replace its physical table with free-form query text. The
//! text may reference caller-supplied globals with named bindings:
//!
//! - `:name` binds the global's value as a parameter
//! - `:name:` binds it as a quoted identifier
//! - `::` is left untouched (PostgreSQL casts)
//! - `\:` emits a literal colon
//!
//! Single-quoted literals and double-quoted identifiers are never scanned,
//! so `'HH24:MI'` stays text. A binding outside them must name a global.
//!
//! The text is split once into [`RawPart`]s when metadata is loaded and bound
//! against globals on every select.

use std::collections::HashMap;

use serde_json::Value;

use super::token::{Token, TokenStream};

/// A segment of parsed raw query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPart {
    /// Verbatim SQL text.
    Text(String),
    /// `:name` - bound as a parameter.
    Value(String),
    /// `:name:` - bound as an identifier.
    Identifier(String),
}

/// Raw query text split into verbatim and bound segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    text: String,
    parts: Vec<RawPart>,
}

/// A binding that referenced an unknown global.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("undefined binding: no global named '{0}'")]
pub struct UnboundName(pub String);

impl RawQuery {
    /// Parse raw query text.
    pub fn parse(text: &str) -> Self {
        let mut parts = Vec::new();
        let mut buf = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&':') => {
                    chars.next();
                    buf.push(':');
                }
                ':' if chars.peek() == Some(&':') => {
                    chars.next();
                    buf.push_str("::");
                }
                '\'' | '"' => {
                    // Quoted text runs to the matching quote; a doubled
                    // quote is an escape and does not close it.
                    buf.push(c);
                    while let Some(ch) = chars.next() {
                        buf.push(ch);
                        if ch == c {
                            if chars.peek() == Some(&c) {
                                chars.next();
                                buf.push(c);
                            } else {
                                break;
                            }
                        }
                    }
                }
                ':' if chars.peek().is_some_and(|ch| is_name_char(*ch)) => {
                    let mut name = String::new();
                    while let Some(&ch) = chars.peek() {
                        if is_name_char(ch) {
                            name.push(ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if !buf.is_empty() {
                        parts.push(RawPart::Text(std::mem::take(&mut buf)));
                    }
                    // A trailing single colon marks an identifier binding;
                    // a double colon after the name is a cast and stays text.
                    if chars.peek() == Some(&':') {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if lookahead.peek() != Some(&':') {
                            chars.next();
                            parts.push(RawPart::Identifier(name));
                            continue;
                        }
                    }
                    parts.push(RawPart::Value(name));
                }
                other => buf.push(other),
            }
        }

        if !buf.is_empty() {
            parts.push(RawPart::Text(buf));
        }

        Self {
            text: text.to_string(),
            parts,
        }
    }

    /// Query text as written.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parsed segments.
    pub fn parts(&self) -> &[RawPart] {
        &self.parts
    }

    /// Names referenced by bindings, in order of appearance.
    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            RawPart::Value(n) | RawPart::Identifier(n) => Some(n.as_str()),
            RawPart::Text(_) => None,
        })
    }

    /// Resolve bindings against `globals`.
    pub fn bind(&self, globals: &HashMap<String, String>) -> Result<TokenStream, UnboundName> {
        let mut ts = TokenStream::new();
        for part in &self.parts {
            match part {
                RawPart::Text(text) => {
                    ts.push(Token::Raw(text.clone()));
                }
                RawPart::Value(name) => {
                    let value = globals
                        .get(name)
                        .ok_or_else(|| UnboundName(name.clone()))?;
                    ts.push(Token::Param(Value::String(value.clone())));
                }
                RawPart::Identifier(name) => {
                    let value = globals
                        .get(name)
                        .ok_or_else(|| UnboundName(name.clone()))?;
                    ts.push(match value.split_once('.') {
                        Some((schema, table)) => Token::QualifiedIdent {
                            schema: Some(schema.to_string()),
                            name: table.to_string(),
                        },
                        None => Token::Ident(value.clone()),
                    });
                }
            }
        }
        Ok(ts)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
