//! Caller-supplied student identifiers.
//!
//! An identifier is either a numeric student ID or a card/RFID tag. The
//! portal accepts both through the same `card_tag` field, so the kind is
//! informational only.

use std::fmt;

/// What an identifier looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// No ASCII letters, e.g. `2019123456`.
    StudentId,
    /// Contains at least one ASCII letter, e.g. `04A1B2C3`.
    CardTag,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::StudentId => "student_id",
            IdentifierKind::CardTag => "card_tag",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-empty identifier, forwarded to the portal untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Accepts any non-empty string. The value is not trimmed or normalized.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some(value) if !value.is_empty() => Some(Self(value.to_string())),
            _ => None,
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        if self.0.chars().any(|c| c.is_ascii_alphabetic()) {
            IdentifierKind::CardTag
        } else {
            IdentifierKind::StudentId
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
