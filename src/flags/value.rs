//! Flag payload values.

use std::collections::BTreeMap;

use crate::price::{Decimal, Price};

/// The value carried by a flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagValue {
    /// No payload; the flag's presence and enabled state are the whole story.
    Unit,
    /// A boolean payload.
    Bool(bool),
    /// An integer payload.
    Int(i64),
    /// A text payload (greeting messages and the like).
    Text(String),
    /// A cost.
    Price(Price),
    /// Money held per currency id.
    Balance(BTreeMap<String, Decimal>),
}

impl FlagValue {
    /// Get as a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a price.
    #[must_use]
    pub fn as_price(&self) -> Option<&Price> {
        match self {
            Self::Price(p) => Some(p),
            _ => None,
        }
    }

    /// Get as a balance map.
    #[must_use]
    pub fn as_balance(&self) -> Option<&BTreeMap<String, Decimal>> {
        match self {
            Self::Balance(b) => Some(b),
            _ => None,
        }
    }

    /// Mutable access to a balance map.
    pub fn as_balance_mut(&mut self) -> Option<&mut BTreeMap<String, Decimal>> {
        match self {
            Self::Balance(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Price> for FlagValue {
    fn from(p: Price) -> Self {
        Self::Price(p)
    }
}
