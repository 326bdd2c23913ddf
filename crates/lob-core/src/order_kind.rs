//! Order kind.
//!
//! A closed set of variants handled by the single matching routine in
//! [`MatchingEngine`](crate::MatchingEngine). New kinds are added here as
//! variants, and every `match` on `OrderKind` then has to say how the new kind
//! crosses and whether it may rest.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderKind {
    /// Executes at its limit price or better; any remainder rests.
    #[default]
    Limit,
}

impl OrderKind {
    /// Short code used in logs and fixtures (`"LO"` for limit orders).
    pub fn code(self) -> &'static str {
        match self {
            OrderKind::Limit => "LO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LO" => Some(OrderKind::Limit),
            _ => None,
        }
    }

    /// Whether an unfilled remainder of this kind is placed in the book.
    pub fn rests(self) -> bool {
        match self {
            OrderKind::Limit => true,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
