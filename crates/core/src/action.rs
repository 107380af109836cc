//! Stock action applied to a cart line.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Operation requested for one catalog id.
///
/// Wire names are lowercase (`take`, `restock`, `fact`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Decrement stock by the entered quantity.
    #[default]
    Take,
    /// Increment stock by the entered quantity.
    Restock,
    /// Set the absolute on-hand count.
    Fact,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Take, Action::Restock, Action::Fact];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Take => "take",
            Action::Restock => "restock",
            Action::Fact => "fact",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "take" => Ok(Action::Take),
            "restock" => Ok(Action::Restock),
            "fact" => Ok(Action::Fact),
            other => Err(DomainError::validation(format!("unknown action: {other}"))),
        }
    }
}
