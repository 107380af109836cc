//! Identity of the person submitting stock adjustments.

use serde::{Deserialize, Serialize};

/// The signed-in operator as reported by the host messenger.
///
/// Both fields are optional: the backend accepts anonymous submissions and
/// attributes them itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

impl Operator {
    pub fn new(user_id: Option<i64>, user_name: Option<String>) -> Self {
        Self { user_id, user_name }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("anonymous")
    }
}
