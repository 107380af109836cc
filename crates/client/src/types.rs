//! Wire and report types shared by the client components.
//!
//! Request/response shapes mirror the backend's JSON contract exactly; the
//! report types are what the presentation layer renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vuzoll_core::{Action, ItemId};

/// Reachability of the backend as of the most recent probe.
///
/// No time-to-live: the value is only as fresh as the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    Connected,
    Disconnected,
}

impl ConnectivityStatus {
    pub fn is_connected(&self) -> bool {
        *self == ConnectivityStatus::Connected
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityStatus::Connected => "connected",
            ConnectivityStatus::Disconnected => "disconnected",
        }
    }
}

/// One hit of `/api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ItemId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// One line of a `/api/submit_order` batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ItemId,
    pub qty: u32,
    pub action: Action,
}

/// Body of `POST /api/submit_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub items: Vec<OrderLine>,
}

/// Response of `POST /api/submit_order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /api/logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerLogsResponse {
    #[serde(default)]
    pub logs: String,
}

/// What happened to one submitted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Success { details: Vec<String> },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SubmissionOutcome::Success { .. })
    }

    /// Report lines for this item: the backend's detail lines on success,
    /// one synthesized line on failure.
    pub fn lines(&self) -> Vec<String> {
        match &self.outcome {
            SubmissionOutcome::Success { details } if details.is_empty() => {
                vec![format!("✅ {}", self.name)]
            }
            SubmissionOutcome::Success { details } => details.clone(),
            SubmissionOutcome::Failure { message } => {
                vec![format!("❌ {}: {}", self.name, message)]
            }
        }
    }
}

/// Aggregate outcome of one pass over the cart, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub run_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub results: Vec<SubmissionResult>,
}

impl SubmissionReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn succeeded_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.results.iter().filter(|r| r.is_success()).map(|r| &r.id)
    }

    /// Every report line, successes and failures interleaved as they happened.
    pub fn lines(&self) -> Vec<String> {
        self.results.iter().flat_map(|r| r.lines()).collect()
    }
}
