//! Sequential, per-item order submission.
//!
//! Every cart line goes out as its own single-line batch, strictly one at a
//! time, so the operator learns exactly which lines failed and only those
//! stay in the cart for a retry.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use vuzoll_cart::{CartItem, CartStore};
use vuzoll_core::{ItemId, Operator};

use crate::api::OrderSender;
use crate::types::{OrderLine, OrderRequest, SubmissionOutcome, SubmissionReport, SubmissionResult};

/// Submission refused before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("the cart is empty")]
    EmptyCart,
    #[error("enter a quantity greater than zero for: {}", .names.join(", "))]
    ZeroQuantity { ids: Vec<ItemId>, names: Vec<String> },
}

/// Reject the whole batch if any line has nothing to submit.
pub fn validate(items: &[CartItem]) -> Result<(), SubmitError> {
    if items.is_empty() {
        return Err(SubmitError::EmptyCart);
    }

    let zero: Vec<&CartItem> = items.iter().filter(|i| i.input_qty == 0).collect();
    if zero.is_empty() {
        Ok(())
    } else {
        Err(SubmitError::ZeroQuantity {
            ids: zero.iter().map(|i| i.id.clone()).collect(),
            names: zero.iter().map(|i| i.name.clone()).collect(),
        })
    }
}

pub struct SubmissionPipeline {
    sender: Arc<dyn OrderSender>,
    operator: Operator,
}

impl SubmissionPipeline {
    pub fn new(sender: Arc<dyn OrderSender>, operator: Operator) -> Self {
        Self { sender, operator }
    }

    /// Send each line in order, awaiting each response before the next.
    ///
    /// A failing line (refusal, bad response, transport error) is recorded
    /// and the pass continues with the next line.
    pub async fn submit(&self, items: &[CartItem]) -> Result<SubmissionReport, SubmitError> {
        validate(items)?;

        let run_id = Uuid::now_v7();
        tracing::info!(
            %run_id,
            items = items.len(),
            operator = self.operator.display_name(),
            "submitting cart"
        );

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let outcome = self.submit_one(item).await;
            match &outcome {
                SubmissionOutcome::Success { .. } => {
                    tracing::info!(%run_id, item_id = %item.id, "line submitted");
                }
                SubmissionOutcome::Failure { message } => {
                    tracing::warn!(%run_id, item_id = %item.id, error = %message, "line failed");
                }
            }
            results.push(SubmissionResult {
                id: item.id.clone(),
                name: item.name.clone(),
                outcome,
            });
        }

        let report = SubmissionReport {
            run_id,
            completed_at: Utc::now(),
            results,
        };
        tracing::info!(
            %run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "submission finished"
        );
        Ok(report)
    }

    /// Submit the cart and drop the lines that went through.
    ///
    /// When nothing succeeded the cart is left exactly as it was.
    pub async fn submit_cart(&self, cart: &mut CartStore) -> Result<SubmissionReport, SubmitError> {
        let report = self.submit(cart.items()).await?;
        if report.succeeded() > 0 {
            cart.remove_all(report.succeeded_ids());
        }
        Ok(report)
    }

    async fn submit_one(&self, item: &CartItem) -> SubmissionOutcome {
        let request = OrderRequest {
            user_id: self.operator.user_id,
            user_name: self.operator.user_name.clone(),
            items: vec![OrderLine {
                id: item.id.clone(),
                qty: item.input_qty,
                action: item.action,
            }],
        };

        match self.sender.submit_order(&request).await {
            Ok(resp) if resp.success => SubmissionOutcome::Success {
                details: resp.details,
            },
            Ok(resp) => SubmissionOutcome::Failure {
                message: resp
                    .error
                    .unwrap_or_else(|| "rejected by server".to_string()),
            },
            Err(err) => SubmissionOutcome::Failure {
                message: err.to_string(),
            },
        }
    }
}
