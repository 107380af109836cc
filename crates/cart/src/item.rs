use serde::{Deserialize, Serialize};

use vuzoll_core::{Action, ItemId};

/// A part as the backend describes it (`/api/get_item` response body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    /// On-hand stock at lookup time.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub location: Option<String>,
}

/// One pending line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ItemId,
    pub name: String,
    /// On-hand stock, display only.
    pub quantity: i64,
    pub location: Option<String>,
    /// Quantity entered by the operator.
    pub input_qty: u32,
    pub action: Action,
}

impl CartItem {
    pub fn from_catalog(item: CatalogItem, action: Action) -> Self {
        Self {
            id: item.id,
            name: item.name,
            quantity: item.quantity,
            location: item.location,
            input_qty: 0,
            action,
        }
    }

    pub fn location_or_unknown(&self) -> &str {
        self.location.as_deref().unwrap_or("?")
    }
}

/// Normalize operator input to a quantity.
///
/// Leading ASCII digits are taken (`"3.5"` is 3, `" 12pcs"` is 12); anything
/// else, including negative numbers and overflow, becomes 0.
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse::<u32>().unwrap_or(0)
}
