use vuzoll_core::{Action, DomainError, DomainResult, ItemId};

use crate::item::{CartItem, CatalogItem, parse_quantity};

/// In-memory, insertion-ordered collection of pending line items.
///
/// Invariant: at most one line per [`ItemId`]. Iteration order is insertion
/// order, which is also the order lines are submitted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartStore {
    items: Vec<CartItem>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly resolved catalog item.
    ///
    /// The new line gets `input_qty = 0` and `default_action`. A second add
    /// of the same id leaves the store untouched and returns
    /// [`DomainError::Duplicate`].
    pub fn add(&mut self, item: CatalogItem, default_action: Action) -> DomainResult<&CartItem> {
        if self.contains(&item.id) {
            return Err(DomainError::duplicate(format!("item {} is already in the cart", item.id)));
        }

        tracing::debug!(item_id = %item.id, action = %default_action, "cart line added");
        self.items.push(CartItem::from_catalog(item, default_action));
        Ok(&self.items[self.items.len() - 1])
    }

    /// Set the entered quantity from raw operator input.
    ///
    /// Unparseable input is stored as 0; only an unknown id is an error.
    pub fn update_quantity(&mut self, id: &ItemId, raw: &str) -> DomainResult<u32> {
        let line = self.get_mut(id)?;
        line.input_qty = parse_quantity(raw);
        Ok(line.input_qty)
    }

    pub fn update_action(&mut self, id: &ItemId, action: Action) -> DomainResult<()> {
        self.get_mut(id)?.action = action;
        Ok(())
    }

    /// Remove one line. Asking the operator to confirm is the caller's job.
    pub fn remove(&mut self, id: &ItemId) -> DomainResult<CartItem> {
        let idx = self
            .items
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(DomainError::not_found)?;
        Ok(self.items.remove(idx))
    }

    /// Drop every line whose id is in `ids`, keeping the order of the rest.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) {
        let ids: Vec<&ItemId> = ids.into_iter().collect();
        self.items.retain(|i| !ids.contains(&&i.id));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get_mut(&mut self, id: &ItemId) -> DomainResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(DomainError::not_found)
    }
}
