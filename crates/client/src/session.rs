//! Operator session: the cart plus everything that acts on it.
//!
//! The presentation layer turns taps, scans and keystrokes into [`Command`]s
//! and renders the [`Notice`]s that come back. Nothing here knows about the
//! screen.

use std::sync::Arc;

use tokio::sync::watch;

use vuzoll_cart::{CartItem, CartStore};
use vuzoll_core::{Action, DomainError, ItemId, Operator};

use crate::activity::ActivityTracker;
use crate::api::{Backend, BackendError, Catalog, HttpBackend, ServerLogs};
use crate::config::ClientConfig;
use crate::monitor::{ConnectivityMonitor, MonitorHandle};
use crate::probe::ConnectionProbe;
use crate::submission::{SubmissionPipeline, SubmitError};
use crate::types::{ConnectivityStatus, SearchHit, SubmissionReport};

/// Shortest query sent to `/api/search`.
pub const MIN_SEARCH_LEN: usize = 2;

/// Typed input from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Any tap, or focus on the search field.
    Activity,
    /// Raw text decoded from a QR code.
    Scanned(String),
    Search(String),
    /// A search hit was chosen.
    Pick(ItemId),
    SetQuantity { id: ItemId, raw: String },
    SetAction { id: ItemId, action: Action },
    SetDefaultAction(Action),
    /// Remove a line; the operator has already confirmed.
    Remove(ItemId),
    Submit,
    FetchServerLogs,
    Status,
}

/// Output for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Cart(Vec<CartItem>),
    SearchResults(Vec<SearchHit>),
    Alert(String),
    Report(SubmissionReport),
    ServerLogs(String),
    Connectivity(ConnectivityStatus),
}

pub struct Session {
    catalog: Arc<dyn Catalog>,
    logs: Arc<dyn ServerLogs>,
    pipeline: SubmissionPipeline,
    cart: CartStore,
    default_action: Action,
    activity: ActivityTracker,
    connectivity: watch::Receiver<ConnectivityStatus>,
}

impl Session {
    pub fn new<B>(
        backend: Arc<B>,
        operator: Operator,
        default_action: Action,
        activity: ActivityTracker,
        connectivity: watch::Receiver<ConnectivityStatus>,
    ) -> Self
    where
        B: Backend + 'static,
    {
        Self {
            catalog: backend.clone(),
            logs: backend.clone(),
            pipeline: SubmissionPipeline::new(backend, operator),
            cart: CartStore::new(),
            default_action,
            activity,
            connectivity,
        }
    }

    /// Wire a session to the configured backend and start the connectivity
    /// monitor. Must run inside a tokio runtime.
    pub fn launch(config: &ClientConfig) -> Result<(Self, MonitorHandle), BackendError> {
        let backend = Arc::new(HttpBackend::new(config.api_url.clone(), config.request_timeout)?);
        let activity = ActivityTracker::new();
        let probe = Arc::new(ConnectionProbe::new(backend.clone(), config.probe_timeout));
        let monitor = ConnectivityMonitor::new(config.polling, probe, activity.clone()).spawn();

        tracing::info!(api_url = backend.api_url(), "session started");

        let session = Self::new(
            backend,
            config.operator.clone(),
            config.default_action,
            activity,
            monitor.subscribe(),
        );
        Ok((session, monitor))
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn default_action(&self) -> Action {
        self.default_action
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub async fn handle(&mut self, command: Command) -> Vec<Notice> {
        if command != Command::Status {
            self.activity.record_activity();
        }

        match command {
            Command::Activity => Vec::new(),
            Command::Scanned(raw) => match ItemId::new(raw) {
                Ok(id) => self.add_by_id(id).await,
                Err(_) => vec![Notice::Alert("❌ Empty code scanned".to_string())],
            },
            Command::Pick(id) => self.add_by_id(id).await,
            Command::Search(query) => vec![Notice::SearchResults(self.search(&query).await)],
            Command::SetQuantity { id, raw } => {
                let result = self.cart.update_quantity(&id, &raw).map(|_| ());
                self.after_edit(&id, result)
            }
            Command::SetAction { id, action } => {
                let result = self.cart.update_action(&id, action);
                self.after_edit(&id, result)
            }
            Command::SetDefaultAction(action) => {
                self.default_action = action;
                Vec::new()
            }
            Command::Remove(id) => {
                let result = self.cart.remove(&id).map(|_| ());
                self.after_edit(&id, result)
            }
            Command::Submit => self.submit().await,
            Command::FetchServerLogs => match self.logs.fetch_logs().await {
                Ok(logs) => vec![Notice::ServerLogs(logs)],
                Err(err) => {
                    tracing::warn!(error = %err, "server logs unavailable");
                    vec![Notice::Alert("❌ Failed to load server logs".to_string())]
                }
            },
            Command::Status => vec![Notice::Connectivity(*self.connectivity.borrow())],
        }
    }

    /// Empty or one-character queries do not hit the backend; failures
    /// show as "no results".
    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Vec::new();
        }
        match self.catalog.search(query).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, query, "search failed");
                Vec::new()
            }
        }
    }

    async fn add_by_id(&mut self, id: ItemId) -> Vec<Notice> {
        let item = match self.catalog.get_item(&id).await {
            Ok(item) => item,
            Err(BackendError::Rejected(reason)) => {
                return vec![Notice::Alert(format!("❌ {reason}"))];
            }
            Err(err) => {
                tracing::warn!(item_id = %id, error = %err, "item lookup failed");
                return vec![Notice::Alert("❌ Network error".to_string())];
            }
        };

        match self.cart.add(item, self.default_action) {
            Ok(_) => vec![self.cart_notice()],
            Err(DomainError::Duplicate(_)) => {
                vec![Notice::Alert("This item is already in the cart".to_string())]
            }
            Err(err) => vec![Notice::Alert(format!("❌ {err}"))],
        }
    }

    async fn submit(&mut self) -> Vec<Notice> {
        if self.cart.is_empty() {
            return Vec::new();
        }
        match self.pipeline.submit_cart(&mut self.cart).await {
            Ok(report) => vec![Notice::Report(report), self.cart_notice()],
            Err(err @ SubmitError::ZeroQuantity { .. }) => {
                tracing::info!(error = %err, "submission rejected before sending");
                vec![Notice::Alert(format!("⚠️ {err}"))]
            }
            Err(SubmitError::EmptyCart) => Vec::new(),
        }
    }

    fn after_edit(&self, id: &ItemId, result: Result<(), DomainError>) -> Vec<Notice> {
        match result {
            Ok(()) => vec![self.cart_notice()],
            Err(err) => {
                tracing::debug!(item_id = %id, error = %err, "cart edit ignored");
                vec![Notice::Alert(format!("No line {id} in the cart"))]
            }
        }
    }

    fn cart_notice(&self) -> Notice {
        Notice::Cart(self.cart.items().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use vuzoll_cart::CatalogItem;

    use super::*;
    use crate::api::{HealthCheck, OrderSender};
    use crate::submission::tests::RecordingSender;
    use crate::types::{OrderRequest, OrderResponse};

    #[derive(Default)]
    struct FakeBackend {
        items: HashMap<String, CatalogItem>,
        hits: Vec<SearchHit>,
        offline: bool,
        searches: Mutex<Vec<String>>,
        orders: RecordingSender,
    }

    fn unreachable() -> BackendError {
        BackendError::Network("unreachable".into())
    }

    #[async_trait::async_trait]
    impl HealthCheck for FakeBackend {
        async fn health(&self) -> Result<(), BackendError> {
            if self.offline { Err(unreachable()) } else { Ok(()) }
        }
    }

    #[async_trait::async_trait]
    impl Catalog for FakeBackend {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>, BackendError> {
            self.searches.lock().unwrap().push(query.to_string());
            if self.offline {
                return Err(unreachable());
            }
            Ok(self.hits.clone())
        }

        async fn get_item(&self, id: &ItemId) -> Result<CatalogItem, BackendError> {
            if self.offline {
                return Err(unreachable());
            }
            self.items
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| BackendError::Rejected(format!("Item {id} not found")))
        }
    }

    #[async_trait::async_trait]
    impl OrderSender for FakeBackend {
        async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BackendError> {
            self.orders.submit_order(order).await
        }
    }

    #[async_trait::async_trait]
    impl ServerLogs for FakeBackend {
        async fn fetch_logs(&self) -> Result<String, BackendError> {
            if self.offline { Err(unreachable()) } else { Ok("bot started".into()) }
        }
    }

    fn part(id: &str, name: &str) -> (String, CatalogItem) {
        (
            id.to_string(),
            CatalogItem {
                id: ItemId::new(id).unwrap(),
                name: name.to_string(),
                quantity: 12,
                location: Some("A-3".into()),
            },
        )
    }

    fn id(raw: &str) -> ItemId {
        ItemId::new(raw).unwrap()
    }

    fn open(backend: FakeBackend) -> (Session, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let (_tx, rx) = watch::channel(ConnectivityStatus::Connected);
        let session = Session::new(
            backend.clone(),
            Operator::new(Some(1), Some("Ivan".into())),
            Action::Take,
            ActivityTracker::new(),
            rx,
        );
        (session, backend)
    }

    fn stocked() -> FakeBackend {
        FakeBackend {
            items: HashMap::from([part("A", "Bearing 6204"), part("B", "V-belt A42")]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scanning_adds_item_with_current_default_action() {
        let (mut session, _) = open(stocked());
        session.handle(Command::SetDefaultAction(Action::Restock)).await;

        let notices = session.handle(Command::Scanned(" A ".into())).await;

        let [Notice::Cart(lines)] = notices.as_slice() else {
            panic!("expected cart notice, got {notices:?}");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].action, Action::Restock);
        assert_eq!(lines[0].input_qty, 0);
    }

    #[tokio::test]
    async fn scanning_same_item_twice_warns_and_keeps_cart() {
        let (mut session, _) = open(stocked());
        session.handle(Command::Scanned("A".into())).await;

        let notices = session.handle(Command::Pick(id("A"))).await;

        assert_eq!(
            notices,
            vec![Notice::Alert("This item is already in the cart".into())]
        );
        assert_eq!(session.cart().len(), 1);
    }

    #[tokio::test]
    async fn backend_refusal_and_network_errors_become_alerts() {
        let (mut session, _) = open(stocked());
        assert_eq!(
            session.handle(Command::Scanned("Z".into())).await,
            vec![Notice::Alert("❌ Item Z not found".into())]
        );

        let (mut session, _) = open(FakeBackend { offline: true, ..stocked() });
        assert_eq!(
            session.handle(Command::Scanned("A".into())).await,
            vec![Notice::Alert("❌ Network error".into())]
        );
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn short_queries_do_not_reach_backend_and_errors_yield_no_results() {
        let hit = SearchHit {
            id: id("A"),
            name: "Bearing 6204".into(),
        };
        let (mut session, backend) = open(FakeBackend {
            hits: vec![hit.clone()],
            ..Default::default()
        });

        assert_eq!(
            session.handle(Command::Search(" b ".into())).await,
            vec![Notice::SearchResults(vec![])]
        );
        assert_eq!(
            session.handle(Command::Search("bea".into())).await,
            vec![Notice::SearchResults(vec![hit])]
        );
        assert_eq!(*backend.searches.lock().unwrap(), vec!["bea".to_string()]);

        let (mut session, _) = open(FakeBackend { offline: true, ..Default::default() });
        assert_eq!(
            session.handle(Command::Search("bearing".into())).await,
            vec![Notice::SearchResults(vec![])]
        );
    }

    #[tokio::test]
    async fn submit_with_zero_quantity_sends_nothing() {
        let (mut session, backend) = open(stocked());
        session.handle(Command::Scanned("A".into())).await;
        session.handle(Command::Scanned("B".into())).await;
        session
            .handle(Command::SetQuantity { id: id("A"), raw: "2".into() })
            .await;

        let notices = session.handle(Command::Submit).await;

        assert!(matches!(notices.as_slice(), [Notice::Alert(msg)] if msg.contains("V-belt A42")));
        assert!(backend.orders.requests().is_empty());
        assert_eq!(session.cart().len(), 2);
    }

    #[tokio::test]
    async fn submit_reports_and_keeps_failed_lines() {
        let mut backend = stocked();
        backend.orders.fail.insert("B".into(), "Not enough stock".into());
        let (mut session, backend) = open(backend);

        for raw in ["A", "B"] {
            session.handle(Command::Scanned(raw.into())).await;
            session
                .handle(Command::SetQuantity { id: id(raw), raw: "1".into() })
                .await;
        }

        let notices = session.handle(Command::Submit).await;

        let [Notice::Report(report), Notice::Cart(left)] = notices.as_slice() else {
            panic!("expected report and cart, got {notices:?}");
        };
        assert_eq!(report.lines(), vec!["A: ok", "❌ V-belt A42: Not enough stock"]);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, id("B"));
        assert_eq!(backend.orders.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_cart_submit_is_a_no_op() {
        let (mut session, backend) = open(stocked());
        assert!(session.handle(Command::Submit).await.is_empty());
        assert!(backend.orders.requests().is_empty());
    }

    #[tokio::test]
    async fn edits_and_removal_flow_through_to_cart() {
        let (mut session, _) = open(stocked());
        session.handle(Command::Scanned("A".into())).await;

        session
            .handle(Command::SetAction { id: id("A"), action: Action::Fact })
            .await;
        session
            .handle(Command::SetQuantity { id: id("A"), raw: "x".into() })
            .await;
        let line = session.cart().get(&id("A")).unwrap();
        assert_eq!(line.action, Action::Fact);
        assert_eq!(line.input_qty, 0);

        assert_eq!(
            session.handle(Command::Remove(id("A"))).await,
            vec![Notice::Cart(vec![])]
        );
        assert_eq!(
            session.handle(Command::Remove(id("A"))).await,
            vec![Notice::Alert("No line A in the cart".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commands_count_as_activity_but_status_does_not() {
        let (mut session, _) = open(stocked());
        let start = session.activity().last_activity();

        tokio::time::advance(tokio::time::Duration::from_secs(90)).await;
        assert_eq!(
            session.handle(Command::Status).await,
            vec![Notice::Connectivity(ConnectivityStatus::Connected)]
        );
        assert_eq!(session.activity().last_activity(), start);

        session.handle(Command::Activity).await;
        assert!(session.activity().last_activity() > start);
    }

    #[tokio::test]
    async fn server_logs_are_forwarded() {
        let (mut session, _) = open(stocked());
        assert_eq!(
            session.handle(Command::FetchServerLogs).await,
            vec![Notice::ServerLogs("bot started".into())]
        );
    }
}
