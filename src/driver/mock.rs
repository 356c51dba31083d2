//! Test doubles for the connection, pool and routing seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::config::ServerAddress;
use super::connection::{ChannelAttributes, Connection, ConnectionPool};
use super::error::{DriverError, DriverResult};
use super::handlers::ResponseHandler;
use super::routing::RoutingErrorHandler;
use super::types::Value;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Connection that counts auto-read toggles and close calls.
#[derive(Debug)]
pub(crate) struct MockConnection {
    id: u64,
    address: ServerAddress,
    attributes: ChannelAttributes,
    auto_read: AtomicBool,
    enables: AtomicUsize,
    disables: AtomicUsize,
    closes: AtomicUsize,
    close_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockConnection {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_address(ServerAddress::new("db1", 7687))
    }

    pub(crate) fn with_address(address: ServerAddress) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            address,
            attributes: ChannelAttributes::new(),
            auto_read: AtomicBool::new(true),
            enables: AtomicUsize::new(0),
            disables: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            close_gate: Mutex::new(None),
        })
    }

    /// Connection whose close completes only after the returned sender fires.
    pub(crate) fn with_pending_close() -> (Arc<Self>, oneshot::Sender<()>) {
        let connection = Self::new();
        let (sender, receiver) = oneshot::channel();
        *connection.close_gate.lock() = Some(receiver);
        (connection, sender)
    }

    pub(crate) fn enable_count(&self) -> usize {
        self.enables.load(Ordering::SeqCst)
    }

    pub(crate) fn disable_count(&self) -> usize {
        self.disables.load(Ordering::SeqCst)
    }

    pub(crate) fn auto_read(&self) -> bool {
        self.auto_read.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closes.load(Ordering::SeqCst) > 0
    }
}

impl Connection for MockConnection {
    fn id(&self) -> u64 {
        self.id
    }

    fn address(&self) -> &ServerAddress {
        &self.address
    }

    fn attributes(&self) -> &ChannelAttributes {
        &self.attributes
    }

    fn enable_auto_read(&self) {
        self.enables.fetch_add(1, Ordering::SeqCst);
        self.auto_read.store(true, Ordering::SeqCst);
    }

    fn disable_auto_read(&self) {
        self.disables.fetch_add(1, Ordering::SeqCst);
        self.auto_read.store(false, Ordering::SeqCst);
    }

    fn close(&self) -> BoxFuture<'static, DriverResult<()>> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_gate.lock().take() {
            Some(gate) => async move {
                let _ = gate.await;
                Ok(())
            }
            .boxed(),
            None => future::ready(Ok(())).boxed(),
        }
    }
}

/// Pool that remembers the ids of released connections.
#[derive(Debug, Default)]
pub(crate) struct MockPool {
    released: Mutex<Vec<u64>>,
}

impl MockPool {
    pub(crate) fn released(&self) -> Vec<u64> {
        self.released.lock().clone()
    }
}

impl ConnectionPool for MockPool {
    fn release(&self, connection: Arc<dyn Connection>) -> BoxFuture<'static, DriverResult<()>> {
        self.released.lock().push(connection.id());
        future::ready(Ok(())).boxed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RoutingEvent {
    ConnectionFailure(ServerAddress),
    WriteFailure(ServerAddress),
}

/// Routing error handler that records every notification.
#[derive(Debug, Default)]
pub(crate) struct MockRoutingErrorHandler {
    events: Mutex<Vec<RoutingEvent>>,
}

impl MockRoutingErrorHandler {
    pub(crate) fn events(&self) -> Vec<RoutingEvent> {
        self.events.lock().clone()
    }
}

impl RoutingErrorHandler for MockRoutingErrorHandler {
    fn on_connection_failure(&self, address: &ServerAddress) {
        self.events.lock().push(RoutingEvent::ConnectionFailure(address.clone()));
    }

    fn on_write_failure(&self, address: &ServerAddress) {
        self.events.lock().push(RoutingEvent::WriteFailure(address.clone()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HandlerEvent {
    Record(Vec<Value>),
    Success(HashMap<String, Value>),
    Failure(DriverError),
}

/// Handler that records every callback and accepts records.
#[derive(Debug, Default)]
pub(crate) struct RecordingHandler {
    events: Mutex<Vec<HandlerEvent>>,
    auto_read_disabled: AtomicBool,
}

impl RecordingHandler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<HandlerEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn auto_read_management_disabled(&self) -> bool {
        self.auto_read_disabled.load(Ordering::SeqCst)
    }
}

impl ResponseHandler for RecordingHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        self.events.lock().push(HandlerEvent::Success(metadata));
    }

    fn on_failure(&self, error: DriverError) {
        self.events.lock().push(HandlerEvent::Failure(error));
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        self.events.lock().push(HandlerEvent::Record(fields));
        Ok(())
    }

    fn can_manage_auto_read(&self) -> bool {
        true
    }

    fn disable_auto_read_management(&self) {
        self.auto_read_disabled.store(true, Ordering::SeqCst);
    }
}
