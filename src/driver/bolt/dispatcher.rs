//! Inbound response dispatcher.
//!
//! Requests are answered in the order they were sent, so each connection keeps
//! a FIFO of response handlers. RECORD messages go to the head handler, and
//! every summary message (SUCCESS, FAILURE, IGNORED) completes and removes it.
//!
//! After a FAILURE the server ignores everything until it receives RESET.
//! The failure is remembered as the current error and reported to the
//! handlers of the ignored requests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::bolt::BoltResponse;
use crate::driver::connection::Connection;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::handlers::ResponseHandler;
use crate::driver::types::Value;

/// Shared slot holding the failure that made the server ignore requests.
///
/// A clone is handed to the RESET handler so it can clear the error once the
/// server has acknowledged the reset.
#[derive(Debug, Clone, Default)]
pub struct CurrentError {
    inner: Arc<Mutex<Option<DriverError>>>,
}

impl CurrentError {
    /// Current error, if any.
    pub fn get(&self) -> Option<DriverError> {
        self.inner.lock().clone()
    }

    /// Remember `error` as the current error.
    pub fn set(&self, error: DriverError) {
        *self.inner.lock() = Some(error);
    }

    /// Forget the current error.
    pub fn clear(&self) {
        self.inner.lock().take();
    }
}

#[derive(Default)]
struct DispatcherState {
    handlers: VecDeque<Arc<dyn ResponseHandler>>,
    auto_read_manager: Option<Arc<dyn ResponseHandler>>,
}

/// Routes decoded responses of one connection to their handlers.
pub struct ResponseDispatcher {
    connection: Arc<dyn Connection>,
    state: Mutex<DispatcherState>,
    current_error: CurrentError,
}

impl ResponseDispatcher {
    /// Create a dispatcher for `connection`.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            state: Mutex::new(DispatcherState::default()),
            current_error: CurrentError::default(),
        }
    }

    /// Queue the handler for the next request sent on the connection.
    ///
    /// Only the most recently queued handler that can manage auto-read keeps
    /// doing so; the previous one is told to stop.
    pub fn enqueue(&self, handler: Arc<dyn ResponseHandler>) {
        let replaced = {
            let mut state = self.state.lock();
            state.handlers.push_back(handler.clone());
            if handler.can_manage_auto_read() {
                state.auto_read_manager.replace(handler)
            } else {
                None
            }
        };
        if let Some(previous) = replaced {
            self.retire_auto_read_manager(previous);
        }
    }

    /// Deliver one response to the handler it belongs to.
    ///
    /// Returns an error if no handler is waiting or the handler rejects a record.
    pub fn dispatch(&self, response: BoltResponse) -> DriverResult<()> {
        trace!(connection = self.connection.id(), message = response.name(), "Dispatching response");
        match response {
            BoltResponse::Record(record) => {
                let handler = self.head(&record.fields)?;
                handler.on_record(record.fields)
            }
            BoltResponse::Success(success) => {
                let handler = self.dequeue("SUCCESS")?;
                handler.on_success(success.into_metadata());
                Ok(())
            }
            BoltResponse::Failure(failure) => {
                let error = DriverError::from(failure);
                debug!(connection = self.connection.id(), %error, "Received FAILURE");
                self.current_error.set(error.clone());
                let handler = self.dequeue("FAILURE")?;
                handler.on_failure(error);
                Ok(())
            }
            BoltResponse::Ignored => {
                let handler = self.dequeue("IGNORED")?;
                let error = self
                    .current_error
                    .get()
                    .unwrap_or_else(|| DriverError::client("", "Database ignored the request"));
                handler.on_failure(error);
                Ok(())
            }
        }
    }

    /// Number of handlers waiting for a response.
    pub fn queued_count(&self) -> usize {
        self.state.lock().handlers.len()
    }

    /// Failure that the server is currently ignoring requests for.
    pub fn current_error(&self) -> Option<DriverError> {
        self.current_error.get()
    }

    /// Forget the current error.
    pub fn clear_current_error(&self) {
        self.current_error.clear();
    }

    /// Handle on the current error, for the RESET handler.
    pub fn current_error_state(&self) -> CurrentError {
        self.current_error.clone()
    }

    fn head(&self, fields: &[Value]) -> DriverResult<Arc<dyn ResponseHandler>> {
        self.state.lock().handlers.front().cloned().ok_or_else(|| {
            DriverError::protocol(format!(
                "Received RECORD with {} field(s) but no response handler is queued",
                fields.len()
            ))
        })
    }

    fn dequeue(&self, message: &str) -> DriverResult<Arc<dyn ResponseHandler>> {
        let (handler, retired) = {
            let mut state = self.state.lock();
            let handler = state.handlers.pop_front().ok_or_else(|| {
                DriverError::protocol(format!("Received {} but no response handler is queued", message))
            })?;
            let is_manager = state
                .auto_read_manager
                .as_ref()
                .map_or(false, |manager| Arc::ptr_eq(manager, &handler));
            let retired = if is_manager { state.auto_read_manager.take() } else { None };
            (handler, retired)
        };
        if let Some(manager) = retired {
            self.retire_auto_read_manager(manager);
        }
        Ok(handler)
    }

    fn retire_auto_read_manager(&self, manager: Arc<dyn ResponseHandler>) {
        manager.disable_auto_read_management();
        self.connection.enable_auto_read();
    }
}

impl std::fmt::Debug for ResponseDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDispatcher")
            .field("connection", &self.connection.id())
            .field("queued", &self.queued_count())
            .field("current_error", &self.current_error.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::{BoltErrorCode, FailureMessage, RecordMessage, SuccessMessage};
    use crate::driver::handlers::{NoOpResponseHandler, ResetCompletion, ResetResponseHandler};
    use crate::driver::mock::{HandlerEvent, MockConnection, RecordingHandler};
    use std::collections::HashMap;

    fn dispatcher() -> (ResponseDispatcher, Arc<MockConnection>) {
        let connection = MockConnection::new();
        (ResponseDispatcher::new(connection.clone()), connection)
    }

    fn syntax_failure() -> BoltResponse {
        BoltResponse::Failure(FailureMessage::new(BoltErrorCode::SYNTAX_ERROR, "bad query"))
    }

    #[test]
    fn test_records_go_to_head_until_summary() {
        let (dispatcher, _connection) = dispatcher();
        let first = RecordingHandler::new();
        let second = RecordingHandler::new();
        dispatcher.enqueue(first.clone());
        dispatcher.enqueue(second.clone());

        dispatcher
            .dispatch(BoltResponse::Record(RecordMessage::new(vec![Value::Integer(1)])))
            .unwrap();
        assert_eq!(dispatcher.queued_count(), 2);
        dispatcher
            .dispatch(BoltResponse::Success(SuccessMessage::new()))
            .unwrap();
        dispatcher
            .dispatch(BoltResponse::Success(SuccessMessage::new()))
            .unwrap();

        assert_eq!(
            first.events(),
            vec![
                HandlerEvent::Record(vec![Value::Integer(1)]),
                HandlerEvent::Success(HashMap::new()),
            ]
        );
        assert_eq!(second.events(), vec![HandlerEvent::Success(HashMap::new())]);
        assert_eq!(dispatcher.queued_count(), 0);
    }

    #[test]
    fn test_failure_is_reported_to_ignored_requests() {
        let (dispatcher, _connection) = dispatcher();
        let failed = RecordingHandler::new();
        let ignored = RecordingHandler::new();
        dispatcher.enqueue(failed.clone());
        dispatcher.enqueue(ignored.clone());

        dispatcher.dispatch(syntax_failure()).unwrap();
        dispatcher.dispatch(BoltResponse::Ignored).unwrap();

        let expected = DriverError::client(BoltErrorCode::SYNTAX_ERROR, "bad query");
        assert_eq!(failed.events(), vec![HandlerEvent::Failure(expected.clone())]);
        assert_eq!(ignored.events(), vec![HandlerEvent::Failure(expected.clone())]);
        assert_eq!(dispatcher.current_error(), Some(expected));
    }

    #[test]
    fn test_ignored_without_failure() {
        let (dispatcher, _connection) = dispatcher();
        let handler = RecordingHandler::new();
        dispatcher.enqueue(handler.clone());

        dispatcher.dispatch(BoltResponse::Ignored).unwrap();

        assert_eq!(
            handler.events(),
            vec![HandlerEvent::Failure(DriverError::client("", "Database ignored the request"))]
        );
    }

    #[test]
    fn test_response_without_handler_is_protocol_error() {
        let (dispatcher, _connection) = dispatcher();
        assert!(matches!(
            dispatcher.dispatch(BoltResponse::Success(SuccessMessage::new())),
            Err(DriverError::Protocol(_))
        ));
        assert!(matches!(
            dispatcher.dispatch(BoltResponse::Record(RecordMessage::new(vec![]))),
            Err(DriverError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_record_rejected_by_handler_is_returned() {
        let (dispatcher, _connection) = dispatcher();
        let (completion, _reset) = ResetCompletion::notify();
        dispatcher.enqueue(Arc::new(ResetResponseHandler::new(
            dispatcher.current_error_state(),
            completion,
        )));

        let result = dispatcher.dispatch(BoltResponse::Record(RecordMessage::new(vec![Value::Null])));
        assert!(matches!(result, Err(DriverError::Protocol(_))));
        assert_eq!(dispatcher.queued_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_current_error() {
        let (dispatcher, _connection) = dispatcher();
        dispatcher.enqueue(RecordingHandler::new());
        dispatcher.dispatch(syntax_failure()).unwrap();
        assert!(dispatcher.current_error().is_some());

        let (completion, reset) = ResetCompletion::notify();
        dispatcher.enqueue(Arc::new(ResetResponseHandler::new(
            dispatcher.current_error_state(),
            completion,
        )));
        dispatcher
            .dispatch(BoltResponse::Success(SuccessMessage::new()))
            .unwrap();

        reset.await.unwrap();
        assert!(dispatcher.current_error().is_none());
    }

    #[test]
    fn test_clear_current_error() {
        let (dispatcher, _connection) = dispatcher();
        dispatcher.enqueue(RecordingHandler::new());
        dispatcher.dispatch(syntax_failure()).unwrap();

        dispatcher.clear_current_error();
        assert!(dispatcher.current_error().is_none());
    }

    #[test]
    fn test_latest_managing_handler_owns_auto_read() {
        let (dispatcher, connection) = dispatcher();
        let first = RecordingHandler::new();
        let second = RecordingHandler::new();

        dispatcher.enqueue(first.clone());
        dispatcher.enqueue(Arc::new(NoOpResponseHandler));
        assert!(!first.auto_read_management_disabled());

        dispatcher.enqueue(second.clone());
        assert!(first.auto_read_management_disabled());
        assert!(!second.auto_read_management_disabled());
        assert_eq!(connection.enable_count(), 1);
    }

    #[test]
    fn test_completed_manager_is_retired() {
        let (dispatcher, connection) = dispatcher();
        let handler = RecordingHandler::new();
        dispatcher.enqueue(handler.clone());

        dispatcher
            .dispatch(BoltResponse::Success(SuccessMessage::new()))
            .unwrap();

        assert!(handler.auto_read_management_disabled());
        assert!(connection.auto_read());
        assert_eq!(connection.enable_count(), 1);
    }
}
