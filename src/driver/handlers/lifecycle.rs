//! 연결/트랜잭션 수명주기 핸들러
//!
//! HELLO/INIT, BEGIN, COMMIT, ROLLBACK, RESET 응답을 받아 호출자의
//! [`Completion`]을 완료한다. 채널을 닫거나 풀에 반납하는 작업은 I/O 태스크를
//! 막지 않도록 별도 tokio 태스크에서 수행하고, 그 작업이 끝난 뒤에 완료한다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::promise::{Completion, Promise};
use super::{unexpected_record, ResponseHandler};
use crate::bolt::MetadataExtractor;
use crate::driver::bolt::CurrentError;
use crate::driver::connection::{Connection, ConnectionPool};
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::session::Bookmark;
use crate::driver::types::Value;

/// 콜백 밖에서 돌아야 하는 닫기/반납 작업을 띄우는 곳
///
/// 핸들러를 만들 때의 tokio 런타임 핸들을 잡아 두므로, 런타임 밖의 I/O
/// 스레드가 콜백을 호출해도 작업은 그 런타임에서 돈다.
#[derive(Debug, Clone)]
struct TaskSpawner {
    handle: Option<Handle>,
}

impl TaskSpawner {
    fn capture() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }

    fn spawn<F>(&self, task: F) -> DriverResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| {
                DriverError::illegal_state("No tokio runtime available to close or release the channel")
            })?,
        };
        handle.spawn(task);
        Ok(())
    }

    /// `work`가 끝난 뒤 그 결과로 `promise`를 완료한다
    fn complete_after(&self, promise: Arc<Promise<()>>, work: BoxFuture<'static, DriverResult<()>>) {
        let task_promise = promise.clone();
        let spawned = self.spawn(async move {
            task_promise.complete(work.await);
        });
        if let Err(error) = spawned {
            warn!(%error, "Failed to schedule channel task");
            promise.complete(Err(error));
        }
    }

    /// 채널을 닫은 뒤 `error`로 `promise`를 실패시킨다
    fn close_then_fail(&self, connection: &Arc<dyn Connection>, promise: Arc<Promise<()>>, error: DriverError) {
        let connection_id = connection.id();
        let close = connection.close().map(move |result| {
            if let Err(close_error) = result {
                warn!(connection = connection_id, %close_error, "Failed to close channel");
            }
            Err::<(), _>(error)
        });
        self.complete_after(promise, close.boxed());
    }
}

// ============================================================================
// HandshakeResponseHandler - HELLO / INIT
// ============================================================================

/// 초기화 요청 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    /// Bolt v3 이상의 HELLO (서버가 connection_id를 부여)
    Hello,
    /// Bolt v1/v2의 INIT
    Init,
}

/// HELLO/INIT 응답 핸들러
pub struct HandshakeResponseHandler {
    kind: HandshakeKind,
    connection: Arc<dyn Connection>,
    extractor: MetadataExtractor,
    ready: Arc<Promise<()>>,
    tasks: TaskSpawner,
}

impl HandshakeResponseHandler {
    /// 핸들러와 "연결 준비됨" future 생성
    pub fn new(
        kind: HandshakeKind,
        connection: Arc<dyn Connection>,
        extractor: MetadataExtractor,
    ) -> (Self, Completion<()>) {
        let (ready, completion) = Promise::new();
        let handler = Self {
            kind,
            connection,
            extractor,
            ready: Arc::new(ready),
            tasks: TaskSpawner::capture(),
        };
        (handler, completion)
    }

    fn apply_metadata(&self, metadata: &HashMap<String, Value>) -> DriverResult<()> {
        let version = self.extractor.extract_server_version(metadata)?;
        let connection_id = match self.kind {
            HandshakeKind::Hello => Some(self.extractor.extract_connection_id(metadata)?),
            HandshakeKind::Init => None,
        };

        let attributes = self.connection.attributes();
        attributes.set_server_version(version);
        if let Some(connection_id) = connection_id {
            attributes.set_connection_id(connection_id);
        }
        Ok(())
    }
}

impl ResponseHandler for HandshakeResponseHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        match self.apply_metadata(&metadata) {
            Ok(()) => {
                debug!(
                    connection = self.connection.id(),
                    kind = ?self.kind,
                    server = ?self.connection.attributes().server_version(),
                    "Handshake completed"
                );
                self.ready.complete(Ok(()));
            }
            Err(error) => self.tasks.close_then_fail(&self.connection, self.ready.clone(), error),
        }
    }

    fn on_failure(&self, error: DriverError) {
        debug!(connection = self.connection.id(), %error, "Handshake failed");
        self.tasks.close_then_fail(&self.connection, self.ready.clone(), error);
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        Err(unexpected_record("HandshakeResponseHandler", &fields))
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

// ============================================================================
// BeginTxResponseHandler
// ============================================================================

/// BEGIN 응답 핸들러
#[derive(Debug)]
pub struct BeginTxResponseHandler {
    begun: Promise<()>,
}

impl BeginTxResponseHandler {
    /// 핸들러와 "트랜잭션 시작됨" future 생성
    pub fn new() -> (Self, Completion<()>) {
        let (begun, completion) = Promise::new();
        (Self { begun }, completion)
    }
}

impl ResponseHandler for BeginTxResponseHandler {
    fn on_success(&self, _metadata: HashMap<String, Value>) {
        self.begun.complete(Ok(()));
    }

    fn on_failure(&self, error: DriverError) {
        self.begun.complete(Err(error));
    }

    fn on_record(&self, _fields: Vec<Value>) -> DriverResult<()> {
        Ok(())
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

// ============================================================================
// CommitTxResponseHandler
// ============================================================================

/// COMMIT 응답 핸들러. 성공 시 서버가 준 북마크로 완료된다.
#[derive(Debug)]
pub struct CommitTxResponseHandler {
    extractor: MetadataExtractor,
    committed: Promise<Option<Bookmark>>,
}

impl CommitTxResponseHandler {
    /// 핸들러와 북마크 future 생성
    pub fn new(extractor: MetadataExtractor) -> (Self, Completion<Option<Bookmark>>) {
        let (committed, completion) = Promise::new();
        (Self { extractor, committed }, completion)
    }
}

impl ResponseHandler for CommitTxResponseHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        let bookmark = self.extractor.extract_bookmark(&metadata);
        debug!(bookmark = ?bookmark, "COMMIT succeeded");
        self.committed.complete(Ok(bookmark));
    }

    fn on_failure(&self, error: DriverError) {
        self.committed.complete(Err(error));
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        Err(unexpected_record("CommitTxResponseHandler", &fields))
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

// ============================================================================
// RollbackTxResponseHandler
// ============================================================================

/// ROLLBACK 응답 핸들러
#[derive(Debug)]
pub struct RollbackTxResponseHandler {
    rolled_back: Promise<()>,
}

impl RollbackTxResponseHandler {
    /// 핸들러와 "롤백됨" future 생성
    pub fn new() -> (Self, Completion<()>) {
        let (rolled_back, completion) = Promise::new();
        (Self { rolled_back }, completion)
    }
}

impl ResponseHandler for RollbackTxResponseHandler {
    fn on_success(&self, _metadata: HashMap<String, Value>) {
        self.rolled_back.complete(Ok(()));
    }

    fn on_failure(&self, error: DriverError) {
        self.rolled_back.complete(Err(error));
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        Err(unexpected_record("RollbackTxResponseHandler", &fields))
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

// ============================================================================
// ResetResponseHandler - RESET (+ 풀 반납)
// ============================================================================

/// RESET 완료 후 동작
pub enum ResetCompletion {
    /// 결과만 알린다
    Notify(Arc<Promise<()>>),
    /// 성공하면 마지막 사용 시각을 찍고 풀에 반납, 실패하면 채널을 닫는다.
    /// 반납(또는 닫기)이 끝난 뒤에 완료된다.
    Release {
        /// 반납할 연결
        connection: Arc<dyn Connection>,
        /// 연결을 받을 풀
        pool: Arc<dyn ConnectionPool>,
        /// "반납됨" promise
        released: Arc<Promise<()>>,
    },
}

impl ResetCompletion {
    /// 결과만 알리는 완료
    pub fn notify() -> (Self, Completion<()>) {
        let (promise, completion) = Promise::new();
        (ResetCompletion::Notify(Arc::new(promise)), completion)
    }

    /// 풀 반납까지 수행하는 완료
    pub fn release(connection: Arc<dyn Connection>, pool: Arc<dyn ConnectionPool>) -> (Self, Completion<()>) {
        let (promise, completion) = Promise::new();
        let released = Arc::new(promise);
        (ResetCompletion::Release { connection, pool, released }, completion)
    }
}

/// RESET 응답 핸들러
///
/// 성공하면 디스패처의 현재 에러를 지워 이후 요청이 IGNORED 처리되지 않게 한다.
pub struct ResetResponseHandler {
    current_error: CurrentError,
    completion: ResetCompletion,
    tasks: TaskSpawner,
}

impl ResetResponseHandler {
    /// 새 핸들러 생성
    pub fn new(current_error: CurrentError, completion: ResetCompletion) -> Self {
        Self {
            current_error,
            completion,
            tasks: TaskSpawner::capture(),
        }
    }
}

impl ResponseHandler for ResetResponseHandler {
    fn on_success(&self, _metadata: HashMap<String, Value>) {
        self.current_error.clear();
        match &self.completion {
            ResetCompletion::Notify(promise) => {
                promise.complete(Ok(()));
            }
            ResetCompletion::Release { connection, pool, released } => {
                connection.attributes().mark_used(Instant::now());
                debug!(connection = connection.id(), "RESET succeeded, releasing to pool");
                self.tasks.complete_after(released.clone(), pool.release(connection.clone()));
            }
        }
    }

    fn on_failure(&self, error: DriverError) {
        match &self.completion {
            ResetCompletion::Notify(promise) => {
                promise.complete(Err(error));
            }
            ResetCompletion::Release { connection, released, .. } => {
                debug!(connection = connection.id(), %error, "RESET failed, closing channel");
                self.tasks.complete_after(released.clone(), connection.close());
            }
        }
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        Err(unexpected_record("ResetResponseHandler", &fields))
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::SuccessMessage;
    use crate::driver::mock::{MockConnection, MockPool};
    use futures::poll;

    fn hello_handler(connection: &Arc<MockConnection>) -> (HandshakeResponseHandler, Completion<()>) {
        HandshakeResponseHandler::new(HandshakeKind::Hello, connection.clone(), MetadataExtractor::V3)
    }

    #[tokio::test]
    async fn test_hello_records_server_version_and_connection_id() {
        let connection = MockConnection::new();
        let (handler, ready) = hello_handler(&connection);

        handler.on_success(SuccessMessage::hello_success("Zeta4G/5.2.1", "bolt-17").into_metadata());

        ready.await.unwrap();
        let attributes = connection.attributes();
        assert_eq!(attributes.connection_id().as_deref(), Some("bolt-17"));
        assert_eq!(attributes.server_version().unwrap().to_string(), "Zeta4G/5.2.1");
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_init_does_not_require_connection_id() {
        let connection = MockConnection::new();
        let (handler, ready) =
            HandshakeResponseHandler::new(HandshakeKind::Init, connection.clone(), MetadataExtractor::V1);

        handler.on_success(SuccessMessage::new().with("server", "Zeta4G/3.4.0").into_metadata());

        ready.await.unwrap();
        assert!(connection.attributes().connection_id().is_none());
        assert!(connection.attributes().server_version().is_some());
    }

    #[tokio::test]
    async fn test_hello_without_connection_id_fails_and_closes() {
        let connection = MockConnection::new();
        let (handler, ready) = hello_handler(&connection);

        handler.on_success(SuccessMessage::new().with("server", "Zeta4G/5.0.0").into_metadata());

        assert!(matches!(ready.await, Err(DriverError::Protocol(_))));
        assert!(connection.is_closed());
        assert!(connection.attributes().server_version().is_none());
    }

    #[tokio::test]
    async fn test_handshake_failure_completes_after_close() {
        let (connection, close_gate) = MockConnection::with_pending_close();
        let (handler, ready) = hello_handler(&connection);
        let error = DriverError::client("Neo.ClientError.Security.Unauthorized", "bad credentials");

        handler.on_failure(error.clone());
        let mut ready = Box::pin(ready);
        tokio::task::yield_now().await;
        assert!(connection.is_closed());
        assert!(poll!(&mut ready).is_pending());

        close_gate.send(()).unwrap();
        assert_eq!(ready.await, Err(error));
    }

    #[test]
    fn test_handshake_record_is_protocol_violation() {
        let connection = MockConnection::new();
        let (handler, _ready) = hello_handler(&connection);
        assert!(matches!(
            handler.on_record(vec![Value::Null]),
            Err(DriverError::Protocol(_))
        ));
        assert!(!handler.can_manage_auto_read());
    }

    #[tokio::test]
    async fn test_begin_completes_and_ignores_records() {
        let (handler, begun) = BeginTxResponseHandler::new();
        assert!(handler.on_record(vec![Value::Integer(1)]).is_ok());
        handler.on_success(HashMap::new());
        assert!(begun.await.is_ok());

        let (handler, begun) = BeginTxResponseHandler::new();
        handler.on_failure(DriverError::transient("Neo.TransientError.General.DatabaseUnavailable", "down"));
        assert!(matches!(begun.await, Err(DriverError::Transient { .. })));
    }

    #[tokio::test]
    async fn test_commit_completes_with_bookmark() {
        let (handler, committed) = CommitTxResponseHandler::new(MetadataExtractor::V3);
        handler.on_success(SuccessMessage::bookmark_success("bm-9").into_metadata());
        assert_eq!(committed.await.unwrap(), Some(Bookmark::new("bm-9")));

        let (handler, committed) = CommitTxResponseHandler::new(MetadataExtractor::V3);
        handler.on_success(HashMap::new());
        assert_eq!(committed.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_failure_and_record() {
        let (handler, committed) = CommitTxResponseHandler::new(MetadataExtractor::V3);
        assert!(matches!(
            handler.on_record(vec![Value::Integer(1)]),
            Err(DriverError::Protocol(_))
        ));
        let error = DriverError::database("Neo.DatabaseError.General.UnknownError", "boom");
        handler.on_failure(error.clone());
        assert_eq!(committed.await, Err(error));
    }

    #[tokio::test]
    async fn test_rollback_completes() {
        let (handler, rolled_back) = RollbackTxResponseHandler::new();
        handler.on_success(HashMap::new());
        assert!(rolled_back.await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_clears_current_error() {
        let current_error = CurrentError::default();
        current_error.set(DriverError::client("Neo.ClientError.Statement.SyntaxError", "bad"));
        let (completion, reset) = ResetCompletion::notify();
        let handler = ResetResponseHandler::new(current_error.clone(), completion);

        handler.on_success(HashMap::new());

        assert!(reset.await.is_ok());
        assert!(current_error.get().is_none());
    }

    #[tokio::test]
    async fn test_reset_failure_keeps_current_error() {
        let current_error = CurrentError::default();
        current_error.set(DriverError::client("Neo.ClientError.Statement.SyntaxError", "bad"));
        let (completion, reset) = ResetCompletion::notify();
        let handler = ResetResponseHandler::new(current_error.clone(), completion);

        handler.on_failure(DriverError::service_unavailable("gone"));

        assert!(matches!(reset.await, Err(DriverError::ServiceUnavailable(_))));
        assert!(current_error.get().is_some());
    }

    #[tokio::test]
    async fn test_reset_success_stamps_and_releases() {
        let connection = MockConnection::new();
        let pool = Arc::new(MockPool::default());
        let (completion, released) = ResetCompletion::release(connection.clone(), pool.clone());
        let handler = ResetResponseHandler::new(CurrentError::default(), completion);
        assert!(connection.attributes().last_used().is_none());

        handler.on_success(HashMap::new());

        released.await.unwrap();
        assert!(connection.attributes().last_used().is_some());
        assert_eq!(pool.released(), vec![connection.id()]);
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_reset_failure_closes_instead_of_releasing() {
        let (connection, close_gate) = MockConnection::with_pending_close();
        let pool = Arc::new(MockPool::default());
        let (completion, released) = ResetCompletion::release(connection.clone(), pool.clone());
        let handler = ResetResponseHandler::new(CurrentError::default(), completion);

        handler.on_failure(DriverError::service_unavailable("gone"));
        let mut released = Box::pin(released);
        tokio::task::yield_now().await;
        assert!(poll!(&mut released).is_pending());

        close_gate.send(()).unwrap();
        released.await.unwrap();
        assert!(connection.is_closed());
        assert!(pool.released().is_empty());
        assert!(connection.attributes().last_used().is_none());
    }

    #[test]
    fn test_callback_from_foreign_thread_runs_on_captured_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let connection = MockConnection::new();
        let (handler, ready) = {
            let _guard = runtime.enter();
            hello_handler(&connection)
        };
        let error = DriverError::client("Neo.ClientError.Security.Unauthorized", "bad credentials");

        let delivered = error.clone();
        std::thread::spawn(move || handler.on_failure(delivered))
            .join()
            .unwrap();

        assert_eq!(runtime.block_on(ready), Err(error));
        assert!(connection.is_closed());
    }

    #[test]
    fn test_release_without_runtime_fails_instead_of_panicking() {
        let connection = MockConnection::new();
        let pool = Arc::new(MockPool::default());
        let (completion, released) = ResetCompletion::release(connection.clone(), pool);
        let handler = ResetResponseHandler::new(CurrentError::default(), completion);

        handler.on_success(HashMap::new());

        let result = futures::executor::block_on(released);
        assert!(matches!(result, Err(DriverError::IllegalState(_))));
    }
}
