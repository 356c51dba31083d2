//! PULL_ALL 응답 핸들러
//!
//! 결과 레코드를 버퍼에 쌓아 두고 소비자가 당겨 가게 한다. 버퍼가 상한에
//! 도달하면 소켓 읽기를 멈추고, 소비자가 하한 아래로 비우면 다시 읽는다.
//!
//! 실패는 정확히 한 소비자에게 한 번 전달된다. 레코드 future, 실패 future,
//! 보관 순서로 전달 대상을 고른다.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::promise::{wait, PendingSlot, Waiter};
use super::run::RunResponseHandler;
use super::ResponseHandler;
use crate::bolt::MetadataExtractor;
use crate::driver::config::DriverConfig;
use crate::driver::connection::Connection;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::record::Record;
use crate::driver::session::BookmarkHolder;
use crate::driver::summary::{Query, ResultSummary, ServerInfo};
use crate::driver::transaction::TransactionHandle;
use crate::driver::types::Value;

// ============================================================================
// PullCompletion - 세션/트랜잭션별 후처리
// ============================================================================

/// 스트림 종료 시 후처리
#[derive(Debug, Clone)]
pub enum PullCompletion {
    /// 자동 커밋 쿼리: 성공 메타데이터의 북마크를 세션에 저장
    Session(BookmarkHolder),
    /// 명시적 트랜잭션 내 쿼리: 실패 시 트랜잭션을 종료 상태로 표시
    Transaction(TransactionHandle),
}

impl PullCompletion {
    fn after_success(&self, extractor: &MetadataExtractor, metadata: &HashMap<String, Value>) {
        if let PullCompletion::Session(bookmarks) = self {
            bookmarks.set(extractor.extract_bookmark(metadata));
        }
    }

    fn after_failure(&self) {
        if let PullCompletion::Transaction(transaction) = self {
            transaction.mark_terminated();
        }
    }
}

// ============================================================================
// PullAllResponseHandler
// ============================================================================

struct PullState {
    records: VecDeque<Record>,
    finished: bool,
    ignore_records: bool,
    failure: Option<DriverError>,
    summary: Option<ResultSummary>,
    manage_auto_read: bool,
    reading_suspended: bool,
    record_slot: PendingSlot<DriverResult<Option<Record>>>,
    failure_slot: PendingSlot<Option<DriverError>>,
}

enum Step<T: Clone> {
    Ready(T),
    Wait(Waiter<T>),
}

/// PULL_ALL 응답 핸들러
pub struct PullAllResponseHandler {
    query: Query,
    run_handler: Arc<RunResponseHandler>,
    connection: Arc<dyn Connection>,
    extractor: MetadataExtractor,
    completion: PullCompletion,
    high_watermark: usize,
    low_watermark: usize,
    state: Mutex<PullState>,
}

impl PullAllResponseHandler {
    /// 새 핸들러 생성
    pub fn new(
        query: Query,
        run_handler: Arc<RunResponseHandler>,
        connection: Arc<dyn Connection>,
        extractor: MetadataExtractor,
        completion: PullCompletion,
        config: &DriverConfig,
    ) -> Self {
        let (low_watermark, high_watermark) = config.record_buffer_watermarks();
        Self {
            query,
            run_handler,
            connection,
            extractor,
            completion,
            high_watermark,
            low_watermark,
            state: Mutex::new(PullState {
                records: VecDeque::new(),
                finished: false,
                ignore_records: false,
                failure: None,
                summary: None,
                manage_auto_read: true,
                reading_suspended: false,
                record_slot: PendingSlot::new(),
                failure_slot: PendingSlot::new(),
            }),
        }
    }

    /// 같은 쿼리의 RUN 핸들러
    pub fn run_handler(&self) -> &Arc<RunResponseHandler> {
        &self.run_handler
    }

    /// 버퍼에 남은 레코드 수
    pub fn buffered(&self) -> usize {
        self.state.lock().records.len()
    }

    /// SUCCESS/FAILURE 수신 여부
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// 지금까지 만들어진 요약. 실패로 끝난 스트림에도 남는다.
    pub fn summary(&self) -> Option<ResultSummary> {
        self.state.lock().summary.clone()
    }

    /// 다음 레코드를 꺼내지 않고 확인
    ///
    /// 스트림이 끝났으면 `None`, 보관된 실패가 있으면 그 실패를 반환한다.
    pub async fn peek_async(&self) -> DriverResult<Option<Record>> {
        match self.try_peek() {
            Step::Ready(result) => result,
            Step::Wait(waiter) => wait(waiter, || Err(handler_dropped())).await,
        }
    }

    /// 다음 레코드를 꺼낸다
    pub async fn next_async(&self) -> DriverResult<Option<Record>> {
        loop {
            if self.peek_async().await?.is_none() {
                return Ok(None);
            }
            // 다른 소비자가 먼저 꺼냈을 수 있다
            if let Some(record) = self.dequeue_record() {
                return Ok(Some(record));
            }
        }
    }

    /// 스트림이 끝날 때까지 기다린 뒤 실패를 반환한다 (성공이면 `None`)
    ///
    /// 이미 다른 소비자에게 전달된 실패는 다시 반환되지 않는다.
    pub async fn failure_async(&self) -> Option<DriverError> {
        match self.try_failure() {
            Step::Ready(failure) => failure,
            Step::Wait(waiter) => wait(waiter, || Some(handler_dropped())).await,
        }
    }

    /// 스트림 요약. 실패로 끝났으면 그 실패를 반환한다.
    pub async fn summary_async(&self) -> DriverResult<ResultSummary> {
        if let Some(error) = self.failure_async().await {
            return Err(error);
        }
        self.summary()
            .ok_or_else(|| DriverError::illegal_state("Result summary is not available"))
    }

    /// 남은 레코드를 버리고 요약을 반환한다. 이후 도착하는 레코드도 버린다.
    pub async fn consume_async(&self) -> DriverResult<ResultSummary> {
        self.discard_records();
        self.summary_async().await
    }

    /// 스트림이 끝날 때까지 기다린 뒤 남은 레코드를 모두 변환해 반환한다
    pub async fn list_async<T, F>(&self, map_fn: F) -> DriverResult<Vec<T>>
    where
        F: FnMut(Record) -> T,
    {
        if let Some(error) = self.failure_async().await {
            return Err(error);
        }
        let records = self.drain_finished()?;
        Ok(records.into_iter().map(map_fn).collect())
    }

    fn try_peek(&self) -> Step<DriverResult<Option<Record>>> {
        let mut state = self.state.lock();
        if let Some(record) = state.records.front() {
            return Step::Ready(Ok(Some(record.clone())));
        }
        if let Some(error) = state.failure.take() {
            return Step::Ready(Err(error));
        }
        if state.finished || state.ignore_records {
            return Step::Ready(Ok(None));
        }
        // 빈 버퍼에서 기다리는 소비자
        self.force_reading(&mut state);
        Step::Wait(state.record_slot.arm())
    }

    fn try_failure(&self) -> Step<Option<DriverError>> {
        let mut state = self.state.lock();
        if let Some(error) = state.failure.take() {
            return Step::Ready(Some(error));
        }
        if state.finished {
            return Step::Ready(None);
        }
        // 읽기가 멈춘 동안에는 스트림이 끝날 수 없다
        self.force_reading(&mut state);
        Step::Wait(state.failure_slot.arm())
    }

    fn dequeue_record(&self) -> Option<Record> {
        let mut state = self.state.lock();
        let record = state.records.pop_front();
        if state.records.len() < self.low_watermark {
            self.resume_reading(&mut state);
        }
        record
    }

    fn discard_records(&self) {
        let mut state = self.state.lock();
        state.ignore_records = true;
        state.records.clear();
    }

    fn drain_finished(&self) -> DriverResult<Vec<Record>> {
        let mut state = self.state.lock();
        if !state.finished {
            return Err(DriverError::illegal_state(
                "Can't get records as list because SUCCESS or FAILURE did not arrive",
            ));
        }
        Ok(state.records.drain(..).collect())
    }

    fn resume_reading(&self, state: &mut PullState) {
        if state.manage_auto_read && state.reading_suspended {
            state.reading_suspended = false;
            self.connection.enable_auto_read();
            trace!(connection = self.connection.id(), buffered = state.records.len(), "Resumed reading");
        }
    }

    /// 이 핸들러가 멈춘 적이 없어도 읽기를 켠다
    fn force_reading(&self, state: &mut PullState) {
        if state.manage_auto_read {
            state.reading_suspended = false;
            self.connection.enable_auto_read();
        }
    }

    fn suspend_reading(&self, state: &mut PullState) {
        if state.manage_auto_read && !state.reading_suspended {
            state.reading_suspended = true;
            self.connection.disable_auto_read();
            trace!(connection = self.connection.id(), buffered = state.records.len(), "Suspended reading");
        }
    }

    fn extract_summary(&self, metadata: &HashMap<String, Value>) -> ResultSummary {
        let server = ServerInfo {
            address: self.connection.address().clone(),
            version: self.connection.attributes().server_version(),
        };
        self.extractor.extract_summary(
            &self.query,
            server,
            self.run_handler.result_available_after(),
            metadata,
        )
    }
}

impl ResponseHandler for PullAllResponseHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        let mut state = self.state.lock();
        state.finished = true;
        state.summary = Some(self.extract_summary(&metadata));
        self.completion.after_success(&self.extractor, &metadata);
        // 다음 요청을 위해 읽기 재개
        self.resume_reading(&mut state);

        debug!(
            connection = self.connection.id(),
            buffered = state.records.len(),
            "PULL_ALL succeeded"
        );
        state.record_slot.complete(Ok(None));
        state.failure_slot.complete(None);
    }

    fn on_failure(&self, error: DriverError) {
        let mut state = self.state.lock();
        state.finished = true;
        state.summary = Some(self.extract_summary(&HashMap::new()));
        self.completion.after_failure();
        self.resume_reading(&mut state);

        debug!(connection = self.connection.id(), %error, "PULL_ALL failed");
        if state.record_slot.complete(Err(error.clone())) {
            // 레코드 퓨처로 전달됐으므로 실패 퓨처에는 None
            state.failure_slot.complete(None);
        } else if !state.failure_slot.complete(Some(error.clone())) {
            state.failure = Some(error);
        }
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        let mut state = self.state.lock();
        if state.ignore_records {
            state.record_slot.complete(Ok(None));
            return Ok(());
        }

        let record = Record::new(self.run_handler.keys(), fields);
        if state.record_slot.is_armed() {
            state.record_slot.complete(Ok(Some(record.clone())));
        }
        state.records.push_back(record);

        // 실패 퓨처 대기 중이면 스트림 끝까지 읽는다
        if !state.failure_slot.is_armed() && state.records.len() >= self.high_watermark {
            self.suspend_reading(&mut state);
        }
        Ok(())
    }

    fn can_manage_auto_read(&self) -> bool {
        true
    }

    fn disable_auto_read_management(&self) {
        let mut state = self.state.lock();
        self.resume_reading(&mut state);
        state.manage_auto_read = false;
    }
}

impl std::fmt::Debug for PullAllResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PullAllResponseHandler")
            .field("query", &self.query.text)
            .field("connection", &self.connection.id())
            .field("buffered", &state.records.len())
            .field("finished", &state.finished)
            .field("reading_suspended", &state.reading_suspended)
            .finish()
    }
}

fn handler_dropped() -> DriverError {
    DriverError::illegal_state("PULL_ALL handler was dropped before the stream finished")
}
