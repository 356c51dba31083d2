//! Result Cursor
//!
//! 한 쿼리의 RUN/PULL_ALL 핸들러 쌍을 감싸 호출자에게 레코드를 내준다.
//!
//! # Example
//!
//! ```ignore
//! let cursor = ResultCursor::new(run_handler, pull_handler);
//!
//! while let Some(record) = cursor.next_async().await? {
//!     println!("{}", record);
//! }
//! let summary = cursor.consume_async().await?;
//!
//! // 또는 Stream으로
//! use futures::TryStreamExt;
//! let names: Vec<String> = cursor
//!     .into_stream()
//!     .map_ok(|r| r.get_string("name").unwrap_or_default())
//!     .try_collect()
//!     .await?;
//! ```

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use super::error::{DriverError, DriverResult};
use super::handlers::{PullAllResponseHandler, RunResponseHandler};
use super::record::Record;
use super::summary::ResultSummary;

// ============================================================================
// ResultCursor - 결과 커서
// ============================================================================

/// 비동기 결과 커서
#[derive(Debug, Clone)]
pub struct ResultCursor {
    run: Arc<RunResponseHandler>,
    pull: Arc<PullAllResponseHandler>,
}

impl ResultCursor {
    /// 커서 생성
    pub fn new(run: Arc<RunResponseHandler>, pull: Arc<PullAllResponseHandler>) -> Self {
        Self { run, pull }
    }

    /// 컬럼 키
    pub fn keys(&self) -> Vec<String> {
        self.run.keys().names().to_vec()
    }

    /// 다음 레코드 확인 (꺼내지 않음)
    pub async fn peek_async(&self) -> DriverResult<Option<Record>> {
        self.pull.peek_async().await
    }

    /// 다음 레코드
    pub async fn next_async(&self) -> DriverResult<Option<Record>> {
        self.pull.next_async().await
    }

    /// 정확히 하나인 레코드
    pub async fn single_async(&self) -> DriverResult<Record> {
        let first = self.next_async().await?.ok_or_else(|| {
            DriverError::no_such_record("Cannot retrieve a single record, because this result is empty.")
        })?;
        if self.peek_async().await?.is_some() {
            return Err(DriverError::no_such_record(
                "Expected a result with a single record, but this result contains at least one more. \
                 Ensure your query returns only one record.",
            ));
        }
        Ok(first)
    }

    /// 남은 레코드마다 `action`을 실행하고 요약을 반환
    pub async fn for_each_async<F>(&self, mut action: F) -> DriverResult<ResultSummary>
    where
        F: FnMut(Record),
    {
        while let Some(record) = self.next_async().await? {
            action(record);
        }
        self.summary_async().await
    }

    /// 남은 레코드를 모두 변환해 수집
    pub async fn list_async<T, F>(&self, map_fn: F) -> DriverResult<Vec<T>>
    where
        F: FnMut(Record) -> T,
    {
        self.pull.list_async(map_fn).await
    }

    /// 남은 레코드를 버리고 요약 반환
    pub async fn consume_async(&self) -> DriverResult<ResultSummary> {
        self.pull.consume_async().await
    }

    /// 스트림이 끝난 뒤 요약
    pub async fn summary_async(&self) -> DriverResult<ResultSummary> {
        self.pull.summary_async().await
    }

    /// 스트림이 끝난 뒤 아직 전달되지 않은 실패
    pub async fn failure_async(&self) -> Option<DriverError> {
        self.pull.failure_async().await
    }

    /// 남은 레코드를 `Stream`으로 변환. 첫 에러를 내고 끝난다.
    pub fn into_stream(self) -> BoxStream<'static, DriverResult<Record>> {
        stream::unfold(Some(self.pull), |pull| async move {
            let pull = pull?;
            match pull.next_async().await {
                Ok(Some(record)) => Some((Ok(record), Some(pull))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        })
        .boxed()
    }
}
