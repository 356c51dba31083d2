//! RUN 응답 핸들러
//!
//! RUN의 SUCCESS에서 컬럼 키, 첫 레코드 시간, 쿼리 ID를 꺼내 보관한다.
//! 같은 쿼리의 [`PullAllResponseHandler`](super::PullAllResponseHandler)가
//! 레코드를 만들 때 이 키를 사용한다.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::promise::{Completion, Promise};
use super::{unexpected_record, ResponseHandler};
use crate::bolt::{MetadataExtractor, ABSENT_QUERY_ID, ABSENT_TIMING};
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::record::RecordKeys;
use crate::driver::types::Value;

#[derive(Debug)]
struct RunOutcome {
    keys: Arc<RecordKeys>,
    result_available_after: i64,
    query_id: i64,
}

/// RUN 응답 핸들러
#[derive(Debug)]
pub struct RunResponseHandler {
    extractor: MetadataExtractor,
    outcome: RwLock<RunOutcome>,
    completed: Promise<()>,
}

impl RunResponseHandler {
    /// 핸들러와 RUN 완료 future 생성
    ///
    /// 완료 future는 RUN이 실패해도 성공으로 끝난다. 실패는 뒤따르는 PULL_ALL
    /// 핸들러를 통해 한 번만 전달된다.
    pub fn new(extractor: MetadataExtractor) -> (Self, Completion<()>) {
        let (completed, completion) = Promise::new();
        let handler = Self {
            extractor,
            outcome: RwLock::new(RunOutcome {
                keys: RecordKeys::empty(),
                result_available_after: ABSENT_TIMING,
                query_id: ABSENT_QUERY_ID,
            }),
            completed,
        };
        (handler, completion)
    }

    /// 컬럼 키 (SUCCESS 전에는 비어 있음)
    pub fn keys(&self) -> Arc<RecordKeys> {
        self.outcome.read().keys.clone()
    }

    /// 첫 레코드까지 걸린 밀리초, 없으면 -1
    pub fn result_available_after(&self) -> i64 {
        self.outcome.read().result_available_after
    }

    /// 서버가 부여한 쿼리 ID, 없으면 -1
    pub fn query_id(&self) -> i64 {
        self.outcome.read().query_id
    }
}

impl ResponseHandler for RunResponseHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        let outcome = RunOutcome {
            keys: self.extractor.extract_keys(&metadata),
            result_available_after: self.extractor.extract_result_available_after(&metadata),
            query_id: self.extractor.extract_query_id(&metadata),
        };
        debug!(keys = outcome.keys.len(), qid = outcome.query_id, "RUN succeeded");
        *self.outcome.write() = outcome;
        self.completed.complete(Ok(()));
    }

    fn on_failure(&self, error: DriverError) {
        debug!(%error, "RUN failed");
        self.completed.complete(Ok(()));
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        Err(unexpected_record("RunResponseHandler", &fields))
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}
