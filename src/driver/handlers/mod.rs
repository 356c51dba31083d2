//! Response Handlers
//!
//! 요청마다 하나씩 등록되어 응답 메시지를 받는 핸들러들.
//!
//! - [`RunResponseHandler`] - RUN 응답 (컬럼 키, 첫 레코드 시간, 쿼리 ID)
//! - [`PullAllResponseHandler`] - PULL_ALL 응답 스트림, 워터마크 흐름 제어
//! - [`RoutingResponseHandler`] - 클러스터 라우팅용 에러 재분류 데코레이터
//! - [`HandshakeResponseHandler`], [`BeginTxResponseHandler`],
//!   [`CommitTxResponseHandler`], [`RollbackTxResponseHandler`],
//!   [`ResetResponseHandler`] - 연결/트랜잭션 수명주기
//! - [`NoOpResponseHandler`], [`PingResponseHandler`] - 결과를 버리거나 생존 확인
//!
//! 콜백은 연결의 I/O 태스크에서 호출되므로 블로킹하거나 await하지 않는다.
//! 채널을 닫거나 풀에 반납하는 핸들러는 생성 시점의 tokio 런타임에 그 작업을
//! 띄운다. 런타임 밖에서 만들었다면 콜백을 런타임 안에서 호출해야 하며,
//! 그렇지 않으면 해당 완료가 `IllegalState` 에러로 끝난다.

use std::collections::HashMap;

use super::error::{DriverError, DriverResult};
use super::types::Value;

mod lifecycle;
mod promise;
mod pull;
mod routing;
mod run;
mod utility;

pub use lifecycle::{
    BeginTxResponseHandler, CommitTxResponseHandler, HandshakeKind, HandshakeResponseHandler,
    ResetCompletion, ResetResponseHandler, RollbackTxResponseHandler,
};
pub use promise::{Completion, Promise};
pub use pull::{PullAllResponseHandler, PullCompletion};
pub use routing::RoutingResponseHandler;
pub use run::RunResponseHandler;
pub use utility::{NoOpResponseHandler, PingResponseHandler};

// ============================================================================
// ResponseHandler - 응답 핸들러
// ============================================================================

/// 한 요청의 응답을 받는 핸들러
///
/// 한 요청에 대해 `on_record`는 0번 이상, 그 뒤 `on_success`나 `on_failure`
/// 중 하나가 정확히 한 번 호출된다.
pub trait ResponseHandler: Send + Sync {
    /// 요약 성공 메시지
    fn on_success(&self, metadata: HashMap<String, Value>);

    /// 요약 실패 메시지
    fn on_failure(&self, error: DriverError);

    /// 레코드 메시지. 레코드를 기대하지 않는 핸들러는 프로토콜 에러를 반환한다.
    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()>;

    /// 소켓 자동 읽기를 이 핸들러가 조절할 수 있는지 여부
    fn can_manage_auto_read(&self) -> bool {
        true
    }

    /// 자동 읽기 조절을 끈다. 이후 이 핸들러는 읽기 스위치를 건드리지 않는다.
    fn disable_auto_read_management(&self) {}
}

/// 레코드를 받을 수 없는 핸들러가 레코드를 받았을 때의 에러
pub(crate) fn unexpected_record(handler: &str, fields: &[Value]) -> DriverError {
    DriverError::protocol(format!(
        "{} received a record with {} field(s), but its request does not produce records",
        handler,
        fields.len()
    ))
}
