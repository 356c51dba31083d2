//! 라우팅 모듈
//!
//! 클러스터 환경에서 응답 핸들러가 서버 장애를 라우팅 계층에 알리는 경로.
//! [`RoutingResponseHandler`](crate::driver::handlers::RoutingResponseHandler)가
//! 에러를 재분류하면서 [`RoutingErrorHandler`]를 호출하고,
//! [`SharedRoutingTable`]은 그 알림을 받아 테이블에서 서버를 뺀다.

use super::config::ServerAddress;

mod table;

pub use table::{RoutingTable, ServerRole, SharedRoutingTable};

/// 라우팅 계층이 받는 장애 알림
pub trait RoutingErrorHandler: Send + Sync {
    /// 서버에 연결할 수 없거나 데이터베이스를 쓸 수 없음
    fn on_connection_failure(&self, address: &ServerAddress);

    /// 서버가 더 이상 쓰기를 받지 않음 (리더 변경 등)
    fn on_write_failure(&self, address: &ServerAddress);
}
