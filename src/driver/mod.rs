//! Driver Module
//!
//! 응답 핸들러와 그 주변 타입들.
//!
//! # 구성
//!
//! - [`handlers`] - 요청마다 하나씩 등록되는 응답 핸들러
//! - [`bolt`] - 연결의 응답 디스패처
//! - [`routing`] - 라우팅 장애 알림과 라우팅 테이블
//! - [`ResultCursor`] - 호출자용 결과 커서
//! - [`IdleConnectionPool`] - RESET 후 반납되는 연결을 받는 풀
//!
//! # Example
//!
//! ```ignore
//! use zeta4g_bolt_core::driver::handlers::{PullAllResponseHandler, PullCompletion, RunResponseHandler};
//! use zeta4g_bolt_core::driver::{BookmarkHolder, DriverConfig, ResultCursor};
//!
//! let (run, _run_done) = RunResponseHandler::new(extractor);
//! let run = Arc::new(run);
//! let pull = Arc::new(PullAllResponseHandler::new(
//!     query,
//!     run.clone(),
//!     connection.clone(),
//!     extractor,
//!     PullCompletion::Session(bookmarks.clone()),
//!     &DriverConfig::default(),
//! ));
//! dispatcher.enqueue(run.clone());
//! dispatcher.enqueue(pull.clone());
//!
//! let cursor = ResultCursor::new(run, pull);
//! while let Some(record) = cursor.next_async().await? {
//!     println!("{}", record);
//! }
//! ```

pub mod bolt;
pub mod handlers;
pub mod routing;
mod config;
mod connection;
mod cursor;
mod error;
mod pool;
mod record;
mod session;
mod summary;
mod transaction;
mod types;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports
pub use config::{
    DriverConfig, DriverConfigBuilder, ServerAddress, DEFAULT_PORT,
    DEFAULT_RECORD_BUFFER_HIGH_WATERMARK, DEFAULT_RECORD_BUFFER_LOW_WATERMARK,
};
pub use connection::{ChannelAttributes, Connection, ConnectionPool};
pub use cursor::ResultCursor;
pub use error::{DriverError, DriverResult};
pub use pool::{IdleConnectionPool, PoolMetrics};
pub use record::{Record, RecordKeys};
pub use session::{AccessMode, Bookmark, BookmarkHolder};
pub use summary::{
    Counters, InputPosition, Notification, Query, QueryType, ResultSummary, ServerInfo,
};
pub use transaction::{TransactionHandle, TransactionState};
pub use types::{Duration, Node, Relationship, Value};

/// 파라미터 맵 생성 매크로
#[macro_export]
macro_rules! params {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.into(), $crate::driver::Value::from($value));
        )+
        map
    }};
}
