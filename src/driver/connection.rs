//! Connection Seams
//!
//! 응답 핸들러가 의존하는 연결/풀 추상화. 실제 소켓과 프레이밍은 이
//! 크레이트 밖에서 구현되며, 핸들러는 여기 정의된 트레이트만 사용한다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use parking_lot::RwLock;

use super::config::ServerAddress;
use super::error::DriverResult;
use crate::bolt::ServerVersion;

// ============================================================================
// Connection - 연결 추상화
// ============================================================================

/// 서버 연결 (채널)
///
/// `enable_auto_read`/`disable_auto_read`는 소켓 읽기를 재개/중단하는
/// 백프레셔 스위치이며, 여러 번 호출해도 안전해야 한다.
pub trait Connection: Send + Sync {
    /// 연결 식별자 (로그용)
    fn id(&self) -> u64;

    /// 서버 주소
    fn address(&self) -> &ServerAddress;

    /// 채널 속성
    fn attributes(&self) -> &ChannelAttributes;

    /// 소켓 자동 읽기 재개
    fn enable_auto_read(&self);

    /// 소켓 자동 읽기 중단
    fn disable_auto_read(&self);

    /// 연결 닫기
    fn close(&self) -> BoxFuture<'static, DriverResult<()>>;
}

impl fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("address", &self.address().to_string())
            .finish()
    }
}

// ============================================================================
// ConnectionPool - 풀 추상화
// ============================================================================

/// 연결을 돌려받는 풀
pub trait ConnectionPool: Send + Sync {
    /// 연결 반납
    fn release(&self, connection: Arc<dyn Connection>) -> BoxFuture<'static, DriverResult<()>>;
}

// ============================================================================
// ChannelAttributes - 채널 속성
// ============================================================================

#[derive(Debug)]
struct AttributeValues {
    connection_id: Option<String>,
    server_version: Option<ServerVersion>,
    last_used: Option<Instant>,
}

/// 채널에 붙는 속성: 연결 ID, 서버 버전, 생성/마지막 사용 시각
#[derive(Debug)]
pub struct ChannelAttributes {
    created_at: Instant,
    values: RwLock<AttributeValues>,
}

impl ChannelAttributes {
    /// 새 속성 생성
    pub fn new() -> Self {
        Self {
            created_at: Instant::now(),
            values: RwLock::new(AttributeValues {
                connection_id: None,
                server_version: None,
                last_used: None,
            }),
        }
    }

    /// 생성 시각
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// 서버가 부여한 연결 ID
    pub fn connection_id(&self) -> Option<String> {
        self.values.read().connection_id.clone()
    }

    /// 연결 ID 기록
    pub fn set_connection_id(&self, connection_id: impl Into<String>) {
        self.values.write().connection_id = Some(connection_id.into());
    }

    /// 서버 버전
    pub fn server_version(&self) -> Option<ServerVersion> {
        self.values.read().server_version.clone()
    }

    /// 서버 버전 기록
    pub fn set_server_version(&self, version: ServerVersion) {
        self.values.write().server_version = Some(version);
    }

    /// 마지막 사용 시각
    pub fn last_used(&self) -> Option<Instant> {
        self.values.read().last_used
    }

    /// 마지막 사용 시각 기록
    pub fn mark_used(&self, at: Instant) {
        self.values.write().last_used = Some(at);
    }

    /// 마지막 사용 이후 (없으면 생성 이후) 경과 시간
    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        let since = self.last_used().unwrap_or(self.created_at);
        now.saturating_duration_since(since)
    }
}

impl Default for ChannelAttributes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_attributes_start_empty() {
        let attributes = ChannelAttributes::new();
        assert_eq!(attributes.connection_id(), None);
        assert_eq!(attributes.server_version(), None);
        assert_eq!(attributes.last_used(), None);
    }

    #[test]
    fn test_attributes_record_values() {
        let attributes = ChannelAttributes::new();
        attributes.set_connection_id("bolt-12");
        attributes.set_server_version(ServerVersion::new("Zeta4G", 1, 0, 0));

        assert_eq!(attributes.connection_id().as_deref(), Some("bolt-12"));
        assert_eq!(attributes.server_version().unwrap().product(), "Zeta4G");
    }

    #[test]
    fn test_idle_for_uses_last_used() {
        let attributes = ChannelAttributes::new();
        let used_at = attributes.created_at() + Duration::from_secs(10);
        attributes.mark_used(used_at);

        let now = used_at + Duration::from_secs(3);
        assert_eq!(attributes.idle_for(now), Duration::from_secs(3));
        assert_eq!(attributes.idle_for(attributes.created_at()), Duration::ZERO);
    }
}
