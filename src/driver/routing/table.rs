//! 라우팅 테이블
//!
//! 클러스터 서버를 역할별로 보관한다. 테이블 갱신(ROUTE)은 이 크레이트 밖의
//! 일이고, 여기서는 응답 핸들러가 보고한 장애를 반영해 서버를 빼기만 한다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::RoutingErrorHandler;
use crate::driver::config::ServerAddress;

/// 서버 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// 라우팅 테이블 제공자
    Route,
    /// 쓰기 처리 (리더)
    Write,
    /// 읽기 처리 (팔로워)
    Read,
}

impl ServerRole {
    /// 문자열에서 역할 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROUTE" => Some(Self::Route),
            "WRITE" => Some(Self::Write),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }

    /// 역할 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "ROUTE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

/// 라우팅 테이블
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routers: Vec<ServerAddress>,
    writers: Vec<ServerAddress>,
    readers: Vec<ServerAddress>,
    database: String,
    ttl: Duration,
    updated_at: Instant,
}

impl RoutingTable {
    /// 빈 테이블 생성
    pub fn new(database: impl Into<String>, ttl: Duration) -> Self {
        Self {
            routers: Vec::new(),
            writers: Vec::new(),
            readers: Vec::new(),
            database: database.into(),
            ttl,
            updated_at: Instant::now(),
        }
    }

    /// 데이터베이스 이름
    pub fn database(&self) -> &str {
        &self.database
    }

    /// 역할별 서버 목록
    pub fn servers(&self, role: ServerRole) -> &[ServerAddress] {
        match role {
            ServerRole::Route => &self.routers,
            ServerRole::Write => &self.writers,
            ServerRole::Read => &self.readers,
        }
    }

    /// 서버 추가 (중복 무시)
    pub fn add_server(&mut self, role: ServerRole, address: ServerAddress) {
        let servers = match role {
            ServerRole::Route => &mut self.routers,
            ServerRole::Write => &mut self.writers,
            ServerRole::Read => &mut self.readers,
        };
        if !servers.contains(&address) {
            servers.push(address);
        }
    }

    /// 모든 역할에서 서버 제거
    pub fn forget(&mut self, address: &ServerAddress) {
        self.routers.retain(|a| a != address);
        self.writers.retain(|a| a != address);
        self.readers.retain(|a| a != address);
    }

    /// 쓰기 역할에서만 서버 제거
    pub fn forget_writer(&mut self, address: &ServerAddress) {
        self.writers.retain(|a| a != address);
    }

    /// 쓰기 가능한 서버가 있는지
    pub fn has_writers(&self) -> bool {
        !self.writers.is_empty()
    }

    /// 읽기 가능한 서버가 있는지
    pub fn has_readers(&self) -> bool {
        !self.readers.is_empty()
    }

    /// TTL 경과 여부
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.updated_at) >= self.ttl
    }

    /// 갱신 시각 기록
    pub fn mark_updated(&mut self, now: Instant) {
        self.updated_at = now;
    }
}

// ============================================================================
// SharedRoutingTable
// ============================================================================

/// 여러 연결의 핸들러가 함께 쓰는 라우팅 테이블
#[derive(Debug, Clone)]
pub struct SharedRoutingTable {
    table: Arc<RwLock<RoutingTable>>,
}

impl SharedRoutingTable {
    /// 테이블을 공유 핸들로 감싼다
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// 현재 테이블 복사본
    pub fn snapshot(&self) -> RoutingTable {
        self.table.read().clone()
    }

    /// 테이블 교체 (외부 갱신 결과 반영)
    pub fn replace(&self, table: RoutingTable) {
        *self.table.write() = table;
    }
}

impl RoutingErrorHandler for SharedRoutingTable {
    fn on_connection_failure(&self, address: &ServerAddress) {
        let mut table = self.table.write();
        table.forget(address);
        debug!(%address, database = %table.database, "Removed unavailable server from routing table");
    }

    fn on_write_failure(&self, address: &ServerAddress) {
        let mut table = self.table.write();
        table.forget_writer(address);
        debug!(%address, database = %table.database, "Removed server from routing table writers");
    }
}
