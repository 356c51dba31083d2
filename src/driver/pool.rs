//! Idle Connection Pool
//!
//! RESET 후 반납된 연결을 보관했다가 다시 내준다. 연결 생성과 인증은 이
//! 크레이트 밖의 일이라, 이 풀은 유휴 연결 큐와 그 수명 관리만 맡는다.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::config::DriverConfig;
use super::connection::{Connection, ConnectionPool};
use super::error::DriverResult;

// ============================================================================
// PoolMetrics - 풀 메트릭
// ============================================================================

/// 풀 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// 유휴 연결 수
    pub idle: usize,
    /// 총 반납 횟수
    pub total_released: u64,
    /// 유휴 연결을 내준 횟수
    pub total_acquired: u64,
    /// 풀이 닫은 연결 수
    pub total_closed: u64,
}

// ============================================================================
// IdleConnectionPool - 유휴 연결 풀
// ============================================================================

/// 유휴 연결 풀
pub struct IdleConnectionPool {
    /// 보관할 최대 유휴 연결 수
    max_idle: usize,
    /// 이보다 오래 쉰 연결은 내주지 않고 닫는다
    idle_timeout: Duration,
    /// 유휴 연결들 (오래된 것부터)
    idle: Mutex<VecDeque<Arc<dyn Connection>>>,
    /// 열린 상태
    open: RwLock<bool>,
    total_released: AtomicU64,
    total_acquired: AtomicU64,
    total_closed: AtomicU64,
}

impl IdleConnectionPool {
    /// 새 풀 생성
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            max_idle: config.max_idle_connections,
            idle_timeout: config.idle_timeout,
            idle: Mutex::new(VecDeque::new()),
            open: RwLock::new(true),
            total_released: AtomicU64::new(0),
            total_acquired: AtomicU64::new(0),
            total_closed: AtomicU64::new(0),
        }
    }

    /// 유휴 연결 획득
    ///
    /// 유휴 시간이 제한을 넘은 연결은 닫고 건너뛴다. 쓸 수 있는 연결이 없으면 `None`.
    pub async fn acquire(&self) -> DriverResult<Option<Arc<dyn Connection>>> {
        let now = Instant::now();
        let mut stale = Vec::new();
        let acquired = {
            let mut idle = self.idle.lock();
            let mut acquired = None;
            while let Some(connection) = idle.pop_front() {
                if connection.attributes().idle_for(now) >= self.idle_timeout {
                    stale.push(connection);
                } else {
                    acquired = Some(connection);
                    break;
                }
            }
            acquired
        };

        for connection in stale {
            debug!(connection = connection.id(), "Closing connection idle past timeout");
            self.close_connection(connection).await?;
        }

        if acquired.is_some() {
            self.total_acquired.fetch_add(1, Ordering::Relaxed);
        }
        Ok(acquired)
    }

    /// 풀 닫기. 유휴 연결을 모두 닫고 이후 반납되는 연결도 닫는다.
    pub async fn close(&self) -> DriverResult<()> {
        *self.open.write() = false;

        let drained: Vec<_> = self.idle.lock().drain(..).collect();
        for connection in drained {
            self.close_connection(connection).await?;
        }
        Ok(())
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    /// 유휴 연결 수
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// 메트릭 조회
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            idle: self.idle_count(),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
        }
    }

    fn close_connection(&self, connection: Arc<dyn Connection>) -> BoxFuture<'static, DriverResult<()>> {
        self.total_closed.fetch_add(1, Ordering::Relaxed);
        let id = connection.id();
        connection
            .close()
            .map(move |result| {
                if let Err(e) = &result {
                    warn!(connection = id, "Failed to close pooled connection: {}", e);
                }
                result
            })
            .boxed()
    }
}

impl ConnectionPool for IdleConnectionPool {
    fn release(&self, connection: Arc<dyn Connection>) -> BoxFuture<'static, DriverResult<()>> {
        self.total_released.fetch_add(1, Ordering::Relaxed);

        if !self.is_open() {
            return self.close_connection(connection);
        }

        let rejected = {
            let mut idle = self.idle.lock();
            if idle.len() >= self.max_idle {
                Some(connection)
            } else {
                idle.push_back(connection);
                None
            }
        };

        match rejected {
            Some(connection) => {
                debug!(connection = connection.id(), max_idle = self.max_idle, "Idle pool full, closing");
                self.close_connection(connection)
            }
            None => future::ready(Ok(())).boxed(),
        }
    }
}

impl std::fmt::Debug for IdleConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleConnectionPool")
            .field("max_idle", &self.max_idle)
            .field("idle", &self.idle_count())
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
