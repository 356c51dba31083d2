//! Transaction State
//!
//! 명시적 트랜잭션의 공유 상태. 트랜잭션 내부에서 실행된 쿼리의 응답
//! 핸들러가 실패를 받으면 같은 핸들을 통해 트랜잭션을 종료 상태로 표시한다.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::error::{DriverError, DriverResult};

// ============================================================================
// TransactionState - 트랜잭션 상태
// ============================================================================

/// 트랜잭션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// 활성 상태
    Active,
    /// 실패로 종료됨 (롤백만 가능)
    Terminated,
    /// 커밋됨
    Committed,
    /// 롤백됨
    RolledBack,
}

impl TransactionState {
    /// 커밋/롤백으로 닫힌 상태 여부
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

// ============================================================================
// TransactionHandle - 트랜잭션 핸들
// ============================================================================

/// 트랜잭션 상태 핸들. 복제본은 같은 상태를 공유한다.
#[derive(Debug, Clone)]
pub struct TransactionHandle {
    state: Arc<RwLock<TransactionState>>,
}

impl TransactionHandle {
    /// 활성 트랜잭션 핸들 생성
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TransactionState::Active)),
        }
    }

    /// 현재 상태
    pub fn state(&self) -> TransactionState {
        *self.state.read()
    }

    /// 아직 커밋/롤백되지 않았는지 여부
    pub fn is_open(&self) -> bool {
        !self.state().is_closed()
    }

    /// 실패로 종료되었는지 여부
    pub fn is_terminated(&self) -> bool {
        self.state() == TransactionState::Terminated
    }

    /// 실패로 종료 표시. 활성 상태에서만 전이한다.
    pub fn mark_terminated(&self) {
        let mut state = self.state.write();
        if *state == TransactionState::Active {
            *state = TransactionState::Terminated;
            debug!("Transaction marked as terminated");
        }
    }

    /// 커밋 완료 표시
    pub fn mark_committed(&self) {
        *self.state.write() = TransactionState::Committed;
    }

    /// 롤백 완료 표시
    pub fn mark_rolled_back(&self) {
        *self.state.write() = TransactionState::RolledBack;
    }

    /// 쿼리 실행 가능 여부 확인
    pub fn ensure_can_run(&self) -> DriverResult<()> {
        match self.state() {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(DriverError::transaction(
                "Cannot run more queries in this transaction, it has been committed",
            )),
            TransactionState::RolledBack => Err(DriverError::transaction(
                "Cannot run more queries in this transaction, it has been rolled back",
            )),
            TransactionState::Terminated => Err(DriverError::transaction(
                "Cannot run more queries in this transaction, it has either experienced a fatal error or was explicitly terminated",
            )),
        }
    }

    /// 커밋 전 확인. `Ok(false)`면 이미 커밋되어 보낼 것이 없다.
    pub fn ensure_can_commit(&self) -> DriverResult<bool> {
        match self.state() {
            TransactionState::Active => Ok(true),
            TransactionState::Committed => Ok(false),
            TransactionState::RolledBack => Err(DriverError::transaction(
                "Can't commit, transaction has been rolled back",
            )),
            TransactionState::Terminated => Err(DriverError::transaction(
                "Transaction can't be committed. It has been rolled back either because of an error or explicit termination",
            )),
        }
    }

    /// 롤백 전 확인. `Ok(false)`면 서버에 보낼 필요가 없다.
    ///
    /// 종료된 트랜잭션은 서버가 이미 롤백했으므로 여기서 롤백 완료로 표시한다.
    pub fn ensure_can_rollback(&self) -> DriverResult<bool> {
        match self.state() {
            TransactionState::Active => Ok(true),
            TransactionState::RolledBack => Ok(false),
            TransactionState::Terminated => {
                self.mark_rolled_back();
                Ok(false)
            }
            TransactionState::Committed => Err(DriverError::transaction(
                "Can't rollback, transaction has been committed",
            )),
        }
    }
}

impl Default for TransactionHandle {
    fn default() -> Self {
        Self::new()
    }
}
