//! Driver Error Types
//!
//! 드라이버 에러 정의. 응답 핸들러는 같은 에러를 여러 대기자에게 전달하므로
//! 모든 에러는 `Clone` 가능해야 한다.

use thiserror::Error;

use crate::bolt::{code_suffix, BoltErrorCode, FailureMessage};

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 서비스 불가 (연결 실패)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 세션 만료 (라우팅 재분류 결과)
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// 클라이언트 에러 (`*.ClientError.*`)
    #[error("Client error: {code} - {message}")]
    Client { code: String, message: String },

    /// 트랜지언트 에러 (`*.TransientError.*`)
    #[error("Transient error: {code} - {message}")]
    Transient { code: String, message: String },

    /// 데이터베이스 에러 (`*.DatabaseError.*`)
    #[error("Database error: {code} - {message}")]
    Database { code: String, message: String },

    /// 프로토콜 에러
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 연결 에러
    #[error("Connection error: {0}")]
    Connection(String),

    /// 트랜잭션 에러
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 타입 변환 에러
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// 잘못된 호출 순서
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// 레코드 없음
    #[error("No such record: {0}")]
    NoSuchRecord(String),
}

impl DriverError {
    /// 서비스 불가 에러 생성
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// 세션 만료 에러 생성
    pub fn session_expired(msg: impl Into<String>) -> Self {
        Self::SessionExpired(msg.into())
    }

    /// 클라이언트 에러 생성
    pub fn client(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 트랜지언트 에러 생성
    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 데이터베이스 에러 생성
    pub fn database(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 프로토콜 에러 생성
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 트랜잭션 에러 생성
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 타입 변환 에러 생성
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// 잘못된 상태 에러 생성
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// 레코드 없음 에러 생성
    pub fn no_such_record(msg: impl Into<String>) -> Self {
        Self::NoSuchRecord(msg.into())
    }

    /// 서버 에러 코드 (서버가 보낸 실패인 경우)
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Client { code, .. } | Self::Transient { code, .. } | Self::Database { code, .. } => {
                Some(code)
            }
            _ => None,
        }
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServiceUnavailable(_) | Self::SessionExpired(_) | Self::Connection(_) => true,
            Self::Transient { .. } => true,
            Self::Client { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }

    /// 세션 만료 여부 (라우팅 재분류 결과)
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }

    /// 클라이언트 에러 여부
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Client { .. }
                | Self::Configuration(_)
                | Self::TypeConversion(_)
                | Self::IllegalState(_)
                | Self::NoSuchRecord(_)
        )
    }
}

/// 재시도 가능한 클라이언트 에러 코드 확인
fn is_retryable_code(code: &str) -> bool {
    BoltErrorCode::is_failure_to_write(code)
}

/// 에러 코드의 분류 세그먼트 (`ClientError`, `TransientError`, `DatabaseError`)
fn code_classification(code: &str) -> &str {
    code_suffix(code).split('.').next().unwrap_or("")
}

impl From<FailureMessage> for DriverError {
    fn from(failure: FailureMessage) -> Self {
        match code_classification(&failure.code) {
            "ClientError" => DriverError::Client {
                code: failure.code,
                message: failure.message,
            },
            "TransientError" => DriverError::Transient {
                code: failure.code,
                message: failure.message,
            },
            _ => DriverError::Database {
                code: failure.code,
                message: failure.message,
            },
        }
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// Tests
// ============================================================================
