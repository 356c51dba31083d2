//! 라우팅 인지 에러 재분류 데코레이터
//!
//! 클러스터 멤버에서 받은 실패를 감싼 핸들러에 넘기기 전에 한 번 재분류하고,
//! 필요하면 라우팅 계층에 장애를 알린다.
//!
//! | 받은 에러 | 조건 | 전달되는 에러 | 라우팅 알림 |
//! |---|---|---|---|
//! | ServiceUnavailable | 항상 | SessionExpired | 연결 장애 |
//! | Client, NotALeader / ForbiddenOnReadOnlyDatabase | WRITE | SessionExpired | 쓰기 장애 |
//! | 같은 코드 | READ | Client (READ 모드 쓰기 불가) | 없음 |
//! | Transient, DatabaseUnavailable | 항상 | 그대로 | 연결 장애 |
//! | 그 외 | | 그대로 | 없음 |

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::ResponseHandler;
use crate::bolt::BoltErrorCode;
use crate::driver::config::ServerAddress;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::routing::RoutingErrorHandler;
use crate::driver::session::AccessMode;
use crate::driver::types::Value;

/// 라우팅 인지 응답 핸들러
pub struct RoutingResponseHandler {
    delegate: Arc<dyn ResponseHandler>,
    address: ServerAddress,
    access_mode: AccessMode,
    error_handler: Arc<dyn RoutingErrorHandler>,
}

impl RoutingResponseHandler {
    /// `delegate`를 감싼다
    pub fn new(
        delegate: Arc<dyn ResponseHandler>,
        address: ServerAddress,
        access_mode: AccessMode,
        error_handler: Arc<dyn RoutingErrorHandler>,
    ) -> Self {
        Self {
            delegate,
            address,
            access_mode,
            error_handler,
        }
    }

    fn classify(&self, error: DriverError) -> DriverError {
        match error {
            DriverError::ServiceUnavailable(_) => {
                self.error_handler.on_connection_failure(&self.address);
                DriverError::session_expired(format!(
                    "Server at {} is no longer available",
                    self.address
                ))
            }
            DriverError::Client { code, message } if BoltErrorCode::is_failure_to_write(&code) => {
                match self.access_mode {
                    AccessMode::Read => DriverError::client(
                        code,
                        "Write queries cannot be performed in READ access mode.",
                    ),
                    AccessMode::Write => {
                        debug!(address = %self.address, %code, %message, "Write refused by cluster member");
                        self.error_handler.on_write_failure(&self.address);
                        DriverError::session_expired(format!(
                            "Server at {} no longer accepts writes",
                            self.address
                        ))
                    }
                }
            }
            DriverError::Transient { code, message } if BoltErrorCode::is_database_unavailable(&code) => {
                self.error_handler.on_connection_failure(&self.address);
                DriverError::Transient { code, message }
            }
            other => other,
        }
    }
}

impl ResponseHandler for RoutingResponseHandler {
    fn on_success(&self, metadata: HashMap<String, Value>) {
        self.delegate.on_success(metadata);
    }

    fn on_failure(&self, error: DriverError) {
        let error = self.classify(error);
        self.delegate.on_failure(error);
    }

    fn on_record(&self, fields: Vec<Value>) -> DriverResult<()> {
        self.delegate.on_record(fields)
    }

    fn can_manage_auto_read(&self) -> bool {
        self.delegate.can_manage_auto_read()
    }

    fn disable_auto_read_management(&self) {
        self.delegate.disable_auto_read_management();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::mock::{HandlerEvent, MockRoutingErrorHandler, RecordingHandler, RoutingEvent};

    fn address() -> ServerAddress {
        ServerAddress::new("core-2", 7687)
    }

    fn routed(
        access_mode: AccessMode,
    ) -> (RoutingResponseHandler, Arc<RecordingHandler>, Arc<MockRoutingErrorHandler>) {
        let delegate = RecordingHandler::new();
        let routing = Arc::new(MockRoutingErrorHandler::default());
        let handler = RoutingResponseHandler::new(delegate.clone(), address(), access_mode, routing.clone());
        (handler, delegate, routing)
    }

    fn delivered_failure(delegate: &RecordingHandler) -> DriverError {
        match delegate.events().as_slice() {
            [HandlerEvent::Failure(error)] => error.clone(),
            events => panic!("expected a single failure, got {:?}", events),
        }
    }

    #[test]
    fn test_service_unavailable_becomes_session_expired() {
        let (handler, delegate, routing) = routed(AccessMode::Read);

        handler.on_failure(DriverError::service_unavailable("connection reset"));

        assert_eq!(
            delivered_failure(&delegate),
            DriverError::session_expired("Server at core-2:7687 is no longer available")
        );
        assert_eq!(routing.events(), vec![RoutingEvent::ConnectionFailure(address())]);
    }

    #[test]
    fn test_not_a_leader_in_write_mode_expires_session() {
        let (handler, delegate, routing) = routed(AccessMode::Write);

        handler.on_failure(DriverError::client(BoltErrorCode::NOT_A_LEADER, "not the leader"));

        let error = delivered_failure(&delegate);
        assert!(error.is_session_expired());
        assert_eq!(
            error,
            DriverError::session_expired("Server at core-2:7687 no longer accepts writes")
        );
        assert_eq!(routing.events(), vec![RoutingEvent::WriteFailure(address())]);
    }

    #[test]
    fn test_forbidden_on_read_only_with_alternate_prefix() {
        let (handler, delegate, routing) = routed(AccessMode::Write);

        handler.on_failure(DriverError::client(
            "Cypher.ClientError.General.ForbiddenOnReadOnlyDatabase",
            "read only",
        ));

        assert!(delivered_failure(&delegate).is_session_expired());
        assert_eq!(routing.events(), vec![RoutingEvent::WriteFailure(address())]);
    }

    #[test]
    fn test_write_refusal_in_read_mode_is_client_error() {
        let (handler, delegate, routing) = routed(AccessMode::Read);

        handler.on_failure(DriverError::client(BoltErrorCode::NOT_A_LEADER, "not the leader"));

        assert_eq!(
            delivered_failure(&delegate),
            DriverError::client(
                BoltErrorCode::NOT_A_LEADER,
                "Write queries cannot be performed in READ access mode."
            )
        );
        assert!(routing.events().is_empty());
    }

    #[test]
    fn test_database_unavailable_passes_through_and_notifies() {
        let (handler, delegate, routing) = routed(AccessMode::Read);
        let error = DriverError::transient(BoltErrorCode::DATABASE_UNAVAILABLE, "database is down");

        handler.on_failure(error.clone());

        assert_eq!(delivered_failure(&delegate), error);
        assert_eq!(routing.events(), vec![RoutingEvent::ConnectionFailure(address())]);
    }

    #[test]
    fn test_other_errors_pass_through() {
        let (handler, delegate, routing) = routed(AccessMode::Write);
        let error = DriverError::client(BoltErrorCode::SYNTAX_ERROR, "bad query");

        handler.on_failure(error.clone());

        assert_eq!(delivered_failure(&delegate), error);
        assert!(routing.events().is_empty());
    }

    #[test]
    fn test_success_and_records_are_forwarded() {
        let (handler, delegate, routing) = routed(AccessMode::Read);

        handler.on_record(vec![Value::Integer(1)]).unwrap();
        handler.on_success(HashMap::new());

        assert_eq!(
            delegate.events(),
            vec![
                HandlerEvent::Record(vec![Value::Integer(1)]),
                HandlerEvent::Success(HashMap::new()),
            ]
        );
        assert!(routing.events().is_empty());
    }

    #[test]
    fn test_auto_read_management_is_delegated() {
        let (handler, delegate, _routing) = routed(AccessMode::Read);

        assert!(handler.can_manage_auto_read());
        handler.disable_auto_read_management();
        assert!(delegate.auto_read_management_disabled());
    }
}
