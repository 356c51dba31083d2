//! 결과를 버리는 핸들러와 생존 확인 핸들러

use std::collections::HashMap;

use tracing::trace;

use super::promise::{Completion, Promise};
use super::ResponseHandler;
use crate::driver::error::{DriverError, DriverResult};
use crate::driver::types::Value;

/// 모든 응답을 버리는 핸들러
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpResponseHandler;

impl ResponseHandler for NoOpResponseHandler {
    fn on_success(&self, _metadata: HashMap<String, Value>) {}

    fn on_failure(&self, _error: DriverError) {}

    fn on_record(&self, _fields: Vec<Value>) -> DriverResult<()> {
        Ok(())
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}

/// 연결 생존 확인 핸들러. 성공이면 `true`, 실패면 `false`로 완료된다.
#[derive(Debug)]
pub struct PingResponseHandler {
    alive: Promise<bool>,
}

impl PingResponseHandler {
    /// 핸들러와 결과 future 생성
    pub fn new() -> (Self, Completion<bool>) {
        let (alive, completion) = Promise::new();
        (Self { alive }, completion)
    }
}

impl ResponseHandler for PingResponseHandler {
    fn on_success(&self, _metadata: HashMap<String, Value>) {
        self.alive.complete(Ok(true));
    }

    fn on_failure(&self, error: DriverError) {
        trace!(%error, "Ping failed");
        self.alive.complete(Ok(false));
    }

    fn on_record(&self, _fields: Vec<Value>) -> DriverResult<()> {
        Ok(())
    }

    fn can_manage_auto_read(&self) -> bool {
        false
    }
}
