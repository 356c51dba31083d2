//! 응답 핸들러가 쓰는 일회성 완료 셀
//!
//! [`PendingSlot`]은 PULL_ALL 핸들러의 레코드/실패 대기 퓨처를 만든다. 같은
//! 슬롯을 기다리는 호출자들은 [`futures::future::Shared`]로 하나의 완료를
//! 나눠 받는다. [`Promise`]는 수명주기 요청 호출자에게 주는 단발성 버전이다.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{FutureExt, Shared, WeakShared};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::driver::error::{DriverError, DriverResult};

/// [`PendingSlot`]의 수신 쪽
pub(crate) type Waiter<T> = Shared<oneshot::Receiver<T>>;

/// 대기 퓨처를 기다린다. 송신 쪽이 사라졌으면 `dropped`의 값을 반환한다.
pub(crate) async fn wait<T: Clone>(waiter: Waiter<T>, dropped: impl FnOnce() -> T) -> T {
    waiter.await.unwrap_or_else(|_| dropped())
}

/// 최대 하나의 대기 중인 완료
///
/// 슬롯은 대기 퓨처를 약하게만 참조한다. 모든 대기자가 퓨처를 버리면 슬롯은
/// 무장 해제된 것으로 보고, `complete`는 값을 받을 곳이 없다고 알린다.
pub(crate) struct PendingSlot<T: Clone> {
    pending: Option<(oneshot::Sender<T>, WeakShared<oneshot::Receiver<T>>)>,
}

impl<T: Clone> PendingSlot<T> {
    pub(crate) fn new() -> Self {
        Self { pending: None }
    }

    /// 살아 있는 대기자가 있는지
    pub(crate) fn is_armed(&self) -> bool {
        self.live_waiter().is_some()
    }

    /// 대기 퓨처를 내준다. 살아 있는 대기자가 있으면 같은 완료를 공유한다.
    pub(crate) fn arm(&mut self) -> Waiter<T> {
        if let Some(waiter) = self.live_waiter() {
            return waiter;
        }
        let (sender, receiver) = oneshot::channel();
        let waiter = receiver.shared();
        self.pending = waiter.downgrade().map(|weak| (sender, weak));
        waiter
    }

    /// 슬롯을 완료하고 비운다. 값을 받은 대기자가 없으면 `false`.
    pub(crate) fn complete(&mut self, value: T) -> bool {
        match self.pending.take() {
            // 대기자가 모두 퓨처를 버렸으면 수신 쪽도 이미 닫혀 있다
            Some((sender, _)) => sender.send(value).is_ok(),
            None => false,
        }
    }

    fn live_waiter(&self) -> Option<Waiter<T>> {
        self.pending.as_ref().and_then(|(_, weak)| weak.upgrade())
    }
}

impl<T: Clone> Default for PendingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Promise / Completion
// ============================================================================

/// 단발성 결과의 완료 쪽
#[derive(Debug)]
pub struct Promise<T> {
    sender: Mutex<Option<oneshot::Sender<DriverResult<T>>>>,
}

impl<T> Promise<T> {
    /// 프라미스와 그 결과를 기다리는 퓨처 생성
    pub fn new() -> (Self, Completion<T>) {
        let (sender, receiver) = oneshot::channel();
        let promise = Self {
            sender: Mutex::new(Some(sender)),
        };
        (promise, Completion { receiver })
    }

    /// 프라미스 완료. 두 번째 완료부터는 무시되며, 이번 호출이 완료시켰는지 반환한다.
    pub fn complete(&self, result: DriverResult<T>) -> bool {
        match self.sender.lock().take() {
            Some(sender) => {
                // Completion이 버려졌으면 기다리는 쪽이 없다
                let _ = sender.send(result);
                true
            }
            None => false,
        }
    }

    /// 완료 여부
    pub fn is_completed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

/// [`Promise::complete`]에 전달된 값으로 완료되는 퓨처
#[derive(Debug)]
pub struct Completion<T> {
    receiver: oneshot::Receiver<DriverResult<T>>,
}

impl<T> Future for Completion<T> {
    type Output = DriverResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(DriverError::illegal_state(
                "Response handler was dropped before the request completed",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
