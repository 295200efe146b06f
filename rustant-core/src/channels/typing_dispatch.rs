//! Reply dispatch with typing-indicator orchestration.
//!
//! Generalizes `reply_dispatch::ChannelReplyDispatcher` with the start-once
//! typing contract: a typing indicator starts at most once per dispatch
//! cycle, start failures never abort delivery, payloads are delivered
//! strictly sequentially, and `mark_idle` always runs (success or failure)
//! so the next inbound message can start a fresh cycle.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RustantError;

/// One unit of agent output ready to go out: a text chunk, a reasoning
/// trace, or a terminal payload. The dispatcher treats every variant the
/// same way — sequential delivery through `deliver` — the distinction only
/// matters to the caller assembling the stream.
#[derive(Debug, Clone)]
pub struct DispatchPayload {
    pub text: String,
    pub is_final: bool,
}

/// Callbacks the host wires in around the typing indicator's lifecycle.
pub trait TypingCallbacks: Send + Sync {
    /// Invoked once, the first time a dispatch cycle needs to show typing.
    fn on_start(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>>;
    /// Invoked when the dispatch cycle ends (success or failure).
    fn on_stop(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
    /// Invoked if `on_start` returned an error; must not abort delivery.
    fn on_start_error(&self, _error: &str) {}
}

/// Delivers one payload to the underlying channel. Implementations chunk
/// text, map Markdown tables, and send media as needed — this trait only
/// fixes the sequencing contract, not the formatting.
#[async_trait::async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, payload: &DispatchPayload) -> Result<(), RustantError>;
}

/// Error routed to `on_error` when `deliver` fails mid-dispatch.
pub type DispatchError = RustantError;

/// Created by `create_reply_dispatcher_with_typing`; owns the per-cycle
/// "has typing started yet" flag so a burst of payloads only triggers one
/// `on_start` call.
pub struct ReplyDispatcherWithTyping<T: TypingCallbacks, D: Deliver> {
    typing: Arc<T>,
    deliver: Arc<D>,
    typing_started: AtomicBool,
    dispatch_active: AtomicBool,
}

impl<T: TypingCallbacks, D: Deliver> ReplyDispatcherWithTyping<T, D> {
    pub fn new(typing: Arc<T>, deliver: Arc<D>) -> Self {
        Self {
            typing,
            deliver,
            typing_started: AtomicBool::new(false),
            dispatch_active: AtomicBool::new(false),
        }
    }

    /// Whether a dispatch cycle is currently in flight. `dispatch` enforces
    /// this at runtime: a concurrent call while one is active is a caller bug.
    pub fn is_dispatching(&self) -> bool {
        self.dispatch_active.load(Ordering::SeqCst)
    }

    /// Ensure the typing indicator has started for this cycle (idempotent:
    /// only the first call in a cycle actually invokes `on_start`).
    async fn ensure_typing_started(&self) {
        if self
            .typing_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            if let Err(e) = self.typing.on_start().await {
                tracing::warn!(error = %e, "typing indicator failed to start, continuing dispatch");
                self.typing.on_start_error(&e);
            }
        }
    }

    /// Run one dispatch cycle over `payloads`, delivering each sequentially.
    /// Returns the first delivery error, if any, after having attempted to
    /// deliver every payload up to that point — it does not abort the whole
    /// cycle, matching the "deliver is invoked sequentially, never
    /// concurrently" guarantee without silently dropping later payloads.
    pub async fn dispatch(&self, payloads: &[DispatchPayload]) -> Result<(), DispatchError> {
        assert!(
            !self.dispatch_active.swap(true, Ordering::SeqCst),
            "concurrent dispatch on the same ReplyDispatcherWithTyping"
        );

        let mut first_error = None;
        for payload in payloads {
            self.ensure_typing_started().await;
            if let Err(e) = self.deliver.deliver(payload).await {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        self.mark_dispatch_idle().await;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Must be called after a dispatch cycle completes (success or failure)
    /// so typing can stop and the next inbound message can start a fresh
    /// cycle. `dispatch` calls this itself; exposed separately so a caller
    /// streaming payloads one at a time outside of `dispatch` can still
    /// close out the cycle.
    pub async fn mark_dispatch_idle(&self) {
        self.typing.on_stop().await;
        self.typing_started.store(false, Ordering::SeqCst);
        self.dispatch_active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingTyping {
        start_calls: AtomicBool,
        start_count: Mutex<u32>,
        stop_count: Mutex<u32>,
        fail_start: bool,
        last_error: Mutex<Option<String>>,
    }

    impl TypingCallbacks for RecordingTyping {
        fn on_start(&self) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + '_>> {
            Box::pin(async move {
                *self.start_count.lock().unwrap() += 1;
                self.start_calls.store(true, Ordering::SeqCst);
                if self.fail_start {
                    Err("start failed".to_string())
                } else {
                    Ok(())
                }
            })
        }

        fn on_stop(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            Box::pin(async move {
                *self.stop_count.lock().unwrap() += 1;
            })
        }

        fn on_start_error(&self, error: &str) {
            *self.last_error.lock().unwrap() = Some(error.to_string());
        }
    }

    struct RecordingDeliver {
        delivered: AsyncMutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait::async_trait]
    impl Deliver for RecordingDeliver {
        async fn deliver(&self, payload: &DispatchPayload) -> Result<(), RustantError> {
            if self.fail_on.as_deref() == Some(payload.text.as_str()) {
                return Err(RustantError::Channel(crate::error::ChannelError::SendFailed {
                    name: "test".into(),
                    message: "boom".into(),
                }));
            }
            self.delivered.lock().await.push(payload.text.clone());
            Ok(())
        }
    }

    fn payload(text: &str, is_final: bool) -> DispatchPayload {
        DispatchPayload {
            text: text.to_string(),
            is_final,
        }
    }

    #[tokio::test]
    async fn test_typing_starts_once_for_multiple_payloads() {
        let typing = Arc::new(RecordingTyping::default());
        let deliver = Arc::new(RecordingDeliver {
            delivered: AsyncMutex::new(Vec::new()),
            fail_on: None,
        });
        let dispatcher = ReplyDispatcherWithTyping::new(typing.clone(), deliver.clone());

        let payloads = vec![payload("chunk 1", false), payload("chunk 2", false), payload("done", true)];
        dispatcher.dispatch(&payloads).await.unwrap();

        assert_eq!(*typing.start_count.lock().unwrap(), 1);
        assert_eq!(*typing.stop_count.lock().unwrap(), 1);
        assert_eq!(deliver.delivered.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_sequential_delivery_preserves_order() {
        let typing = Arc::new(RecordingTyping::default());
        let deliver = Arc::new(RecordingDeliver {
            delivered: AsyncMutex::new(Vec::new()),
            fail_on: None,
        });
        let dispatcher = ReplyDispatcherWithTyping::new(typing, deliver.clone());

        let payloads = vec![payload("a", false), payload("b", false), payload("c", true)];
        dispatcher.dispatch(&payloads).await.unwrap();

        assert_eq!(*deliver.delivered.lock().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_typing_start_error_does_not_abort_delivery() {
        let typing = Arc::new(RecordingTyping {
            fail_start: true,
            ..Default::default()
        });
        let deliver = Arc::new(RecordingDeliver {
            delivered: AsyncMutex::new(Vec::new()),
            fail_on: None,
        });
        let dispatcher = ReplyDispatcherWithTyping::new(typing.clone(), deliver.clone());

        let payloads = vec![payload("still goes out", true)];
        let result = dispatcher.dispatch(&payloads).await;

        assert!(result.is_ok());
        assert_eq!(deliver.delivered.lock().await.len(), 1);
        assert_eq!(typing.last_error.lock().unwrap().as_deref(), Some("start failed"));
    }

    #[tokio::test]
    async fn test_mark_idle_always_runs_after_delivery_error() {
        let typing = Arc::new(RecordingTyping::default());
        let deliver = Arc::new(RecordingDeliver {
            delivered: AsyncMutex::new(Vec::new()),
            fail_on: Some("bad".to_string()),
        });
        let dispatcher = ReplyDispatcherWithTyping::new(typing.clone(), deliver.clone());

        let payloads = vec![payload("bad", false), payload("after", true)];
        let result = dispatcher.dispatch(&payloads).await;

        assert!(result.is_err());
        // Delivery continues past the failing payload...
        assert_eq!(*deliver.delivered.lock().await, vec!["after"]);
        // ...and the cycle still closes out so the next message can dispatch.
        assert_eq!(*typing.stop_count.lock().unwrap(), 1);
        assert!(!dispatcher.is_dispatching());
    }

    #[tokio::test]
    async fn test_second_cycle_restarts_typing() {
        let typing = Arc::new(RecordingTyping::default());
        let deliver = Arc::new(RecordingDeliver {
            delivered: AsyncMutex::new(Vec::new()),
            fail_on: None,
        });
        let dispatcher = ReplyDispatcherWithTyping::new(typing.clone(), deliver.clone());

        dispatcher.dispatch(&[payload("first", true)]).await.unwrap();
        dispatcher.dispatch(&[payload("second", true)]).await.unwrap();

        assert_eq!(*typing.start_count.lock().unwrap(), 2);
        assert_eq!(*typing.stop_count.lock().unwrap(), 2);
    }
}
