//! Fault notification chain and the process panic hook that drives it.
//!
//! # Design
//! - Handlers run highest priority first; equal priorities keep registration order.
//! - The handler list is cloned out of the lock before dispatch so handlers may
//!   register or unregister without deadlocking.
//! - A poisoned lock is recovered: the chain must still run while panicking.

use std::fmt;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Details of a fatal fault handed to every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultEvent {
    /// Human-readable fault description.
    pub message: String,
    /// Source location (`file:line:column`) when known.
    pub location: Option<String>,
    /// Name of the faulting thread when known.
    pub thread: Option<String>,
}

impl FaultEvent {
    /// Build an event with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            thread: None,
        }
    }

    fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self {
            message,
            location: info.location().map(|location| {
                format!(
                    "{}:{}:{}",
                    location.file(),
                    location.line(),
                    location.column()
                )
            }),
            thread: std::thread::current().name().map(str::to_string),
        }
    }
}

/// Whether the chain should keep calling lower-priority handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    /// Continue with the next handler.
    Continue,
    /// Stop the chain after this handler.
    Stop,
}

/// Identifier returned by [`FaultNotifier::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&FaultEvent) -> NotifyAction + Send + Sync>;

struct Registered {
    id: HandlerId,
    priority: i32,
    handler: Handler,
}

#[derive(Default)]
struct Chain {
    next_id: u64,
    handlers: Vec<Registered>,
}

/// Priority-ordered chain of fault handlers shared across threads.
#[derive(Clone, Default)]
pub struct FaultNotifier {
    chain: Arc<Mutex<Chain>>,
}

impl fmt::Debug for FaultNotifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FaultNotifier")
            .field("handlers", &self.len())
            .finish()
    }
}

impl FaultNotifier {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `handler` at `priority`.
    pub fn register<F>(&self, priority: i32, handler: F) -> HandlerId
    where
        F: Fn(&FaultEvent) -> NotifyAction + Send + Sync + 'static,
    {
        let mut chain = self.lock();
        let id = HandlerId(chain.next_id);
        chain.next_id += 1;
        let position = chain
            .handlers
            .iter()
            .position(|registered| registered.priority < priority)
            .unwrap_or(chain.handlers.len());
        chain.handlers.insert(
            position,
            Registered {
                id,
                priority,
                handler: Arc::new(handler),
            },
        );
        debug!(handler = id.0, priority, "registered fault handler");
        id
    }

    /// Remove a handler. Returns `false` when it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut chain = self.lock();
        let before = chain.handlers.len();
        chain.handlers.retain(|registered| registered.id != id);
        let removed = chain.handlers.len() != before;
        if removed {
            debug!(handler = id.0, "unregistered fault handler");
        }
        removed
    }

    /// Call handlers in priority order until one asks to stop.
    ///
    /// Returns how many handlers ran.
    pub fn notify(&self, event: &FaultEvent) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .handlers
            .iter()
            .map(|registered| Arc::clone(&registered.handler))
            .collect();
        let mut called = 0;
        for handler in handlers {
            called += 1;
            if handler(event) == NotifyAction::Stop {
                break;
            }
        }
        called
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Route process panics through `notifier`, then through the previous hook.
pub fn install_panic_hook(notifier: FaultNotifier) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let event = FaultEvent::from_panic(info);
        notifier.notify(&event);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
    ) -> impl Fn(&FaultEvent) -> NotifyAction + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_event: &FaultEvent| {
            log.lock().unwrap_or_else(PoisonError::into_inner).push(name);
            NotifyAction::Continue
        }
    }

    #[test]
    fn handlers_run_by_descending_priority() {
        let notifier = FaultNotifier::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        notifier.register(0, recorder(&order, "low"));
        notifier.register(10, recorder(&order, "high"));
        notifier.register(1, recorder(&order, "mid-a"));
        notifier.register(1, recorder(&order, "mid-b"));

        assert_eq!(notifier.notify(&FaultEvent::new("oops")), 4);
        let order = order.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(order, vec!["high", "mid-a", "mid-b", "low"]);
    }

    #[test]
    fn stop_action_short_circuits_chain() {
        let notifier = FaultNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        notifier.register(5, |_event| NotifyAction::Stop);
        notifier.register(1, move |_event| {
            counted.fetch_add(1, Ordering::SeqCst);
            NotifyAction::Continue
        });

        assert_eq!(notifier.notify(&FaultEvent::new("oops")), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_removes_handler_once() {
        let notifier = FaultNotifier::new();
        let id = notifier.register(1, |_event| NotifyAction::Continue);
        assert_eq!(notifier.len(), 1);
        assert!(notifier.unregister(id));
        assert!(!notifier.unregister(id));
        assert!(notifier.is_empty());
        assert_eq!(notifier.notify(&FaultEvent::new("oops")), 0);
    }

    #[test]
    fn handlers_receive_event_details() {
        let notifier = FaultNotifier::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        notifier.register(1, move |event| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(event.clone());
            NotifyAction::Continue
        });
        let event = FaultEvent {
            message: "kernel BUG".into(),
            location: Some("src/main.rs:1:1".into()),
            thread: Some("main".into()),
        };
        notifier.notify(&event);
        assert_eq!(
            seen.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            Some(event)
        );
    }
}
