//! Event dispatch: ordered, isolated fan-out to registered listeners
//!
//! Listeners are plain trait objects held behind [`ListenerId`] handles;
//! there is no polling API, `publish` is the only path by which listeners
//! observe events. Delivery is synchronous and in registration order, so a
//! slow listener stalls the scan; listeners doing expensive work should
//! hand off to their own background execution and return promptly.

use std::sync::{Arc, Mutex};

use testwire_core::prelude::*;
use testwire_core::TestEvent;

/// A registered consumer of decoded events
pub trait EventListener {
    /// Handle one event. Errors are collected by the dispatcher and never
    /// stop delivery to other listeners.
    fn on_event(&mut self, event: &TestEvent) -> Result<()>;
}

/// Lets callers register a listener they keep a shared handle to, e.g. to
/// read aggregated results after the stream ends.
impl<L: EventListener + ?Sized> EventListener for Arc<Mutex<L>> {
    fn on_event(&mut self, event: &TestEvent) -> Result<()> {
        let mut guard = self
            .lock()
            .map_err(|_| Error::listener("listener mutex poisoned"))?;
        guard.on_event(event)
    }
}

/// Handle identifying a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// One listener failure captured during a publish
#[derive(Debug)]
pub struct ListenerFailure {
    pub id: ListenerId,
    pub error: Error,
}

/// Outcome of one publish: empty when every listener succeeded
#[derive(Debug, Default)]
pub struct PublishReport {
    pub failures: Vec<ListenerFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers events to registered listeners in registration order.
///
/// One instance per stream; the listener list is the only state and is
/// never shared between streams, so no locking is needed internally.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<(ListenerId, Box<dyn EventListener>)>,
    next_id: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its handle
    pub fn register<L: EventListener + 'static>(&mut self, listener: L) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        debug!("registered listener {:?}", id);
        id
    }

    /// Remove a listener. Returns false if the handle was already gone.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver one event to every currently registered listener,
    /// synchronously and in registration order.
    ///
    /// Iterates over a snapshot of the registered handles taken at the
    /// start of the call, so the listener list cannot be corrupted by
    /// registration changes interleaved with delivery. A failing listener
    /// is reported and logged but never prevents delivery to the rest,
    /// and never poisons the dispatcher for future publishes.
    pub fn publish(&mut self, event: &TestEvent) -> PublishReport {
        let snapshot: Vec<ListenerId> = self.listeners.iter().map(|(id, _)| *id).collect();
        let mut report = PublishReport::default();

        for id in snapshot {
            let Some((_, listener)) = self.listeners.iter_mut().find(|(lid, _)| *lid == id)
            else {
                continue;
            };
            if let Err(error) = listener.on_event(event) {
                warn!("listener {:?} failed on {}: {}", id, event.kind(), error);
                report.failures.push(ListenerFailure { id, error });
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use testwire_core::EventKind;

    /// Records (listener label, event name) into a shared trace so tests
    /// can assert cross-listener ordering.
    struct Recording {
        label: &'static str,
        trace: Arc<Mutex<Vec<(String, String)>>>,
        fail_on: Option<EventKind>,
    }

    impl EventListener for Recording {
        fn on_event(&mut self, event: &TestEvent) -> Result<()> {
            self.trace
                .lock()
                .unwrap()
                .push((self.label.to_string(), event.kind().to_string()));
            if self.fail_on.as_ref() == Some(event.kind()) {
                return Err(Error::listener(format!("{} rejected event", self.label)));
            }
            Ok(())
        }
    }

    fn event(kind: EventKind) -> TestEvent {
        TestEvent::new(kind, HashMap::new())
    }

    #[test]
    fn test_fan_out_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Recording {
            label: "L1",
            trace: Arc::clone(&trace),
            fail_on: None,
        });
        dispatcher.register(Recording {
            label: "L2",
            trace: Arc::clone(&trace),
            fail_on: None,
        });

        assert!(dispatcher.publish(&event(EventKind::TestingStarted)).is_clean());
        assert!(dispatcher.publish(&event(EventKind::TestingFinished)).is_clean());

        let seen = trace.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("L1".to_string(), "testing-started".to_string()),
                ("L2".to_string(), "testing-started".to_string()),
                ("L1".to_string(), "testing-finished".to_string()),
                ("L2".to_string(), "testing-finished".to_string()),
            ]
        );
    }

    #[test]
    fn test_listener_isolation() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let l1 = dispatcher.register(Recording {
            label: "L1",
            trace: Arc::clone(&trace),
            fail_on: Some(EventKind::TestingStarted),
        });
        dispatcher.register(Recording {
            label: "L2",
            trace: Arc::clone(&trace),
            fail_on: None,
        });

        // L1 fails on E1: L2 must still receive E1
        let report = dispatcher.publish(&event(EventKind::TestingStarted));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, l1);
        assert!(matches!(
            report.failures[0].error,
            Error::Listener { .. }
        ));

        // The dispatcher is not poisoned: both listeners receive E2
        assert!(dispatcher.publish(&event(EventKind::TestingFinished)).is_clean());

        let seen = trace.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1].0, "L2");
        assert_eq!(seen[1].1, "testing-started");
    }

    #[test]
    fn test_unregister() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        let l1 = dispatcher.register(Recording {
            label: "L1",
            trace: Arc::clone(&trace),
            fail_on: None,
        });
        assert_eq!(dispatcher.len(), 1);

        assert!(dispatcher.unregister(l1));
        assert!(!dispatcher.unregister(l1));
        assert!(dispatcher.is_empty());

        dispatcher.publish(&event(EventKind::TestingStarted));
        assert!(trace.lock().unwrap().is_empty());
    }

    #[test]
    fn test_shared_handle_listener() {
        struct Counter {
            events: usize,
        }
        impl EventListener for Counter {
            fn on_event(&mut self, _event: &TestEvent) -> Result<()> {
                self.events += 1;
                Ok(())
            }
        }

        let counter = Arc::new(Mutex::new(Counter { events: 0 }));
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Arc::clone(&counter));

        dispatcher.publish(&event(EventKind::TestStarted));
        dispatcher.publish(&event(EventKind::TestFinished));

        assert_eq!(counter.lock().unwrap().events, 2);
    }
}
