use crate::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// Progress notifications emitted while a demo runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    RunStarted {
        run: String,
        input: String,
    },
    NodeStarted {
        graph: String,
        node: String,
        step: usize,
    },
    NodeCompleted {
        graph: String,
        node: String,
        step: usize,
    },
    NodeFailed {
        graph: String,
        node: String,
        error: String,
    },
    AgentMessage {
        agent: String,
        content: String,
    },
    ToolCallStarted {
        agent: String,
        call: ToolCall,
    },
    ToolCallCompleted {
        agent: String,
        call: ToolCall,
        result: ToolResult,
    },
    TaskCompleted {
        task: String,
        agent: String,
        output: String,
    },
    RunCompleted {
        run: String,
        summary: String,
    },
    RunFailed {
        run: String,
        error: String,
    },
}

/// Fan-out of orchestration events to any number of observers.
///
/// Publishing never blocks and never fails; events sent with no live
/// subscriber are dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<OrchestrationEvent>,
    delivery: Arc<Delivery>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            delivery: Arc::new(Delivery::default()),
        }
    }

    pub fn publish(&self, event: OrchestrationEvent) {
        self.delivery.published.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.sender.subscribe()
    }

    /// Block until the attached monitor has handled everything published so
    /// far, or `timeout` passes. Returns `false` on timeout.
    ///
    /// Without a monitor this returns `true` at once.
    pub fn wait_until_observed(&self, timeout: Duration) -> bool {
        self.delivery.wait(timeout)
    }

    pub(crate) fn delivery(&self) -> Arc<Delivery> {
        self.delivery.clone()
    }
}

/// Published and handled counts shared between the bus and its monitor.
#[derive(Default)]
pub(crate) struct Delivery {
    monitored: AtomicBool,
    published: AtomicU64,
    handled: Mutex<u64>,
    caught_up: Condvar,
}

impl Delivery {
    /// Start counting from the current publish count.
    pub(crate) fn attach(&self) {
        let mut handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        *handled = self.published.load(Ordering::SeqCst);
        self.monitored.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_handled(&self, count: u64) {
        let mut handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        *handled += count;
        self.caught_up.notify_all();
    }

    fn wait(&self, timeout: Duration) -> bool {
        if !self.monitored.load(Ordering::SeqCst) {
            return true;
        }
        let target = self.published.load(Ordering::SeqCst);
        let handled = self.handled.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, result) = self
            .caught_up
            .wait_timeout_while(handled, timeout, |handled| *handled < target)
            .unwrap_or_else(|e| e.into_inner());
        !result.timed_out()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(OrchestrationEvent::AgentMessage {
            agent: "Planner".into(),
            content: "outline".into(),
        });

        match rx.recv().await.unwrap() {
            OrchestrationEvent::AgentMessage { agent, .. } => assert_eq!(agent, "Planner"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(OrchestrationEvent::RunStarted {
            run: "crew".into(),
            input: String::new(),
        });
    }

    #[test]
    fn test_wait_without_monitor_returns_at_once() {
        let bus = EventBus::new(4);
        bus.publish(OrchestrationEvent::RunStarted {
            run: "crew".into(),
            input: String::new(),
        });
        assert!(bus.wait_until_observed(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_times_out_until_monitor_catches_up() {
        let bus = EventBus::new(4);
        let delivery = bus.delivery();
        delivery.attach();

        bus.publish(OrchestrationEvent::RunStarted {
            run: "crew".into(),
            input: String::new(),
        });
        assert!(!bus.wait_until_observed(Duration::from_millis(10)));

        delivery.mark_handled(1);
        assert!(bus.wait_until_observed(Duration::from_millis(10)));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = OrchestrationEvent::NodeCompleted {
            graph: "email_template".into(),
            node: "trigger".into(),
            step: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node_completed");
        assert_eq!(json["node"], "trigger");
    }
}
