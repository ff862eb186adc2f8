use crate::events::{EventBus, OrchestrationEvent};
use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

pub type HookFn = Arc<dyn Fn(&OrchestrationEvent) -> bool + Send + Sync>;

pub struct HookManager {
    event_bus: Arc<EventBus>,
    hooks: Vec<HookFn>,
}

impl HookManager {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            hooks: Vec::new(),
        }
    }

    pub fn add_hook<F>(&mut self, hook: F)
    where
        F: Fn(&OrchestrationEvent) -> bool + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    pub fn add(&mut self, hook: HookFn) {
        self.hooks.push(hook);
    }

    /// Run hooks on a dedicated thread until every publisher is dropped.
    /// Attach at most one monitor per bus.
    ///
    /// Hooks may block (the animated transcript sleeps between characters),
    /// so they stay off the async runtime.
    pub fn start_monitoring(&self) -> JoinHandle<()> {
        let mut receiver = self.event_bus.subscribe();
        let delivery = self.event_bus.delivery();
        delivery.attach();
        let hooks = self.hooks.clone();

        std::thread::spawn(move || loop {
            match receiver.blocking_recv() {
                Ok(event) => {
                    for hook in &hooks {
                        // false stops the chain for this event
                        if !hook(&event) {
                            break;
                        }
                    }
                    delivery.mark_handled(1);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event monitor lagged behind");
                    delivery.mark_handled(skipped);
                }
                Err(RecvError::Closed) => break,
            }
        })
    }

    pub fn tracing_hook() -> HookFn {
        Arc::new(|event| {
            match event {
                OrchestrationEvent::RunStarted { run, .. } => {
                    tracing::info!(run = %run, "run started");
                }
                OrchestrationEvent::NodeStarted { graph, node, step } => {
                    tracing::debug!(graph = %graph, node = %node, step, "node started");
                }
                OrchestrationEvent::NodeCompleted { graph, node, step } => {
                    tracing::info!(graph = %graph, node = %node, step, "node completed");
                }
                OrchestrationEvent::NodeFailed { graph, node, error } => {
                    tracing::error!(graph = %graph, node = %node, error = %error, "node failed");
                }
                OrchestrationEvent::ToolCallStarted { agent, call } => {
                    tracing::info!(agent = %agent, tool = %call.name, "tool call started");
                }
                OrchestrationEvent::ToolCallCompleted { agent, call, result } => {
                    tracing::info!(agent = %agent, tool = %call.name, success = result.success, "tool call completed");
                }
                OrchestrationEvent::TaskCompleted { task, agent, .. } => {
                    tracing::info!(agent = %agent, task = %task, "task completed");
                }
                OrchestrationEvent::RunCompleted { run, .. } => {
                    tracing::info!(run = %run, "run completed");
                }
                OrchestrationEvent::RunFailed { run, error } => {
                    tracing::error!(run = %run, error = %error, "run failed");
                }
                OrchestrationEvent::AgentMessage { .. } => {}
            }
            true
        })
    }

    /// Prints agent turns to stdout, optionally one character at a time.
    pub fn transcript_hook(animate: Option<Duration>) -> HookFn {
        Arc::new(move |event| {
            match event {
                OrchestrationEvent::AgentMessage { agent, content } => {
                    let text = format!("\n[{}]:\n{}\n", agent, content);
                    print_text(&text, animate);
                    println!("{}", "-".repeat(80));
                }
                OrchestrationEvent::TaskCompleted { agent, output, .. } => {
                    println!("\n# Agent: {}\n## Final Answer:\n{}\n", agent, output);
                }
                _ => {}
            }
            true
        })
    }
}

/// Write text to stdout, sleeping `delay` after each character when set.
pub fn print_text(text: &str, delay: Option<Duration>) {
    let mut stdout = std::io::stdout().lock();
    match delay {
        Some(delay) => {
            for ch in text.chars() {
                let _ = write!(stdout, "{}", ch);
                let _ = stdout.flush();
                std::thread::sleep(delay);
            }
        }
        None => {
            let _ = write!(stdout, "{}", text);
        }
    }
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_hooks_run_until_bus_dropped() {
        let bus = Arc::new(EventBus::new(16));
        let seen = Arc::new(AtomicUsize::new(0));

        let mut manager = HookManager::new(bus.clone());
        let counter = seen.clone();
        manager.add_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let handle = manager.start_monitoring();
        drop(manager);

        bus.publish(OrchestrationEvent::RunStarted {
            run: "demo".into(),
            input: "task".into(),
        });
        bus.publish(OrchestrationEvent::RunCompleted {
            run: "demo".into(),
            summary: String::new(),
        });
        drop(bus);

        handle.join().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_wait_returns_after_hooks_finish() {
        let bus = Arc::new(EventBus::new(16));
        let seen = Arc::new(AtomicUsize::new(0));

        let mut manager = HookManager::new(bus.clone());
        let counter = seen.clone();
        manager.add_hook(move |_| {
            std::thread::sleep(Duration::from_millis(20));
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let handle = manager.start_monitoring();
        drop(manager);

        for _ in 0..3 {
            bus.publish(OrchestrationEvent::RunStarted {
                run: "demo".into(),
                input: String::new(),
            });
        }
        assert!(bus.wait_until_observed(Duration::from_secs(5)));
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        drop(bus);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_false_stops_hook_chain() {
        let bus = Arc::new(EventBus::new(16));
        let second = Arc::new(AtomicUsize::new(0));

        let mut manager = HookManager::new(bus.clone());
        manager.add_hook(|_| false);
        let counter = second.clone();
        manager.add_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let handle = manager.start_monitoring();
        drop(manager);

        bus.publish(OrchestrationEvent::RunStarted {
            run: "demo".into(),
            input: String::new(),
        });
        drop(bus);

        handle.join().unwrap();
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }
}
