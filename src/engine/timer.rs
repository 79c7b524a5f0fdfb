//! Cancellable engine tasks.
//!
//! Fetches, backoff delays and watchdog ticks all run as spawned tasks that
//! report back through the event queue.  A [`TaskHandle`] aborts its task
//! when cancelled or dropped, so replacing a handle can never leave a second
//! timer running.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::{EngineEvent, Event, EventSender};

#[derive(Debug)]
pub struct TaskHandle {
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }

    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deliver `event` after `delay`, unless the handle goes away first.
pub fn after(delay: Duration, events: &EventSender, event: EngineEvent) -> TaskHandle {
    let events = events.clone();
    TaskHandle::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = events.send(Event::Engine(event));
    })
}
