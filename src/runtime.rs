//! UI task queue
//!
//! Background work never touches widgets. It posts a `UiTask` through a
//! `UiHandle`, and the loop thread applies queued tasks when the session
//! pumps its `EventLoop`. Window resizes go through the same loop so they can
//! be throttled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::api::ApiResponse;
use crate::application::AppState;
use crate::interpreter::actions;
use crate::toolkit::{MessageKind, ResizeThrottle};

const IDLE_POLL: Duration = Duration::from_millis(10);

/// Work item executed on the loop thread
#[derive(Debug, Clone)]
pub enum UiTask {
    ApiCompleted {
        api: String,
        target: Option<String>,
        response: ApiResponse,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Message {
        kind: MessageKind,
        title: String,
        body: String,
    },
}

/* ===================== Handle ===================== */

/// Cloneable sender side of the queue
#[derive(Debug, Clone)]
pub struct UiHandle {
    sender: UnboundedSender<UiTask>,
    pending: Arc<AtomicUsize>,
}

impl UiHandle {
    /// Queue a task; dropped silently once the loop is gone
    pub fn post(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            debug!("ui loop closed, task dropped");
        }
    }

    /// Track one in-flight background job until it completes or is dropped
    pub fn begin_job(&self) -> Job {
        self.pending.fetch_add(1, Ordering::SeqCst);
        Job { ui: self.clone() }
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// In-flight job marker; the pending count drops with it
#[derive(Debug)]
pub struct Job {
    ui: UiHandle,
}

impl Job {
    pub fn complete(self, task: UiTask) {
        self.ui.post(task);
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        self.ui.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/* ===================== Event Loop ===================== */

pub fn ui_channel(resize_debounce: Duration) -> (UiHandle, EventLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    let handle = UiHandle {
        sender,
        pending: Arc::clone(&pending),
    };
    let events = EventLoop {
        receiver,
        pending,
        throttle: ResizeThrottle::new(resize_debounce),
        deferred_resize: None,
    };
    (handle, events)
}

/// Receiver side, owned by the session on the loop thread
#[derive(Debug)]
pub struct EventLoop {
    receiver: UnboundedReceiver<UiTask>,
    pending: Arc<AtomicUsize>,
    throttle: ResizeThrottle,
    deferred_resize: Option<(u32, u32)>,
}

impl EventLoop {
    /// Apply every queued task; returns how many ran
    pub fn pump(&mut self, app: &mut AppState) -> usize {
        let mut handled = 0;
        while let Ok(task) = self.receiver.try_recv() {
            self.apply(app, task);
            handled += 1;
        }
        self.flush_resize(app);
        if handled > 0 {
            trace!(handled, "ui tasks applied");
        }
        handled
    }

    /// Pump until no background job is in flight; false on timeout
    pub fn wait_idle(&mut self, app: &mut AppState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump(app);
            if self.pending.load(Ordering::SeqCst) == 0 {
                // Jobs post before they release the count
                self.pump(app);
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(IDLE_POLL);
        }
    }

    /// Throttled relayout; a suppressed size is kept and applied later
    pub fn resize(&mut self, app: &mut AppState, width: u32, height: u32) {
        if self.throttle.ready() {
            self.deferred_resize = None;
            app.relayout(width, height);
        } else {
            self.deferred_resize = Some((width, height));
        }
    }

    fn flush_resize(&mut self, app: &mut AppState) {
        if let Some((width, height)) = self.deferred_resize {
            if self.throttle.ready() {
                self.deferred_resize = None;
                app.relayout(width, height);
            }
        }
    }

    fn apply(&mut self, app: &mut AppState, task: UiTask) {
        match task {
            UiTask::ApiCompleted {
                api,
                target,
                response,
            } => actions::deliver_api_result(app, &api, target.as_deref(), &response),
            UiTask::Resize { width, height } => self.resize(app, width, height),
            UiTask::Message { kind, title, body } => app.show_message(kind, &title, &body),
        }
    }
}
