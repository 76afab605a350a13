//! Timer hook.
//!
//! Scheduling is an external collaborator: the broker only needs "run this
//! job once at T" and "run this job every D", with a revocable handle. The
//! [`TimerService`] trait is that seam. [`ThreadTimerService`] is the default
//! implementation, a single worker thread fed through a bounded control
//! queue. The broker creates it lazily the first time a client schedules
//! something.

use std::collections::HashMap;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};

/// Unique identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(Uuid);

impl TimerId {
    /// Create a new random timer id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSchedule {
    /// Once, at the given wall-clock time (immediately if it has passed).
    At(DateTime<Utc>),
    /// Repeatedly, first after one interval.
    Every(Duration),
}

/// Work run by a timer service when a timer fires.
pub type TimerJob = Box<dyn FnMut() + Send + 'static>;

/// Scheduling seam consumed by the broker.
pub trait TimerService: Send + Sync {
    /// Arm a timer under a caller-chosen id.
    fn schedule(&self, id: TimerId, schedule: TimerSchedule, job: TimerJob) -> BrokerResult<()>;

    /// Disarm a timer. Returns false if the request could not be delivered.
    fn cancel(&self, id: TimerId) -> bool;
}

enum ControlMsg {
    Schedule {
        id: TimerId,
        schedule: TimerSchedule,
        job: TimerJob,
    },
    Cancel {
        id: TimerId,
    },
}

struct Armed {
    /// `None` when the deadline lies beyond what `Instant` can represent; such a timer never fires.
    deadline: Option<Instant>,
    every: Option<Duration>,
    job: TimerJob,
}

impl Armed {
    fn new(schedule: TimerSchedule, job: TimerJob) -> Self {
        let now = Instant::now();
        match schedule {
            TimerSchedule::At(at) => Self {
                deadline: now.checked_add((at - Utc::now()).to_std().unwrap_or(Duration::ZERO)),
                every: None,
                job,
            },
            TimerSchedule::Every(every) => Self {
                deadline: now.checked_add(every),
                every: Some(every),
                job,
            },
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// Default timer service: one worker thread, bounded control queue.
///
/// Dropping the service closes the control queue; the worker exits on its
/// next wake-up and is never joined.
pub struct ThreadTimerService {
    control_tx: Sender<ControlMsg>,
}

impl fmt::Debug for ThreadTimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTimerService")
            .field("queued", &self.control_tx.len())
            .finish()
    }
}

impl ThreadTimerService {
    /// Spawn the worker thread.
    pub fn spawn(cfg: &BrokerConfig) -> BrokerResult<Self> {
        let (control_tx, control_rx) = bounded::<ControlMsg>(cfg.timer_queue_capacity.max(1));

        thread::Builder::new()
            .name(cfg.timer_thread_name.clone())
            .spawn(move || worker_loop(&control_rx))
            .map_err(|e| BrokerError::internal(format!("failed to spawn timer worker: {e}")))?;

        Ok(Self { control_tx })
    }
}

impl TimerService for ThreadTimerService {
    fn schedule(&self, id: TimerId, schedule: TimerSchedule, job: TimerJob) -> BrokerResult<()> {
        // Never block: jobs running on the worker thread may schedule more timers.
        match self.control_tx.try_send(ControlMsg::Schedule { id, schedule, job }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(BrokerError::internal("timer queue is full")),
            Err(TrySendError::Disconnected(_)) => Err(BrokerError::internal("timer worker disconnected")),
        }
    }

    fn cancel(&self, id: TimerId) -> bool {
        match self.control_tx.try_send(ControlMsg::Cancel { id }) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

fn worker_loop(control_rx: &Receiver<ControlMsg>) {
    let mut armed: HashMap<TimerId, Armed> = HashMap::new();

    loop {
        let now = Instant::now();
        let due: Vec<TimerId> = armed
            .iter()
            .filter(|(_, t)| t.is_due(now))
            .map(|(id, _)| *id)
            .collect();

        for id in due {
            let Some(mut timer) = armed.remove(&id) else {
                continue;
            };
            (timer.job)();
            if let Some(every) = timer.every {
                timer.deadline = Instant::now().checked_add(every);
                armed.insert(id, timer);
            }
        }

        let next_deadline = armed.values().filter_map(|t| t.deadline).min();
        let msg = match next_deadline {
            Some(deadline) => control_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => control_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match msg {
            Ok(ControlMsg::Schedule { id, schedule, job }) => {
                armed.insert(id, Armed::new(schedule, job));
            }
            Ok(ControlMsg::Cancel { id }) => {
                armed.remove(&id);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
