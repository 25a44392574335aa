//! The outbox through which protocol state machines talk to their host.
//!
//! Nothing in the protocol core sends a packet or sleeps. Callbacks record [Action]s on the
//! [Face] and the host (the simulator or the actix runtime) drains and executes them after
//! the callback returns.

use crate::ndn::{Data, Interest, Name};

use tai64::Tai64;

use std::collections::HashMap;
use std::time::Duration;

pub type TimerId = u64;

/// Why a timer was armed. The host hands the id back when it fires and the node recovers
/// the tag with [Face::take_timer].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timer {
    /// The lifetime of an outstanding certificate request elapsed
    FetchTimeout(Name),
    /// The backoff after a negative acknowledgement elapsed
    FetchRetry(Name),
    SignHeartbeat,
    Subscribe,
    ConsumeNext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Express(Interest),
    Put(Data),
    Register(Name),
    Schedule { id: TimerId, after: Duration },
    Cancel(TimerId),
}

#[derive(Debug, Default)]
pub struct Face {
    now: Duration,
    /// Absolute time of host clock zero, when the host runs its own clock
    epoch: Option<Tai64>,
    next_timer: TimerId,
    timers: HashMap<TimerId, Timer>,
    actions: Vec<Action>,
}

impl Face {
    pub fn new() -> Self {
        Face::default()
    }

    /// The host clock at the start of the current callback.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn set_now(&mut self, now: Duration) {
        self.now = now;
    }

    pub fn set_epoch(&mut self, epoch: Tai64) {
        self.epoch = Some(epoch);
    }

    /// The host clock as an absolute time, `None` when the host follows the wall clock.
    pub fn host_time(&self) -> Option<Tai64> {
        self.epoch.map(|epoch| Tai64(epoch.0.saturating_add(self.now.as_secs())))
    }

    /// The time signatures are stamped and checked against.
    pub fn clock(&self) -> Tai64 {
        self.host_time().unwrap_or_else(Tai64::now)
    }

    pub fn express(&mut self, interest: Interest) {
        self.actions.push(Action::Express(interest));
    }

    pub fn put(&mut self, data: Data) {
        self.actions.push(Action::Put(data));
    }

    /// Makes the node reachable under `prefix`.
    pub fn register(&mut self, prefix: Name) {
        self.actions.push(Action::Register(prefix));
    }

    pub fn schedule(&mut self, after: Duration, timer: Timer) -> TimerId {
        let id = self.next_timer;
        self.next_timer += 1;
        self.timers.insert(id, timer);
        self.actions.push(Action::Schedule { id, after });
        id
    }

    /// Cancels a timer. A canceled timer is never returned by `take_timer`, even when the
    /// host fires it anyway.
    pub fn cancel(&mut self, id: TimerId) {
        if self.timers.remove(&id).is_some() {
            self.actions.push(Action::Cancel(id));
        }
    }

    /// Claims a fired timer; `None` when it was canceled or already claimed.
    pub fn take_timer(&mut self, id: TimerId) -> Option<Timer> {
        self.timers.remove(&id)
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// The actions recorded so far, without consuming them.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }
}
