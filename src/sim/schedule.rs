/// Delayed effects, queued instead of fired from callbacks.
///
/// Every event is stamped with the state it was issued under. The session
/// re-checks that stamp when the event comes due and drops it if the world
/// has moved on (a level change, a new struggle, a reset).

use super::session::Phase;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TimerKind {
    /// TRANSFORMING → SAIF, with the rage bump.
    BossEmerges,
    /// The struggle ran out of time.
    StruggleTimeout,
    /// JUMPSCARE → GAME_OVER.
    GameOver,
    /// Cosmetic cue; re-arms itself while the game is running.
    AmbientCue,
}

/// What the session looked like when an event was issued.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Stamp {
    pub phase: Phase,
    /// Bumped on every phase transition.
    pub version: u64,
    /// Bumped on every level load and full reset.
    pub epoch: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScheduledEvent {
    pub kind: TimerKind,
    pub issued: Stamp,
    pub due_ms: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    queue: Vec<ScheduledEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, issued: Stamp, due_ms: u64) {
        tracing::trace!(?kind, due_ms, version = issued.version, "timer armed");
        self.queue.push(ScheduledEvent { kind, issued, due_ms });
    }

    /// Remove and return every event due at `now_ms`, earliest first.
    /// Events due at the same instant keep their scheduling order.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ScheduledEvent> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.queue.drain(..).partition(|e| e.due_ms <= now_ms);
        self.queue = pending;
        due.sort_by_key(|e| e.due_ms);
        due
    }

    /// Drop everything still queued.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
