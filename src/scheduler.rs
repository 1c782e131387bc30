//! Change coalescing.
//!
//! Store events arrive in bursts (a rename of a folder with a hundred notes produces a hundred
//! events). The [`Debouncer`] is a two state machine deciding when a burst triggers a
//! synchronization pass:
//!
//! ```text
//!            event / Fire                     event, now < deadline / Suppress
//!   Idle  ------------------>  PendingFlush{deadline}  <-----------------+
//!    ^                               |    |                              |
//!    |      now >= deadline          |    +------------------------------+
//!    +-------------------------------+
//! ```
//!
//! The first event of a burst fires immediately and arms a deadline one quiet period later;
//! further events before the deadline are suppressed. Folders touched by suppressed events stay in
//! the [`TouchedFolders`] set and are picked up by the next pass. Time comes from an injected
//! [`Clock`] so the machine is testable without sleeping.

use parking_lot::Mutex;
use std::{
    collections::BTreeSet,
    fmt::Debug,
    time::{Duration, Instant},
};

/// Source of "now" for the debouncer.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    PendingFlush { deadline: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run a pass now
    Fire,
    /// A pass already ran for this burst; keep accumulating
    Suppress,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Debouncer {
        Debouncer {
            quiet,
            state: DebounceState::Idle,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Takes effect from the next burst.
    pub fn set_quiet(&mut self, quiet: Duration) {
        self.quiet = quiet;
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one event observed at `now`.
    pub fn on_event(&mut self, now: Instant) -> Decision {
        match self.state {
            DebounceState::PendingFlush { deadline } if now < deadline => Decision::Suppress,
            _ => {
                self.state = DebounceState::PendingFlush {
                    deadline: now + self.quiet,
                };
                Decision::Fire
            }
        }
    }

    /// True once no burst is in progress at `now`.
    pub fn is_quiet_at(&self, now: Instant) -> bool {
        match self.state {
            DebounceState::Idle => true,
            DebounceState::PendingFlush { deadline } => now >= deadline,
        }
    }

    /// Drop an expired deadline.
    pub fn settle(&mut self, now: Instant) {
        if self.is_quiet_at(now) {
            self.state = DebounceState::Idle;
        }
    }
}

/// Folder paths waiting for the next pass.
///
/// Draining swaps the whole set out under the lock, so a pass always sees a complete snapshot and
/// folders touched while it runs land in the next one.
#[derive(Debug, Default)]
pub struct TouchedFolders(Mutex<BTreeSet<String>>);

impl TouchedFolders {
    pub fn touch<I: IntoIterator<Item = String>>(&self, folders: I) {
        self.0.lock().extend(folders);
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock()).into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}
