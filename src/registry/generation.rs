//! Per-node generation tokens.
//!
//! Every fetch takes a ticket for its node and row window. The arena only
//! holds windows with a fetch in flight; the entry goes away when the last
//! one finishes. Releasing a node (collapse, teardown) forgets all of its
//! windows, so tickets issued before the release are no longer current and
//! their responses are dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use grid_types::NodeKey;

/// Row window of a fetch: `(start_row, end_row)`
pub type RowWindow = (u64, u64);

/// Generation a fetch was issued under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: NodeKey,
    pub window: RowWindow,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u64,
    /// Fetches of this generation not yet finished
    in_flight: usize,
}

#[derive(Debug, Default)]
struct ArenaState {
    /// Last generation handed out, across all nodes
    last: u64,
    current: HashMap<NodeKey, HashMap<RowWindow, Slot>>,
}

/// Active generations indexed by node, then row window
#[derive(Debug, Default)]
pub struct GenerationArena {
    state: Mutex<ArenaState>,
}

impl GenerationArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ArenaState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ticket for a new fetch of `window` under `key`.
    ///
    /// With `supersede`, the window moves to a fresh generation and older
    /// in-flight tickets for the same window stop being current. Without it,
    /// overlapping fetches of the window share its generation. Other windows
    /// of the node are never affected.
    pub fn issue(&self, key: NodeKey, window: RowWindow, supersede: bool) -> Ticket {
        let mut state = self.lock();
        state.last += 1;
        let fresh = state.last;
        let slot = state
            .current
            .entry(key.clone())
            .or_default()
            .entry(window)
            .and_modify(|slot| {
                if supersede {
                    *slot = Slot {
                        generation: fresh,
                        in_flight: 1,
                    };
                } else {
                    slot.in_flight += 1;
                }
            })
            .or_insert(Slot {
                generation: fresh,
                in_flight: 1,
            });
        Ticket {
            key,
            window,
            generation: slot.generation,
        }
    }

    /// Ticket wrapped in a guard that finishes it when dropped.
    pub fn begin(&self, key: NodeKey, window: RowWindow, supersede: bool) -> InFlight<'_> {
        InFlight {
            arena: self,
            ticket: self.issue(key, window, supersede),
            finished: false,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.lock()
            .current
            .get(&ticket.key)
            .and_then(|windows| windows.get(&ticket.window))
            .is_some_and(|slot| slot.generation == ticket.generation)
    }

    /// Mark a fetch as finished; returns whether its ticket was still current.
    ///
    /// The window's entry is removed once its last current fetch finishes.
    pub fn complete(&self, ticket: &Ticket) -> bool {
        let mut state = self.lock();
        let Some(windows) = state.current.get_mut(&ticket.key) else {
            return false;
        };
        let Some(slot) = windows.get_mut(&ticket.window) else {
            return false;
        };
        if slot.generation != ticket.generation {
            return false;
        }
        slot.in_flight = slot.in_flight.saturating_sub(1);
        if slot.in_flight == 0 {
            windows.remove(&ticket.window);
            if windows.is_empty() {
                state.current.remove(&ticket.key);
            }
        }
        true
    }

    /// Forget every window of `key`; returns whether any fetch was in flight.
    pub fn release(&self, key: &NodeKey) -> bool {
        self.lock().current.remove(key).is_some()
    }

    /// Forget every node (view torn down).
    pub fn release_all(&self) {
        self.lock().current.clear();
    }

    /// Nodes with at least one fetch in flight
    pub fn active_nodes(&self) -> usize {
        self.lock().current.len()
    }
}

/// A ticket that is finished exactly once, explicitly or on drop.
#[derive(Debug)]
pub struct InFlight<'a> {
    arena: &'a GenerationArena,
    ticket: Ticket,
    finished: bool,
}

impl InFlight<'_> {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Finish the fetch; returns whether its response should be delivered.
    pub fn finish(mut self) -> bool {
        self.finished = true;
        self.arena.complete(&self.ticket)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.arena.complete(&self.ticket);
        }
    }
}
