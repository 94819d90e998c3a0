//! Per-session serialization of the message/reply cycle.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// One FIFO turn queue per chat session.
///
/// [`claim`](SessionGates::claim) is synchronous, so turns claimed in
/// program order are served in that order even when the cycles themselves
/// run in separate tasks. The generation cycle (history read, generation,
/// reply persist) runs while the [`TurnGuard`] is held. Different sessions
/// never contend.
#[derive(Default)]
pub struct SessionGates {
    gates: Mutex<HashMap<u64, Arc<Gate>>>,
}

struct Gate {
    serving: watch::Sender<u64>,
    queue: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    next_ticket: u64,
    /// Turns released before their number came up.
    abandoned: HashSet<u64>,
}

impl Gate {
    fn new() -> Self {
        Self {
            serving: watch::Sender::new(0),
            queue: Mutex::new(QueueState::default()),
        }
    }

    /// Marks `ticket` finished and advances `serving` past it and past any
    /// turns that were abandoned while waiting.
    fn release(&self, ticket: u64) {
        let mut q = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *self.serving.borrow() == ticket {
            self.serving.send_modify(|s| {
                *s += 1;
                while q.abandoned.remove(s) {
                    *s += 1;
                }
            });
        } else {
            q.abandoned.insert(ticket);
        }
    }
}

impl SessionGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the session's next turn without waiting for it.
    pub fn claim(&self, session_id: u64) -> Turn {
        let gate = {
            let mut gates = self
                .gates
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            gates
                .entry(session_id)
                .or_insert_with(|| Arc::new(Gate::new()))
                .clone()
        };
        let ticket = {
            let mut q = gate.queue.lock().unwrap_or_else(PoisonError::into_inner);
            let t = q.next_ticket;
            q.next_ticket += 1;
            t
        };
        Turn {
            gate,
            ticket,
            served: false,
        }
    }
}

/// A claimed place in a session's queue. Dropping an unserved turn gives
/// it up without blocking the turns behind it.
pub struct Turn {
    gate: Arc<Gate>,
    ticket: u64,
    served: bool,
}

impl Turn {
    /// Waits until every earlier turn for the session has finished.
    pub async fn wait(mut self) -> TurnGuard {
        let mut rx = self.gate.serving.subscribe();
        while *rx.borrow_and_update() != self.ticket {
            if rx.changed().await.is_err() {
                // The sender lives inside the gate we hold.
                break;
            }
        }
        self.served = true;
        TurnGuard {
            gate: self.gate.clone(),
            ticket: self.ticket,
        }
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if !self.served {
            self.gate.release(self.ticket);
        }
    }
}

/// Holds the session's turn until dropped.
pub struct TurnGuard {
    gate: Arc<Gate>,
    ticket: u64,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.gate.release(self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn same_session_is_serialized() {
        let gates = Arc::new(SessionGates::new());
        let inside = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let turn = gates.claim(1);
            let inside = inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = turn.wait().await;
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn turns_serve_in_claim_order() {
        let gates = Arc::new(SessionGates::new());
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        // Claim in order, then start the waiters in reverse.
        let turns: Vec<Turn> = (0..3).map(|_| gates.claim(7)).collect();
        let mut handles = Vec::new();
        for (n, turn) in turns.into_iter().enumerate().rev() {
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _guard = turn.wait().await;
                order.lock().await.push(n);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn dropped_turn_does_not_block_later_turns() {
        let gates = SessionGates::new();
        let first = gates.claim(1);
        let second = gates.claim(1);
        drop(first);
        // Would hang if the abandoned first turn were still queued.
        let _guard = second.wait().await;
    }

    #[tokio::test]
    async fn different_sessions_do_not_block_each_other() {
        let gates = SessionGates::new();
        let _a = gates.claim(1).wait().await;
        // Would deadlock if session 2 shared session 1's gate.
        let _b = gates.claim(2).wait().await;
    }
}
