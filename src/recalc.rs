//! Recalculation controller - single-flight guard for calculator round trips

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecalcState {
    Idle,
    Requesting { generation: u64 },
}

/// Proof that a request was started. Consumed when the response arrives.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// `Idle -> Requesting -> Idle`.
///
/// At most one request is in flight. Starting another while requesting is
/// rejected without touching any state; there is no queue and no retry.
/// Navigating away bumps the generation so a late response is recognised
/// and discarded.
#[derive(Debug, Clone)]
pub struct RecalculationController {
    state: RecalcState,
    generation: u64,
    started: u64,
}

impl Default for RecalculationController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecalculationController {
    pub fn new() -> Self {
        Self {
            state: RecalcState::Idle,
            generation: 0,
            started: 0,
        }
    }

    pub fn begin(&mut self) -> ViewerResult<Ticket> {
        if let RecalcState::Requesting { generation } = self.state {
            log::debug!("Recalculation rejected: request of generation {} still in flight", generation);
            return Err(ViewerError::Busy);
        }
        self.state = RecalcState::Requesting {
            generation: self.generation,
        };
        self.started += 1;
        Ok(Ticket {
            generation: self.generation,
        })
    }

    /// Return to idle once the response (success or failure) is in.
    ///
    /// Fails with [`ViewerError::Stale`] if the view was invalidated after
    /// the ticket was issued; the caller must then drop the response.
    pub fn finish(&mut self, ticket: Ticket) -> ViewerResult<()> {
        if ticket.generation != self.generation {
            log::info!(
                "Discarding response of generation {} (current {})",
                ticket.generation,
                self.generation
            );
            return Err(ViewerError::Stale);
        }
        self.state = RecalcState::Idle;
        Ok(())
    }

    /// Give up on a request without a response; nothing is applied.
    pub fn abandon(&mut self, ticket: Ticket) {
        self.release(ticket.generation);
    }

    /// Hold the controller while a request is awaited.
    ///
    /// Dropping the guard before [`InFlight::settle`] abandons the request,
    /// so a cancelled future never leaves the controller requesting.
    pub fn guard(&mut self, ticket: &Ticket) -> InFlight<'_> {
        InFlight {
            generation: ticket.generation,
            controller: self,
            armed: true,
        }
    }

    fn release(&mut self, generation: u64) {
        if self.state == (RecalcState::Requesting { generation }) {
            log::debug!("Abandoned request of generation {}", generation);
            self.state = RecalcState::Idle;
        }
    }

    /// Forget any in-flight request
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.state = RecalcState::Idle;
    }

    pub fn state(&self) -> RecalcState {
        self.state
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, RecalcState::Requesting { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Requests started over the controller's lifetime
    pub fn started(&self) -> u64 {
        self.started
    }
}

/// Borrow of the controller for the duration of one awaited request
#[derive(Debug)]
pub struct InFlight<'a> {
    controller: &'a mut RecalculationController,
    generation: u64,
    armed: bool,
}

impl InFlight<'_> {
    /// The response arrived; leave the state for `finish` to settle.
    pub fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.release(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_finish_cycle() {
        let mut ctl = RecalculationController::new();
        let ticket = ctl.begin().unwrap();
        assert!(ctl.is_requesting());
        ctl.finish(ticket).unwrap();
        assert_eq!(ctl.state(), RecalcState::Idle);
        assert_eq!(ctl.started(), 1);
    }

    #[test]
    fn test_second_begin_is_rejected_without_side_effects() {
        let mut ctl = RecalculationController::new();
        let _ticket = ctl.begin().unwrap();
        let before = (ctl.state(), ctl.started());

        assert!(matches!(ctl.begin(), Err(ViewerError::Busy)));
        assert_eq!((ctl.state(), ctl.started()), before);
    }

    #[test]
    fn test_invalidated_ticket_is_stale() {
        let mut ctl = RecalculationController::new();
        let old = ctl.begin().unwrap();
        ctl.invalidate();
        assert!(!ctl.is_requesting());

        let fresh = ctl.begin().unwrap();
        assert!(matches!(ctl.finish(old), Err(ViewerError::Stale)));
        // the stale response must not end the fresh request
        assert!(ctl.is_requesting());
        ctl.finish(fresh).unwrap();
    }

    #[test]
    fn test_dropped_guard_returns_to_idle() {
        let mut ctl = RecalculationController::new();
        let ticket = ctl.begin().unwrap();
        drop(ctl.guard(&ticket));
        assert_eq!(ctl.state(), RecalcState::Idle);
        assert!(ctl.begin().is_ok());
    }

    #[test]
    fn test_settled_guard_keeps_request() {
        let mut ctl = RecalculationController::new();
        let ticket = ctl.begin().unwrap();
        ctl.guard(&ticket).settle();
        assert!(ctl.is_requesting());
        ctl.finish(ticket).unwrap();
    }

    #[test]
    fn test_abandon_ignores_other_generation() {
        let mut ctl = RecalculationController::new();
        let old = ctl.begin().unwrap();
        ctl.invalidate();
        let _fresh = ctl.begin().unwrap();
        ctl.abandon(old);
        assert!(ctl.is_requesting());
    }
}
