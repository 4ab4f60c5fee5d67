use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use super::{EngineError, MoveSearch};
use crate::moves::Move;
use crate::position::Position;

/// Identifies one engine request. Completions carry the ticket of the
/// request they answer so stale answers can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// The answer to one engine request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCompletion {
    pub ticket: Ticket,
    pub result: Result<Move, EngineError>,
}

struct EngineRequest {
    ticket: Ticket,
    position: Position,
    budget: Duration,
}

/// Runs a [`MoveSearch`] on its own thread.
///
/// Requests go in by value; completions come back, in order, on
/// [`EngineWorker::completions`]. Dropping the worker closes the request
/// queue and lets the thread finish whatever it is doing in the background.
#[derive(Debug)]
pub struct EngineWorker {
    requests: Option<Sender<EngineRequest>>,
    completions: Receiver<EngineCompletion>,
    handle: Option<JoinHandle<()>>,
}

impl EngineWorker {
    /// Start the worker thread.
    pub fn spawn(mut search: impl MoveSearch + 'static) -> Result<Self, EngineError> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<EngineRequest>();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name("engine-worker".into())
            .spawn(move || {
                for request in request_rx {
                    log::debug!("searching {} for ticket {}", request.position.to_fen(), request.ticket.id());
                    let result = search.request_move(&request.position, request.budget);
                    let completion = EngineCompletion {
                        ticket: request.ticket,
                        result,
                    };
                    if completion_tx.send(completion).is_err() {
                        break;
                    }
                }
                log::debug!("engine worker stopped");
            })
            .map_err(|err| EngineError::Unavailable(format!("failed to start engine worker: {err}")))?;

        Ok(Self {
            requests: Some(request_tx),
            completions: completion_rx,
            handle: Some(handle),
        })
    }

    /// Queue a search for `position`.
    ///
    /// Fails with [`EngineError::Crashed`] when the worker thread has died.
    pub fn submit(
        &self,
        ticket: Ticket,
        position: Position,
        budget: Duration,
    ) -> Result<(), EngineError> {
        let request = EngineRequest {
            ticket,
            position,
            budget,
        };
        self.requests
            .as_ref()
            .ok_or_else(|| EngineError::Crashed("engine worker shut down".to_string()))?
            .send(request)
            .map_err(|_| EngineError::Crashed("engine worker is gone".to_string()))
    }

    /// Receiver side of the completion queue, for `select!`-style waiting.
    #[inline]
    pub fn completions(&self) -> &Receiver<EngineCompletion> {
        &self.completions
    }

    /// A completion if one is ready.
    #[inline]
    pub fn try_completion(&self) -> Option<EngineCompletion> {
        self.completions.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    #[inline]
    pub fn wait_completion(&self, timeout: Duration) -> Option<EngineCompletion> {
        self.completions.recv_timeout(timeout).ok()
    }

    /// Close the request queue and wait for the thread to finish its current search.
    pub fn shutdown(mut self) {
        self.requests = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("engine worker panicked");
            }
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        // Closing the queue ends the thread after its current request; the
        // handle is detached so dropping never waits on a search.
        self.requests = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    const WAIT: Duration = Duration::from_secs(5);

    struct Fixed(Result<Move, EngineError>);

    impl MoveSearch for Fixed {
        fn request_move(&mut self, _: &Position, _: Duration) -> Result<Move, EngineError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_completion_carries_ticket() {
        let e2e4 = Move::new(Square::E2, Square::E4);
        let worker = EngineWorker::spawn(Fixed(Ok(e2e4))).expect("worker starts");

        worker
            .submit(Ticket::new(7), Position::new(), Duration::ZERO)
            .expect("worker accepts requests");

        let completion = worker.wait_completion(WAIT).expect("worker answers");
        assert_eq!(completion.ticket, Ticket::new(7));
        assert_eq!(completion.result, Ok(e2e4));
    }

    #[test]
    fn test_completions_arrive_in_order() {
        let worker = EngineWorker::spawn(Fixed(Err(EngineError::Crashed("boom".to_string()))))
            .expect("worker starts");

        for id in 1..=3 {
            worker
                .submit(Ticket::new(id), Position::new(), Duration::ZERO)
                .expect("worker accepts requests");
        }

        let tickets: Vec<u64> = (0..3)
            .filter_map(|_| worker.wait_completion(WAIT))
            .map(|completion| completion.ticket.id())
            .collect();
        assert_eq!(tickets, [1, 2, 3]);
    }

    #[test]
    fn test_shutdown_joins_thread() {
        let worker = EngineWorker::spawn(Fixed(Ok(Move::new(Square::E2, Square::E4))))
            .expect("worker starts");
        assert!(worker.try_completion().is_none());
        worker.shutdown();
    }
}
