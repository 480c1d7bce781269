// Explicit work queue around the ingest engine.
//
// Each submitted event is one unit of work with a ticket as its completion
// signal, so callers (and tests) can await terminal outcomes
// deterministically instead of relying on timing.

use anyhow::{anyhow, Result};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::ingest::{EventOutcome, IngestEngine};
use crate::model::RawEvent;
use crate::store::TransactionStore;

struct Job {
    event: RawEvent,
    done: mpsc::Sender<Result<EventOutcome>>,
}

/// Completion signal for one submitted event.
pub struct Ticket {
    receiver: mpsc::Receiver<Result<EventOutcome>>,
}

impl Ticket {
    /// Block until the event reached its terminal state.
    pub fn wait(self) -> Result<EventOutcome> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("ingest worker terminated before completing the event"))?
    }
}

/// Single-worker ingest queue. Events are processed strictly in submission
/// order; the store lives inside the engine on the worker thread and is
/// handed back on close.
pub struct IngestQueue<S: TransactionStore + Send + 'static> {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<S>>,
}

impl<S: TransactionStore + Send + 'static> IngestQueue<S> {
    pub fn start(engine: IngestEngine<S>) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();

        let worker = thread::spawn(move || {
            for job in receiver {
                let result = engine.process(&job.event);
                // A dropped ticket just means the caller stopped waiting.
                let _ = job.done.send(result);
            }
            log::debug!("ingest queue drained, worker exiting");
            engine.into_store()
        });

        IngestQueue {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Enqueue one event. The returned ticket resolves when the event has
    /// been fully processed or dropped.
    pub fn submit(&self, event: RawEvent) -> Ticket {
        let (done, receiver) = mpsc::channel();
        if let Some(sender) = &self.sender {
            let _ = sender.send(Job { event, done });
        }
        Ticket { receiver }
    }

    /// Drain the queue, stop the worker, and reclaim the store.
    pub fn close(mut self) -> Result<S> {
        self.sender.take();
        let worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("ingest queue already closed"))?;
        worker
            .join()
            .map_err(|_| anyhow!("ingest worker panicked"))
    }
}

impl<S: TransactionStore + Send + 'static> Drop for IngestQueue<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit on its own.
        self.sender.take();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Rejection;
    use crate::model::EventSource;
    use crate::reconcile::Outcome;
    use crate::store::SqliteStore;
    use chrono::{TimeZone, Utc};

    fn sms_event(text: &str, secs: i64) -> RawEvent {
        RawEvent {
            origin_id: "HDFCBK".to_string(),
            source: EventSource::Sms,
            text: text.to_string(),
            observed_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_submitted_events_complete_in_order() {
        let engine = IngestEngine::new(SqliteStore::open_in_memory().unwrap());
        let queue = IngestQueue::start(engine);

        let t1 = queue.submit(sms_event("Rs.499.00 debited from A/c **4532", 1_000));
        let t2 = queue.submit(sms_event("Rs.499.00 debited from A/c **4532", 1_000));

        assert!(matches!(
            t1.wait().unwrap(),
            EventOutcome::Recorded(Outcome::Inserted(_))
        ));
        // Identical raw event: absorbed by the fingerprint gate.
        assert_eq!(
            t2.wait().unwrap(),
            EventOutcome::Recorded(Outcome::DuplicateDropped)
        );

        let store = queue.close().unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_rejection_reported_through_ticket() {
        let engine = IngestEngine::new(SqliteStore::open_in_memory().unwrap());
        let queue = IngestQueue::start(engine);

        let mut event = sms_event("Rs.100.00 debited from A/c **1234", 0);
        event.origin_id = "SPAMCO".to_string();
        let ticket = queue.submit(event);

        assert_eq!(
            ticket.wait().unwrap(),
            EventOutcome::Rejected(Rejection::UnrecognizedSender("SPAMCO".to_string()))
        );

        let store = queue.close().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_close_waits_for_pending_work() {
        let engine = IngestEngine::new(SqliteStore::open_in_memory().unwrap());
        let queue = IngestQueue::start(engine);

        for i in 0..5 {
            queue.submit(sms_event(
                &format!("Rs.{}.00 debited from A/c **4532", 100 + i),
                1_000 + i,
            ));
        }

        // Close drains the channel before handing the store back.
        let store = queue.close().unwrap();
        assert_eq!(store.count().unwrap(), 5);
    }
}
