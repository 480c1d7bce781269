// Transaction Extraction & Cross-Source Reconciliation Engine
// Turns bank SMS bodies and payment-app notification text into canonical
// transaction records, deduplicated across both observation channels.

pub mod category;
pub mod fingerprint;
pub mod glyph;
pub mod ingest;
pub mod model;
pub mod notification;
pub mod queue;
pub mod reconcile;
pub mod sender;
pub mod sms;
pub mod store;

// Re-export commonly used types
pub use ingest::{EventOutcome, IngestEngine, Rejection};
pub use model::{
    CandidateTransaction, CanonicalTransaction, Direction, EventSource, ExtractedFields, RawEvent,
    TransactionPatch,
};
pub use notification::{NotificationError, PaymentApp};
pub use queue::{IngestQueue, Ticket};
pub use reconcile::{Outcome, ReconcileEngine};
pub use store::{SqliteStore, TransactionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
