// Core data model: raw observed events, extraction output, and the
// canonical persisted transaction record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// EVENT TYPES
// ============================================================================

/// Which observation channel delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Sms,
    Notification,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Sms => "sms",
            EventSource::Notification => "notification",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sms" => Some(EventSource::Sms),
            "notification" => Some(EventSource::Notification),
            _ => None,
        }
    }
}

/// Money direction from the account holder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "income" => Some(Direction::Income),
            "expense" => Some(Direction::Expense),
            _ => None,
        }
    }
}

/// A raw text event as delivered by one of the observation channels.
///
/// Ephemeral by design: only the structured fields derived from it are ever
/// persisted. The raw text must not reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// SMS sender id or notification package name.
    pub origin_id: String,
    pub source: EventSource,
    /// Message body; for notifications, title and body concatenated.
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

// ============================================================================
// EXTRACTION OUTPUT
// ============================================================================

/// Fields a pattern engine pulled out of one event's text.
///
/// Intermediate between raw text and a full candidate: categorization and
/// fingerprinting happen downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub direction: Direction,
    pub amount: f64,
    pub account_suffix: Option<String>,
    pub merchant: Option<String>,
    pub reference: Option<String>,
    pub balance_after: Option<f64>,
    pub confidence: f64,
}

impl ExtractedFields {
    pub fn new(direction: Direction, amount: f64) -> Self {
        ExtractedFields {
            direction,
            amount,
            account_suffix: None,
            merchant: None,
            reference: None,
            balance_after: None,
            confidence: 0.0,
        }
    }
}

// ============================================================================
// CANDIDATE & CANONICAL TRANSACTIONS
// ============================================================================

/// Fully-derived structured record for one observed event, ready for
/// reconciliation. Transient; never stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTransaction {
    pub direction: Direction,
    pub amount: f64,
    pub account_suffix: Option<String>,
    pub merchant: Option<String>,
    pub reference: Option<String>,
    pub balance_after: Option<f64>,
    /// Resolved bank or payment-app name.
    pub origin_label: String,
    pub category: String,
    pub category_icon: String,
    pub category_color: String,
    pub confidence: f64,
    pub fingerprint: String,
    pub source: EventSource,
}

impl CandidateTransaction {
    /// A candidate with a non-positive amount must never reach the store.
    pub fn is_valid(&self) -> bool {
        self.amount > 0.0
    }
}

/// The single persisted record for one real-world transaction, regardless
/// of how many observation sources contributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    /// Store row id (0 until inserted).
    pub id: i64,
    /// Stable identity, never changes across merges.
    pub uid: String,
    pub direction: Direction,
    pub amount: f64,
    pub account_suffix: Option<String>,
    pub merchant: Option<String>,
    pub reference: Option<String>,
    pub balance_after: Option<f64>,
    pub origin_label: String,
    pub category: String,
    pub category_icon: String,
    pub category_color: String,
    pub confidence: f64,
    pub fingerprint: String,
    pub source: EventSource,
    pub transaction_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub synced: bool,
    pub note: Option<String>,
}

impl CanonicalTransaction {
    /// Build a new canonical record from a candidate. The id is assigned by
    /// the store on insert.
    pub fn from_candidate(candidate: &CandidateTransaction, observed_at: DateTime<Utc>) -> Self {
        CanonicalTransaction {
            id: 0,
            uid: uuid::Uuid::new_v4().to_string(),
            direction: candidate.direction,
            amount: candidate.amount,
            account_suffix: candidate.account_suffix.clone(),
            merchant: candidate.merchant.clone(),
            reference: candidate.reference.clone(),
            balance_after: candidate.balance_after,
            origin_label: candidate.origin_label.clone(),
            category: candidate.category.clone(),
            category_icon: candidate.category_icon.clone(),
            category_color: candidate.category_color.clone(),
            confidence: candidate.confidence,
            fingerprint: candidate.fingerprint.clone(),
            source: candidate.source,
            transaction_at: observed_at,
            created_at: Utc::now(),
            synced: false,
            note: None,
        }
    }
}

/// Field-level update applied to an existing canonical transaction on a
/// merge decision. Only the fields the reconciliation protocol is allowed
/// to improve are present here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub origin_label: Option<String>,
    pub account_suffix: Option<String>,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
    pub fingerprint: Option<String>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.origin_label.is_none()
            && self.account_suffix.is_none()
            && self.merchant.is_none()
            && self.category.is_none()
            && self.category_icon.is_none()
            && self.category_color.is_none()
            && self.fingerprint.is_none()
    }
}

// ============================================================================
// TESTS
// ============================================================================
