// ⚖️ Reconciliation engine
// Decides, for each incoming candidate, whether it is a resend of a known
// event, a second observation of an already-recorded transaction, or a new
// transaction. It upholds the invariant that exactly one canonical
// record exists per real-world transaction.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::category;
use crate::model::{
    CandidateTransaction, CanonicalTransaction, EventSource, TransactionPatch,
};
use crate::store::TransactionStore;

/// Terminal decision for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Same fingerprint already stored: a true resend, dropped silently.
    DuplicateDropped,
    /// No counterpart found: a new canonical transaction was created.
    Inserted(i64),
    /// A second observation of an existing transaction: fields merged.
    MergedInto(i64),
}

/// Counterparty labels carrying no discriminating identity: empty strings
/// and bare transfer-rail markers.
const GENERIC_MERCHANT_TOKENS: [&str; 4] = ["UPI", "IMPS", "DR/", "CR/"];

/// Origin labels that do not name an institution; an SMS-provided bank name
/// may overwrite these on merge.
const GENERIC_ORIGIN_LABELS: [&str; 8] = [
    "Bank",
    "UPI",
    "Google Pay",
    "PhonePe",
    "Paytm",
    "Amazon Pay",
    "BHIM",
    "CRED",
];

pub struct ReconcileEngine {
    /// Window half-width when the incoming event is a notification
    /// (notifications arrive promptly after the transaction).
    pub notification_window: Duration,
    /// Window half-width when the incoming event is an SMS (SMS delivery
    /// can lag well behind the corresponding app notification).
    pub sms_window: Duration,
}

impl ReconcileEngine {
    pub fn new() -> Self {
        ReconcileEngine {
            notification_window: Duration::minutes(5),
            sms_window: Duration::minutes(30),
        }
    }

    /// Run the reconciliation protocol for one candidate against the store.
    ///
    /// The caller must serialize invocations per store: this is a
    /// check-then-act sequence, and two concurrent duplicates would
    /// otherwise both reach the insert step.
    pub fn reconcile<S: TransactionStore>(
        &self,
        store: &mut S,
        candidate: &CandidateTransaction,
        observed_at: DateTime<Utc>,
    ) -> Result<Outcome> {
        // Step 1: exact duplicate of a raw event we already absorbed.
        if let Some(existing) = store.find_by_fingerprint(&candidate.fingerprint)? {
            log::debug!(
                "fingerprint {} already recorded as #{}, dropping resend",
                candidate.fingerprint,
                existing.id
            );
            return Ok(Outcome::DuplicateDropped);
        }

        // Step 2: cross-source window lookup, asymmetric by source.
        let half_width = match candidate.source {
            EventSource::Notification => self.notification_window,
            EventSource::Sms => self.sms_window,
        };
        let existing = store.find_in_window(
            candidate.amount,
            candidate.direction,
            observed_at - half_width,
            observed_at + half_width,
        )?;

        let Some(existing) = existing else {
            // Step 3: nothing comparable in the window.
            let tx = CanonicalTransaction::from_candidate(candidate, observed_at);
            let id = store.insert(&tx)?;
            log::info!(
                "recorded {} {:.2} from {} as #{}",
                candidate.direction.as_str(),
                candidate.amount,
                candidate.origin_label,
                id
            );
            return Ok(Outcome::Inserted(id));
        };

        // Step 4: equal amount, direction and timing. Same transaction or
        // coincidence? Merchant identity decides.
        let existing_merchant = existing.merchant.as_deref().unwrap_or("");
        let new_merchant = candidate.merchant.as_deref().unwrap_or("");

        let same_transaction = is_generic_merchant(existing_merchant)
            || is_generic_merchant(new_merchant)
            || merchants_similar(existing_merchant, new_merchant);

        if !same_transaction {
            // Same amount and timing is coincidental; two different
            // counterparties mean two transactions.
            log::info!(
                "distinct counterparties ({:?} vs {:?}) within window, inserting separately",
                existing_merchant,
                new_merchant
            );
            let tx = CanonicalTransaction::from_candidate(candidate, observed_at);
            let id = store.insert(&tx)?;
            return Ok(Outcome::Inserted(id));
        }

        // Step 5: merge with field precedence by source.
        let patch = merge_patch(&existing, candidate);
        if !patch.is_empty() {
            store.update_fields(existing.id, &patch)?;
        }
        log::info!(
            "merged {} observation of {:.2} into #{}",
            candidate.source.as_str(),
            candidate.amount,
            existing.id
        );
        Ok(Outcome::MergedInto(existing.id))
    }
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MERGE POLICY
// ============================================================================

/// Field updates a second observation contributes to an existing record.
/// SMS improves institution identity (origin label, account suffix) and
/// installs the bank-reference fingerprint; notifications improve the
/// counterparty name. A non-generic stored value is never overwritten.
fn merge_patch(existing: &CanonicalTransaction, candidate: &CandidateTransaction) -> TransactionPatch {
    let mut patch = TransactionPatch::default();

    match candidate.source {
        EventSource::Notification => {
            let existing_merchant = existing.merchant.as_deref().unwrap_or("");
            let new_merchant = candidate.merchant.as_deref().unwrap_or("");
            if is_generic_merchant(existing_merchant) && !is_generic_merchant(new_merchant) {
                patch.merchant = Some(new_merchant.to_string());
                // Category derives from the merchant; recompute with it.
                let cat = category::detect(Some(new_merchant));
                patch.category = Some(cat.to_string());
                patch.category_icon = Some(category::icon(cat).to_string());
                patch.category_color = Some(category::color(cat).to_string());
            }
        }
        EventSource::Sms => {
            if is_generic_origin(&existing.origin_label) && !is_generic_origin(&candidate.origin_label)
            {
                patch.origin_label = Some(candidate.origin_label.clone());
            }
            if existing.account_suffix.is_none() {
                patch.account_suffix = candidate.account_suffix.clone();
            }
            // The bank reference is the stable idempotency key; carrying it
            // lets an SMS redelivery hit the exact-duplicate gate.
            if existing.source == EventSource::Notification {
                patch.fingerprint = Some(candidate.fingerprint.clone());
            }
        }
    }

    patch
}

fn is_generic_merchant(merchant: &str) -> bool {
    let trimmed = merchant.trim();
    trimmed.is_empty()
        || GENERIC_MERCHANT_TOKENS
            .iter()
            .any(|token| trimmed.contains(token))
}

fn is_generic_origin(label: &str) -> bool {
    label.trim().is_empty() || GENERIC_ORIGIN_LABELS.contains(&label.trim())
}

/// Whether two counterparty names plausibly denote the same party: equal
/// after normalization, containment either way, or matching first names.
fn merchants_similar(a: &str, b: &str) -> bool {
    let norm_a = normalize_merchant(a);
    let norm_b = normalize_merchant(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return false;
    }

    if norm_a == norm_b || norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        return true;
    }

    // First-token match, e.g. "MANO RAJKUMAR" vs "MANO R". Very short
    // tokens carry too little signal.
    let first_a = norm_a.split_whitespace().next().unwrap_or("");
    let first_b = norm_b.split_whitespace().next().unwrap_or("");
    first_a.len() > 2 && first_b.len() > 2 && first_a == first_b
}

/// Trim, uppercase, strip leading honorific titles and everything outside
/// alphanumerics and spaces.
fn normalize_merchant(merchant: &str) -> String {
    let upper = merchant.trim().to_uppercase();

    let without_title = ["MR ", "MRS ", "MS ", "DR "]
        .iter()
        .find_map(|title| upper.strip_prefix(title))
        .unwrap_or(&upper);

    without_title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

// ============================================================================
// TESTS
// ============================================================================
