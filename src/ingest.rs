// Ingest pipeline: raw event in, terminal reconciliation outcome out.
//
// Extraction is pure and runs without any lock; only the store's
// check-then-act reconciliation sequence is serialized, so concurrent
// events can be extracted in parallel while duplicates can never both
// reach the insert step.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

use crate::model::{CandidateTransaction, EventSource, RawEvent};
use crate::notification::{self, NotificationError, PaymentApp};
use crate::reconcile::{Outcome, ReconcileEngine};
use crate::store::TransactionStore;
use crate::{category, fingerprint, glyph, sender, sms};

/// Why an event was discarded before reaching the store. Discards are
/// values, not errors that propagate: the caller decides whether to
/// surface them. No retries happen here; a dropped event is gone.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    #[error("origin `{0}` is not a known bank or payment service")]
    UnrecognizedSender(String),
    #[error("no extraction pattern matched")]
    ExtractionFailure,
    #[error("direction keywords were ambiguous")]
    AmbiguousDirection,
}

/// Terminal disposition of one raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    Recorded(Outcome),
    Rejected(Rejection),
}

/// The end-to-end pipeline with an explicitly owned store handle.
pub struct IngestEngine<S: TransactionStore> {
    store: Mutex<S>,
    reconciler: ReconcileEngine,
}

impl<S: TransactionStore> IngestEngine<S> {
    pub fn new(store: S) -> Self {
        IngestEngine {
            store: Mutex::new(store),
            reconciler: ReconcileEngine::new(),
        }
    }

    pub fn with_reconciler(store: S, reconciler: ReconcileEngine) -> Self {
        IngestEngine {
            store: Mutex::new(store),
            reconciler,
        }
    }

    /// Process one raw event to a terminal state. Returns `Err` only for
    /// store failures; every extraction-level discard is a `Rejected`
    /// outcome.
    pub fn process(&self, event: &RawEvent) -> Result<EventOutcome> {
        let Some(origin_label) = sender::classify(&event.origin_id, event.source) else {
            log::debug!("unrecognized origin: {}", event.origin_id);
            return Ok(EventOutcome::Rejected(Rejection::UnrecognizedSender(
                event.origin_id.clone(),
            )));
        };

        let text = glyph::normalize(&event.text);

        let fields = match event.source {
            EventSource::Sms => match sms::extract(&text) {
                Some(fields) => fields,
                None => return Ok(EventOutcome::Rejected(Rejection::ExtractionFailure)),
            },
            EventSource::Notification => {
                let app = PaymentApp::from_package(&event.origin_id);
                match notification::extract(app, &text) {
                    Ok(fields) => fields,
                    Err(NotificationError::AmbiguousDirection) => {
                        return Ok(EventOutcome::Rejected(Rejection::AmbiguousDirection))
                    }
                    Err(NotificationError::NoMatch) => {
                        return Ok(EventOutcome::Rejected(Rejection::ExtractionFailure))
                    }
                }
            }
        };

        let cat = category::detect(fields.merchant.as_deref());

        // Notifications carry no bank reference; a synthetic one keeps
        // their fingerprints distinct per delivery.
        let reference = match event.source {
            EventSource::Sms => fields.reference.clone(),
            EventSource::Notification => Some(fingerprint::notification_reference(
                event.observed_at,
                fields.amount,
                fields.merchant.as_deref(),
            )),
        };
        let fp = fingerprint::fingerprint(
            &origin_label,
            fields.amount,
            reference.as_deref(),
            event.observed_at,
        );

        let candidate = CandidateTransaction {
            direction: fields.direction,
            amount: fields.amount,
            account_suffix: fields.account_suffix,
            merchant: fields.merchant,
            reference,
            balance_after: fields.balance_after,
            origin_label,
            category: cat.to_string(),
            category_icon: category::icon(cat).to_string(),
            category_color: category::color(cat).to_string(),
            confidence: fields.confidence,
            fingerprint: fp,
            source: event.source,
        };

        // Extractors enforce positive amounts; this is the store-boundary
        // invariant.
        if !candidate.is_valid() {
            return Ok(EventOutcome::Rejected(Rejection::ExtractionFailure));
        }

        let mut store = self
            .store
            .lock()
            .map_err(|_| anyhow!("transaction store mutex poisoned"))?;
        let outcome = self
            .reconciler
            .reconcile(&mut *store, &candidate, event.observed_at)?;
        Ok(EventOutcome::Recorded(outcome))
    }

    /// Reclaim the store handle, e.g. after the last event was processed.
    pub fn into_store(self) -> S {
        match self.store.into_inner() {
            Ok(store) => store,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
