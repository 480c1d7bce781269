// Deterministic fingerprints for exact-duplicate detection.
//
// A fingerprint is an idempotency key, not a security credential: two raw
// deliveries of the same event must collapse to the same digest.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Truncated digest length in hex characters.
const FINGERPRINT_LEN: usize = 32;

/// Compute the fingerprint for an event: SHA-256 over origin, amount, and
/// the extracted reference. Events without a reference fall back to their
/// observation timestamp, so unrelated events never share a key.
pub fn fingerprint(
    origin_label: &str,
    amount: f64,
    reference: Option<&str>,
    observed_at: DateTime<Utc>,
) -> String {
    let reference = match reference {
        Some(r) => r.to_string(),
        None => observed_at.timestamp_millis().to_string(),
    };
    let data = format!("{}-{}-{}", origin_label, amount, reference);

    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}

/// Synthetic reference for notification events, which carry no bank
/// reference id: ingestion time, amount, and a short hash of the
/// counterparty.
pub fn notification_reference(
    observed_at: DateTime<Utc>,
    amount: f64,
    merchant: Option<&str>,
) -> String {
    let merchant_hash = match merchant {
        Some(m) if !m.is_empty() => short_hash(m),
        _ => "unknown".to_string(),
    };
    format!(
        "{}_{}_{}",
        observed_at.timestamp_millis(),
        amount,
        merchant_hash
    )
}

/// First 8 hex characters of SHA-256.
fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_deterministic_and_truncated() {
        let a = fingerprint("HDFC Bank", 499.0, Some("UPI123456"), at(1_700_000_000));
        let b = fingerprint("HDFC Bank", 499.0, Some("UPI123456"), at(1_700_000_999));

        // With a reference, the timestamp does not participate.
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reference_distinguishes_events() {
        let a = fingerprint("HDFC Bank", 499.0, Some("REF1"), at(1_700_000_000));
        let b = fingerprint("HDFC Bank", 499.0, Some("REF2"), at(1_700_000_000));
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_fallback_without_reference() {
        let a = fingerprint("SBI", 100.0, None, at(1_700_000_000));
        let b = fingerprint("SBI", 100.0, None, at(1_700_000_001));
        let c = fingerprint("SBI", 100.0, None, at(1_700_000_000));

        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_origin_participates() {
        let a = fingerprint("HDFC Bank", 100.0, Some("REF"), at(0));
        let b = fingerprint("SBI", 100.0, Some("REF"), at(0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_notification_reference_shape() {
        let reference = notification_reference(at(1_700_000_000), 250.0, Some("MANO RAJKUMAR"));
        let parts: Vec<&str> = reference.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "1700000000000");
        assert_eq!(parts[1], "250");
        assert_eq!(parts[2].len(), 8);

        // Same merchant, same time, same amount: identical reference.
        assert_eq!(
            reference,
            notification_reference(at(1_700_000_000), 250.0, Some("MANO RAJKUMAR"))
        );
        // Different merchant: different reference.
        assert_ne!(
            reference,
            notification_reference(at(1_700_000_000), 250.0, Some("JOHN DOE"))
        );
    }

    #[test]
    fn test_notification_reference_without_merchant() {
        let reference = notification_reference(at(0), 10.0, None);
        assert!(reference.ends_with("unknown"));
    }
}
