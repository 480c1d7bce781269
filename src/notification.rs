// 🔔 Notification pattern engine
// Parses payment-app notification text (title + body concatenated by the
// channel collaborator). Dispatch is by originating application; each app
// parser tries its phrase patterns in order and falls through to the
// generic parser when none match.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Direction, ExtractedFields};

const APP_CONFIDENCE: f64 = 0.85;
const GENERIC_CONFIDENCE: f64 = 0.70;
const MERCHANT_MAX_LEN: usize = 50;
const DEFAULT_COUNTERPARTY: &str = "UPI Payment";

/// Why a notification yielded no candidate. The distinction matters to the
/// caller's rejection taxonomy: an ambiguous direction is reported
/// differently from a plain pattern miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationError {
    NoMatch,
    AmbiguousDirection,
}

/// Originating application, derived from the notification package name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentApp {
    GooglePay,
    PhonePe,
    Paytm,
    Other,
}

impl PaymentApp {
    pub fn from_package(package: &str) -> Self {
        if package.contains("google") || package.contains("gpay") {
            PaymentApp::GooglePay
        } else if package.contains("phonepe") {
            PaymentApp::PhonePe
        } else if package.contains("paytm") {
            PaymentApp::Paytm
        } else {
            PaymentApp::Other
        }
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

static AMOUNT_SYMBOL_BEFORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:₹|Rs\.?|INR)\s*([\d,]+(?:\.\d{1,2})?)").expect("invalid amount pattern")
});

static AMOUNT_SYMBOL_AFTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+(?:\.\d{1,2})?)\s*(?:₹|Rs\.?|INR)").expect("invalid amount pattern")
});

// Google Pay phrasings, in dispatch order.
static GPAY_PAID_YOU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(.+?)\s+paid you\s+₹?([\d,]+(?:\.\d{2})?)").expect("invalid gpay pattern")
});
static GPAY_YOU_PAID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:You paid|Paid)\s+(.+?)\s+₹?([\d,]+(?:\.\d{2})?)")
        .expect("invalid gpay pattern")
});
static GPAY_PAID_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Paid|Sent)\s+₹?([\d,]+(?:\.\d{2})?)\s+(?:to|for)\s+(.+)")
        .expect("invalid gpay pattern")
});
static GPAY_RECEIVED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Received|Got)\s+₹?([\d,]+(?:\.\d{2})?)\s+from\s+(.+)")
        .expect("invalid gpay pattern")
});

// PhonePe phrasings.
static PHONEPE_PAID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Payment of|Paid)\s+₹?([\d,]+(?:\.\d{2})?)\s+(?:to|successful)")
        .expect("invalid phonepe pattern")
});
static PHONEPE_RECEIVED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Received|Credited)\s+₹?([\d,]+(?:\.\d{2})?)\s+from\s+(.+)")
        .expect("invalid phonepe pattern")
});

// Paytm phrasing; direction comes from keywords in the full text.
static PAYTM_PAID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Paid|Payment)\s+(?:₹|Rs\.?)\s*([\d,]+(?:\.\d{2})?)")
        .expect("invalid paytm pattern")
});

// Counterparty fallback extraction.
static COUNTERPARTY_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:to|at|for)\s+([A-Za-z][A-Za-z0-9\s]+)").expect("invalid pattern")
});
static COUNTERPARTY_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)from\s+([A-Za-z][A-Za-z0-9\s]+)").expect("invalid pattern")
});

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract transaction fields from a normalized notification text.
pub fn extract(app: PaymentApp, text: &str) -> Result<ExtractedFields, NotificationError> {
    let result = match app {
        PaymentApp::GooglePay => parse_gpay(text),
        PaymentApp::PhonePe => parse_phonepe(text),
        PaymentApp::Paytm => parse_paytm(text),
        PaymentApp::Other => parse_generic(text),
    };

    if let Ok(fields) = &result {
        log::debug!(
            "notification extraction: {} {:.2} counterparty={:?}",
            fields.direction.as_str(),
            fields.amount,
            fields.merchant,
        );
    }
    result
}

fn parse_gpay(text: &str) -> Result<ExtractedFields, NotificationError> {
    // "NAME paid you ₹X.XX": money received.
    if let Some(caps) = GPAY_PAID_YOU.captures(text) {
        if let Some(amount) = parse_amount(&caps[2]) {
            return Ok(app_fields(Direction::Income, amount, clean_counterparty(&caps[1])));
        }
    }

    // "You paid NAME ₹X.XX": money sent.
    if let Some(caps) = GPAY_YOU_PAID.captures(text) {
        if let Some(amount) = parse_amount(&caps[2]) {
            return Ok(app_fields(Direction::Expense, amount, clean_counterparty(&caps[1])));
        }
    }

    // "Paid ₹X to NAME" / "Sent ₹X to NAME".
    if let Some(caps) = GPAY_PAID_TO.captures(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Ok(app_fields(Direction::Expense, amount, clean_counterparty(&caps[2])));
        }
    }

    // "Received ₹X from NAME".
    if let Some(caps) = GPAY_RECEIVED.captures(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Ok(app_fields(Direction::Income, amount, clean_counterparty(&caps[2])));
        }
    }

    parse_generic(text)
}

fn parse_phonepe(text: &str) -> Result<ExtractedFields, NotificationError> {
    if let Some(caps) = PHONEPE_PAID.captures(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Ok(app_fields(Direction::Expense, amount, counterparty_from_text(text)));
        }
    }

    if let Some(caps) = PHONEPE_RECEIVED.captures(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            return Ok(app_fields(Direction::Income, amount, clean_counterparty(&caps[2])));
        }
    }

    parse_generic(text)
}

fn parse_paytm(text: &str) -> Result<ExtractedFields, NotificationError> {
    if let Some(caps) = PAYTM_PAID.captures(text) {
        if let Some(amount) = parse_amount(&caps[1]) {
            let lower = text.to_lowercase();
            let direction = if lower.contains("received") || lower.contains("credited") {
                Direction::Income
            } else {
                Direction::Expense
            };
            return Ok(app_fields(direction, amount, counterparty_from_text(text)));
        }
    }

    parse_generic(text)
}

/// Keyword-driven fallback for any app. Direction is inferred from the
/// presence of characteristic keyword sets; when both or neither set is
/// present, only an explicit success phrasing rescues the event.
fn parse_generic(text: &str) -> Result<ExtractedFields, NotificationError> {
    let lower = text.to_lowercase();

    let looks_income = lower.contains("received")
        || lower.contains("credited")
        || lower.contains("got")
        || lower.contains("from");
    let looks_expense = lower.contains("paid")
        || lower.contains("sent")
        || lower.contains("debited")
        || lower.contains("to ");

    let direction = match (looks_income, looks_expense) {
        (true, false) => Direction::Income,
        (false, true) => Direction::Expense,
        _ => {
            if lower.contains("payment successful") || lower.contains("transaction successful") {
                Direction::Expense
            } else {
                log::debug!("ambiguous notification direction: {}", text);
                return Err(NotificationError::AmbiguousDirection);
            }
        }
    };

    let amount = AMOUNT_SYMBOL_BEFORE
        .captures(text)
        .or_else(|| AMOUNT_SYMBOL_AFTER.captures(text))
        .and_then(|caps| parse_amount(&caps[1]))
        .ok_or(NotificationError::NoMatch)?;

    let mut fields = ExtractedFields::new(direction, amount);
    fields.merchant = Some(counterparty_from_text(text));
    fields.confidence = GENERIC_CONFIDENCE;
    Ok(fields)
}

fn app_fields(direction: Direction, amount: f64, counterparty: String) -> ExtractedFields {
    let mut fields = ExtractedFields::new(direction, amount);
    fields.merchant = Some(counterparty);
    fields.confidence = APP_CONFIDENCE;
    fields
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value > 0.0 => Some(value),
        _ => None,
    }
}

/// Clean a captured counterparty: strip trailing "via/on/using ..." clauses
/// and UPI handles, bound the length, and fall back to a generic label.
fn clean_counterparty(raw: &str) -> String {
    static VIA_CLAUSE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*\bvia\s+.*$").expect("invalid via pattern"));
    static ON_CLAUSE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*\bon\s+.*$").expect("invalid on pattern"));
    static USING_CLAUSE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s*\busing\s+.*$").expect("invalid using pattern"));
    static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@.*$").expect("invalid handle pattern"));

    let mut cleaned = raw.trim().to_string();
    for pattern in [&VIA_CLAUSE, &ON_CLAUSE, &USING_CLAUSE, &HANDLE] {
        cleaned = pattern.replace(&cleaned, "").to_string();
    }
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return DEFAULT_COUNTERPARTY.to_string();
    }
    if cleaned.chars().count() > MERCHANT_MAX_LEN {
        let truncated: String = cleaned.chars().take(MERCHANT_MAX_LEN - 3).collect();
        return format!("{}...", truncated.trim_end());
    }
    cleaned.to_string()
}

fn counterparty_from_text(text: &str) -> String {
    if let Some(caps) = COUNTERPARTY_TO.captures(text) {
        return clean_counterparty(&caps[1]);
    }
    if let Some(caps) = COUNTERPARTY_FROM.captures(text) {
        return clean_counterparty(&caps[1]);
    }
    DEFAULT_COUNTERPARTY.to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpay_paid_you() {
        let fields = extract(PaymentApp::GooglePay, "MANO RAJKUMAR paid you ₹250.00")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Income);
        assert!((fields.amount - 250.00).abs() < 0.01);
        assert_eq!(fields.merchant.as_deref(), Some("MANO RAJKUMAR"));
    }

    #[test]
    fn test_gpay_you_paid() {
        let fields = extract(PaymentApp::GooglePay, "You paid Amma Mess ₹120.00")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 120.00).abs() < 0.01);
        assert_eq!(fields.merchant.as_deref(), Some("Amma Mess"));
    }

    #[test]
    fn test_gpay_paid_to() {
        let fields = extract(PaymentApp::GooglePay, "Paid ₹250.00 to Amma Mess")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 250.00).abs() < 0.01);
        assert_eq!(fields.merchant.as_deref(), Some("Amma Mess"));
    }

    #[test]
    fn test_gpay_received_from() {
        let fields = extract(PaymentApp::GooglePay, "Received ₹500.00 from KISHORE SENTHIL")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Income);
        assert_eq!(fields.merchant.as_deref(), Some("KISHORE SENTHIL"));
    }

    #[test]
    fn test_phonepe_payment_successful() {
        let fields = extract(PaymentApp::PhonePe, "Payment of ₹89.00 successful")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 89.00).abs() < 0.01);
    }

    #[test]
    fn test_phonepe_received() {
        let fields = extract(PaymentApp::PhonePe, "Received ₹1,200.00 from RAVI KUMAR")
            .expect("should parse");

        assert_eq!(fields.direction, Direction::Income);
        assert!((fields.amount - 1200.00).abs() < 0.01);
        assert_eq!(fields.merchant.as_deref(), Some("RAVI KUMAR"));
    }

    #[test]
    fn test_paytm_paid_with_received_keyword() {
        let fields = extract(PaymentApp::Paytm, "Payment Rs.300.00 received from customer")
            .expect("should parse");
        assert_eq!(fields.direction, Direction::Income);
    }

    #[test]
    fn test_generic_expense() {
        let fields = extract(PaymentApp::Other, "Paid ₹45 at station kiosk").expect("should parse");
        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 45.0).abs() < 0.01);
    }

    #[test]
    fn test_generic_ambiguous_direction() {
        // Both keyword families present, no success phrasing.
        let result = extract(PaymentApp::Other, "Paid ₹100 received from wallet top-up");
        assert_eq!(result, Err(NotificationError::AmbiguousDirection));
    }

    #[test]
    fn test_generic_success_tiebreak() {
        let fields = extract(PaymentApp::Other, "Transaction successful ₹75.00")
            .expect("success phrasing should imply expense");
        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_generic_no_amount() {
        let result = extract(PaymentApp::Other, "Payment successful. Thank you!");
        assert_eq!(result, Err(NotificationError::NoMatch));
    }

    #[test]
    fn test_symbol_after_amount() {
        let fields = extract(PaymentApp::Other, "Debited 350.00 INR").expect("should parse");
        assert_eq!(fields.direction, Direction::Expense);
        assert!((fields.amount - 350.0).abs() < 0.01);
    }

    #[test]
    fn test_counterparty_cleanup() {
        assert_eq!(clean_counterparty("Mano Rajkumar via Google Pay"), "Mano Rajkumar");
        assert_eq!(clean_counterparty("shop using UPI"), "shop");
        assert_eq!(clean_counterparty("kishore@okaxis"), "kishore");
        assert_eq!(clean_counterparty("  "), "UPI Payment");

        let long = "A".repeat(80);
        let cleaned = clean_counterparty(&long);
        assert_eq!(cleaned.chars().count(), 50);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_app_dispatch_from_package() {
        assert_eq!(
            PaymentApp::from_package("com.google.android.apps.nbu.paisa.user"),
            PaymentApp::GooglePay
        );
        assert_eq!(PaymentApp::from_package("com.phonepe.app"), PaymentApp::PhonePe);
        assert_eq!(PaymentApp::from_package("net.one97.paytm"), PaymentApp::Paytm);
        assert_eq!(
            PaymentApp::from_package("in.org.npci.upiapp"),
            PaymentApp::Other
        );
    }
}
