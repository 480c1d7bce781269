// 📨 SMS pattern engine
// Ordered debit/credit pattern tables with per-pattern capture-group
// mappings, plus secondary single-purpose extractors for the fields the
// winning pattern did not provide.
//
// Ordering is a correctness property: institution-specific multi-field
// patterns come first so that a generic amount-only pattern cannot swallow
// a message that carries merchant and account data.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Direction, ExtractedFields};

const SMS_CONFIDENCE: f64 = 0.90;

// ============================================================================
// PRIMARY PATTERNS
// ============================================================================

/// Which capture group holds which semantic field. Differs per pattern and
/// is encoded alongside it, never inferred from list position.
struct FieldMap {
    amount: usize,
    account: Option<usize>,
    merchant: Option<usize>,
}

struct SmsPattern {
    regex: Regex,
    fields: FieldMap,
}

impl SmsPattern {
    fn new(pattern: &str, amount: usize, account: Option<usize>, merchant: Option<usize>) -> Self {
        SmsPattern {
            regex: Regex::new(pattern).expect("invalid sms pattern"),
            fields: FieldMap { amount, account, merchant },
        }
    }
}

/// Expense patterns, most specific first.
static DEBIT_PATTERNS: Lazy<Vec<SmsPattern>> = Lazy::new(|| {
    vec![
        // IOB payee phrasing: "Your a/c XXXXX95 debited for payee SWIGGY for Rs. 350.00"
        SmsPattern::new(
            r"(?i)(?:Your\s+)?a/c\s*[xX*]*(\d{2,4})\s*debited\s*for\s*payee\s+(.+?)\s+for\s+Rs\.?\s*([\d,]+\.?\d*)",
            3,
            Some(1),
            Some(2),
        ),
        // "Rs.499.00 debited from A/c **4532"
        SmsPattern::new(
            r"(?i)Rs\.?\s*([\d,]+\.?\d*)\s*(?:debited|withdrawn|spent|paid)\s*(?:from)?\s*(?:A/c|Acct?)?\s*\*{0,2}(\d{4})",
            1,
            Some(2),
            None,
        ),
        // "debited by Rs.500 from A/c XXXX1234"
        SmsPattern::new(
            r"(?i)(?:debited|withdrawn)\s*(?:by|for)?\s*Rs\.?\s*([\d,]+\.?\d*).*?A/c\s*[xX*]+(\d{4})",
            1,
            Some(2),
            None,
        ),
        // "Rs 1,500 debited from your Account"
        SmsPattern::new(
            r"(?i)Rs\.?\s*([\d,]+\.?\d*)\s*(?:debited|spent|paid)\s*(?:from)?\s*(?:your)?\s*(?:Account|Card)",
            1,
            None,
            None,
        ),
        // "Paid Rs.250 to merchant@upi"
        SmsPattern::new(
            r"(?i)(?:Paid|Sent|Transferred)\s*Rs\.?\s*([\d,]+\.?\d*)\s*(?:to|for)\s*(\S+)",
            1,
            None,
            Some(2),
        ),
        // "spent Rs.1234 at AMAZON"
        SmsPattern::new(
            r"(?i)(?:spent|charged|transaction)\s*(?:of)?\s*Rs\.?\s*([\d,]+\.?\d*).*?(?:at|on)\s+([A-Za-z0-9\s]+)",
            1,
            None,
            Some(2),
        ),
        // "Rs.5999.00 debited from A/c **4532 on 01-01-26 to FLIPKART. Avl..."
        SmsPattern::new(
            r"(?i)Rs\.?\s*([\d,]+\.?\d*)\s*debited.*?A/c\s*\**(\d{4}).*?(?:to|at|for)\s+([A-Za-z0-9\s]+?)(?:\.\s*|\s+Avl)",
            1,
            Some(2),
            Some(3),
        ),
        // Generic fallback: "INR 500.00 debited"
        SmsPattern::new(
            r"(?i)(?:INR|Rs\.?)\s*([\d,]+\.?\d*)\s*(?:has been)?\s*(?:debited|deducted|withdrawn)",
            1,
            None,
            None,
        ),
    ]
});

/// Income patterns, most specific first.
static CREDIT_PATTERNS: Lazy<Vec<SmsPattern>> = Lazy::new(|| {
    vec![
        // IOB UPI credit: "a/c no. XXXXX95 is credited by Rs.1000.00 ... from SENDER-upi@bank"
        SmsPattern::new(
            r"(?i)a/c\s*(?:no\.?)?\s*[xX*]*(\d{2,4})\s*is\s*credited\s*by\s*Rs\.?\s*([\d,]+\.?\d*).*?from\s+([^(]+)",
            2,
            Some(1),
            Some(3),
        ),
        // "Rs.5000.00 credited to A/c **4532"
        SmsPattern::new(
            r"(?i)Rs\.?\s*([\d,]+\.?\d*)\s*(?:credited|deposited|received)\s*(?:to|in)?\s*(?:A/c|Acct?)?\s*\*{0,2}(\d{4})",
            1,
            Some(2),
            None,
        ),
        // "Received Rs.500 from sender@upi"
        SmsPattern::new(
            r"(?i)(?:Received|Got|Credited)\s*Rs\.?\s*([\d,]+\.?\d*)\s*from\s*(\S+)",
            1,
            None,
            Some(2),
        ),
        // "Salary of Rs.50000 credited"
        SmsPattern::new(
            r"(?i)(?:Salary|Payment)\s*(?:of)?\s*Rs\.?\s*([\d,]+\.?\d*)\s*(?:has been)?\s*(?:credited|deposited)",
            1,
            None,
            None,
        ),
        // Generic: "credited with Rs.1000"
        SmsPattern::new(
            r"(?i)(?:credited|deposited)\s*(?:with)?\s*(?:INR|Rs\.?)\s*([\d,]+\.?\d*)",
            1,
            None,
            None,
        ),
        // "Refund of Rs.499 credited"
        SmsPattern::new(
            r"(?i)(?:Refund|Cashback)\s*(?:of)?\s*Rs\.?\s*([\d,]+\.?\d*)\s*(?:has been)?\s*(?:credited|processed)",
            1,
            None,
            None,
        ),
    ]
});

// ============================================================================
// SECONDARY EXTRACTORS
// ============================================================================

static REFERENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Labelled reference. The captured token must be at least 4 chars so
        // that "UPI Ref no 536198947755" yields the number, not "no".
        Regex::new(r"(?i)(?:UPI\s*Ref(?:\s*no\.?)?|Ref(?:erence)?(?:\s*no\.?)?|Txn\s*ID?)\s*[:.]?\s*([A-Za-z0-9]{4,})")
            .expect("invalid reference pattern"),
        // Bare 12+ digit run as fallback.
        Regex::new(r"(\d{12,})").expect("invalid reference fallback pattern"),
    ]
});

static BALANCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Avl?\.?\s*Bal(?:ance)?|Balance|Bal)\s*[:.]?\s*(?:is\s+)?(?:INR|Rs\.?)?\s*([\d,]+\.?\d*)")
        .expect("invalid balance pattern")
});

static ACCOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:A/c|Acct?|Account|Card)\s*[xX*]*\s*(\d{4})").expect("invalid account pattern")
});

static MERCHANT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(?:\b(?:at|to|from|for)|@)\s+([A-Za-z0-9@._\-]{2,})")
            .expect("invalid merchant pattern"),
        Regex::new(r"(?i)Info[\s:]+([^.]+)").expect("invalid info pattern"),
        Regex::new(r"(?i)VPA[\s:]+(\S+)").expect("invalid vpa pattern"),
    ]
});

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract transaction fields from a normalized SMS body. Debit patterns
/// are tried first, then credit patterns; within each list the first match
/// wins. Returns `None` when no pattern matches or the amount is malformed.
pub fn extract(text: &str) -> Option<ExtractedFields> {
    let mut fields = match_primary(text, &DEBIT_PATTERNS, Direction::Expense)
        .or_else(|| match_primary(text, &CREDIT_PATTERNS, Direction::Income))?;

    // Fill remaining fields from the full text, never overwriting what the
    // winning pattern already provided.
    fields.reference = extract_reference(text);
    fields.balance_after = extract_balance(text);
    if fields.account_suffix.is_none() {
        fields.account_suffix = extract_account_suffix(text);
    }
    if fields.merchant.is_none() {
        fields.merchant = extract_merchant(text);
    }
    fields.confidence = SMS_CONFIDENCE;

    log::debug!(
        "sms extraction: {} {:.2} merchant={:?} suffix={:?}",
        fields.direction.as_str(),
        fields.amount,
        fields.merchant,
        fields.account_suffix,
    );
    Some(fields)
}

fn match_primary(
    text: &str,
    patterns: &[SmsPattern],
    direction: Direction,
) -> Option<ExtractedFields> {
    for pattern in patterns {
        let Some(caps) = pattern.regex.captures(text) else {
            continue;
        };

        // First match wins; a malformed amount degrades to no-match rather
        // than falling through to a less specific pattern.
        let amount = parse_amount(caps.get(pattern.fields.amount)?.as_str())?;

        let mut fields = ExtractedFields::new(direction, amount);
        if let Some(idx) = pattern.fields.account {
            fields.account_suffix = caps.get(idx).map(|m| m.as_str().to_string());
        }
        if let Some(idx) = pattern.fields.merchant {
            fields.merchant = caps.get(idx).and_then(|m| clean_merchant(m.as_str()));
        }
        return Some(fields);
    }
    None
}

/// Strip thousands separators and parse; only positive amounts are usable.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value > 0.0 => Some(value),
        _ => None,
    }
}

fn extract_reference(text: &str) -> Option<String> {
    for pattern in REFERENCE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}

fn extract_balance(text: &str) -> Option<f64> {
    let caps = BALANCE_PATTERN.captures(text)?;
    caps[1].replace(',', "").parse::<f64>().ok()
}

fn extract_account_suffix(text: &str) -> Option<String> {
    ACCOUNT_PATTERN
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn extract_merchant(text: &str) -> Option<String> {
    for pattern in MERCHANT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Some(merchant) = clean_merchant(&caps[1]) {
                // Single characters out of the fallback extractor are noise
                // ("from A/c" would otherwise yield "A").
                if merchant.len() >= 2 {
                    return Some(merchant);
                }
            }
        }
    }
    None
}

/// Strip a trailing UPI handle and trailing punctuation from a captured
/// counterparty string.
fn clean_merchant(raw: &str) -> Option<String> {
    static HANDLE_SUFFIX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"@[a-z]+$").expect("invalid handle pattern"));
    static TRAILING_PUNCT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[._-]+$").expect("invalid punct pattern"));

    let trimmed = raw.trim();
    let without_handle = HANDLE_SUFFIX.replace(trimmed, "");
    let cleaned = TRAILING_PUNCT.replace(&without_handle, "");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
