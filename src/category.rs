// Category inference from merchant names using keyword matching.
//
// The table order is part of the contract: a merchant matching several
// categories always resolves to the first one in the list.

use once_cell::sync::Lazy;
use regex::Regex;

pub const FOOD_DINING: &str = "Food & Dining";
pub const GROCERIES: &str = "Groceries";
pub const TRANSPORT: &str = "Transport";
pub const SHOPPING: &str = "Shopping";
pub const ENTERTAINMENT: &str = "Entertainment";
pub const BILLS_UTILITIES: &str = "Bills & Utilities";
pub const HEALTH: &str = "Health";
pub const PERSONAL_CARE: &str = "Personal Care";
pub const EDUCATION: &str = "Education";
pub const TRAVEL: &str = "Travel";
pub const TRANSFERS: &str = "Transfers";
pub const OTHER: &str = "Other";

/// Keyword alternations per category, first match wins.
static CATEGORY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let table: Vec<(&str, &str)> = vec![
        (
            FOOD_DINING,
            "SWIGGY|ZOMATO|DOMINOS|PIZZA|MCDONALDS|KFC|BURGER|STARBUCKS|CAFE|\
             RESTAURANT|FOOD|DINE|DINING|BIRYANI|CHAAYOS|SUBWAY|DUNKIN|\
             BARBEQUE|BBQ|HALDIRAM|SARAVANA|BHAVAN|MESS|CANTEEN|EATERY|\
             BASKIN|ICE.?CREAM|NATURALS|AMUL|CHAAT|BAKERY|SWEET|MITHAI",
        ),
        (
            GROCERIES,
            "BIGBASKET|BLINKIT|ZEPTO|DUNZO|GROFERS|JIOMART|DMART|RELIANCE.?FRESH|\
             MORE|SPAR|STAR.?BAZAAR|NATURE.?BASKET|EASYDAY|SUPER.?MARKET|\
             SPENCER|KIRANA|GROCERY|PROVISION|VEGETABLES|FRUITS|MILK|DAIRY|\
             RATNADEEP|METRO.?CASH|COSTCO|LULU",
        ),
        (
            TRANSPORT,
            "UBER|OLA|RAPIDO|METRO|IRCTC|REDBUS|ABSBUS|MAKEMYTRIP|\
             PETROL|DIESEL|FUEL|HP.?PETROL|BHARAT.?PETROL|INDIAN.?OIL|\
             FASTAG|TOLL|PARKING|GARAGE|AUTO|TAXI|CAB|\
             GOIBIBO|CLEARTRIP|YATRA|BUS|TRAIN|RAILWAY",
        ),
        (
            SHOPPING,
            "AMAZON|FLIPKART|MYNTRA|AJIO|NYKAA|MEESHO|SNAPDEAL|SHOPCLUES|\
             TATA.?CLQ|FIRST.?CRY|CROMA|RELIANCE.?DIGITAL|VIJAY.?SALES|\
             DECATHLON|PUMA|NIKE|ADIDAS|ZARA|H.?M|UNIQLO|LIFESTYLE|\
             WESTSIDE|PANTALOONS|MAX|TRENDS|SHOPPERS.?STOP|CENTRAL|\
             LENSKART|TITAN|TANISHQ|KALYAN|MALABAR|JEWEL|WATCH",
        ),
        (
            ENTERTAINMENT,
            "NETFLIX|HOTSTAR|PRIME.?VIDEO|SPOTIFY|GAANA|WYNK|JIOSAVN|\
             BOOKMYSHOW|PVR|INOX|CINEPOLIS|MOVIE|CINEMA|THEATRE|\
             PLAYSTATION|XBOX|STEAM|GOOGLE.?PLAY|APP.?STORE|\
             DREAM11|MPL|GAMES|GAMING|CONCERT|EVENT|TICKET",
        ),
        (
            BILLS_UTILITIES,
            "ELECTRICITY|BESCOM|CESC|TATA.?POWER|ADANI.?POWER|RELIANCE.?ENERGY|\
             JIO.?FIBER|AIRTEL|VODAFONE|BSNL|ACT.?FIBERNET|HATHWAY|TATA.?SKY|\
             GAS|INDANE|BHARAT.?GAS|HP.?GAS|WATER|SEWAGE|\
             BILL.?PAYMENT|RECHARGE|DTH|BROADBAND|INTERNET|POSTPAID|PREPAID",
        ),
        (
            HEALTH,
            "APOLLO|MEDPLUS|NETMEDS|PHARMEASY|1MG|TATA.?1MG|\
             HOSPITAL|CLINIC|DOCTOR|DIAGNOSTIC|LAB|PATHOLOGY|\
             PHARMACY|MEDICAL|MEDICINE|HEALTH|WELLNESS|\
             GYM|FITNESS|CULT|GOLD.?GYM|YOGA|INSURANCE|\
             PRACTO|LYBRATE|MFINE|THYROCARE",
        ),
        (
            PERSONAL_CARE,
            "SALON|SPA|PARLOUR|BEAUTY|BARBER|HAIRCUT|\
             LAKME|NATURALS|JAWED.?HABIB|LOOKS|BODYCRAFT|\
             URBAN.?COMPANY|URBAN.?CLAP|GROOMING",
        ),
        (
            EDUCATION,
            "SCHOOL|COLLEGE|UNIVERSITY|TUITION|COACHING|\
             BYJU|UNACADEMY|VEDANTU|COURSERA|UDEMY|\
             BOOKS|STATIONERY|LIBRARY|EDUCATION|ACADEMIC|\
             UPGRAD|SIMPLILEARN|GREAT.?LEARNING",
        ),
        (
            TRAVEL,
            "HOTEL|OYO|TREEBO|FABHOTEL|TAJ|OBEROI|ITC|MARRIOTT|\
             AIRBNB|HOSTEL|RESORT|LODGE|BOOKING.?COM|\
             INDIGO|SPICEJET|AIRINDIA|VISTARA|AKASA|\
             FLIGHT|AIRLINE|AIRPORT|VISA|PASSPORT",
        ),
        (
            TRANSFERS,
            "IMPS|NEFT|RTGS|UPI|TRANSFER|SENT.?TO|PAID.?TO",
        ),
    ];

    table
        .into_iter()
        .map(|(name, keywords)| {
            let regex = Regex::new(keywords).expect("invalid category keywords");
            (name, regex)
        })
        .collect()
});

/// Detect the category for a merchant name. Absent or unmatched merchants
/// classify as Other; strings shaped like personal names classify as
/// Transfers (person-to-person payments).
pub fn detect(merchant: Option<&str>) -> &'static str {
    let Some(merchant) = merchant else {
        return OTHER;
    };
    let merchant = merchant.trim();
    if merchant.is_empty() {
        return OTHER;
    }

    // Uppercase with punctuation collapsed to spaces before matching.
    let normalized: String = merchant
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    for (name, pattern) in CATEGORY_PATTERNS.iter() {
        if pattern.is_match(&normalized) {
            return name;
        }
    }

    if looks_like_personal_name(merchant) {
        return TRANSFERS;
    }

    OTHER
}

/// 2-3 space-separated alphabetic tokens within a bounded length, e.g.
/// "MANO RAJKUMAR". Typical of person-to-person UPI counterparties.
fn looks_like_personal_name(merchant: &str) -> bool {
    if merchant.len() > 30 {
        return false;
    }
    let tokens: Vec<&str> = merchant.split_whitespace().collect();
    (2..=3).contains(&tokens.len())
        && tokens
            .iter()
            .all(|t| !t.is_empty() && t.chars().all(|c| c.is_alphabetic()))
}

/// Material icon identifier for a category name.
pub fn icon(category: &str) -> &'static str {
    match category {
        c if c == FOOD_DINING => "restaurant",
        c if c == GROCERIES => "local_grocery_store",
        c if c == TRANSPORT => "directions_car",
        c if c == SHOPPING => "shopping_bag",
        c if c == ENTERTAINMENT => "movie",
        c if c == BILLS_UTILITIES => "receipt",
        c if c == HEALTH => "local_hospital",
        c if c == PERSONAL_CARE => "spa",
        c if c == EDUCATION => "school",
        c if c == TRAVEL => "flight",
        c if c == TRANSFERS => "swap_horiz",
        _ => "category",
    }
}

/// Hex color for a category name.
pub fn color(category: &str) -> &'static str {
    match category {
        c if c == FOOD_DINING => "#EF4444",
        c if c == GROCERIES => "#84CC16",
        c if c == TRANSPORT => "#F59E0B",
        c if c == SHOPPING => "#8B5CF6",
        c if c == ENTERTAINMENT => "#EC4899",
        c if c == BILLS_UTILITIES => "#3B82F6",
        c if c == HEALTH => "#10B981",
        c if c == PERSONAL_CARE => "#F472B6",
        c if c == EDUCATION => "#6366F1",
        c if c == TRAVEL => "#14B8A6",
        c if c == TRANSFERS => "#64748B",
        _ => "#6B7280",
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_categories() {
        let cases = [
            ("SWIGGY", FOOD_DINING),
            ("ZOMATO", FOOD_DINING),
            ("UBER INDIA", TRANSPORT),
            ("OLA CABS", TRANSPORT),
            ("AMAZON", SHOPPING),
            ("FLIPKART", SHOPPING),
            ("NETFLIX", ENTERTAINMENT),
            ("SPOTIFY", ENTERTAINMENT),
            ("APOLLO PHARMACY", HEALTH),
            ("IRCTC", TRANSPORT),
            ("ELECTRICITY BILL", BILLS_UTILITIES),
            ("BIGBASKET", GROCERIES),
            ("OYO ROOMS", TRAVEL),
            ("BYJU CLASSES", EDUCATION),
        ];
        for (merchant, expected) in cases {
            assert_eq!(detect(Some(merchant)), expected, "category for {}", merchant);
        }
    }

    #[test]
    fn test_punctuated_merchant_normalized() {
        assert_eq!(detect(Some("swiggy*order-8812")), FOOD_DINING);
        assert_eq!(detect(Some("AMAZON PAY INDIA PVT LT")), SHOPPING);
    }

    #[test]
    fn test_personal_name_is_transfer() {
        assert_eq!(detect(Some("MANO RAJKUMAR")), TRANSFERS);
        assert_eq!(detect(Some("P S GOVINDAS")), TRANSFERS);
        assert_eq!(detect(Some("JOHN DOE")), TRANSFERS);
    }

    #[test]
    fn test_transfer_rail_tokens() {
        assert_eq!(detect(Some("UPI-DR/5671")), TRANSFERS);
        assert_eq!(detect(Some("IMPS 1234")), TRANSFERS);
    }

    #[test]
    fn test_unknown_falls_back_to_other() {
        assert_eq!(detect(Some("XK9 ENTERPRISES LLP 2024")), OTHER);
        assert_eq!(detect(None), OTHER);
        assert_eq!(detect(Some("   ")), OTHER);
    }

    #[test]
    fn test_order_is_stable() {
        // NATURALS appears in both Food & Dining and Personal Care; the
        // earlier entry must win.
        assert_eq!(detect(Some("NATURALS")), FOOD_DINING);
    }

    #[test]
    fn test_icon_and_color_tables() {
        assert_eq!(icon(FOOD_DINING), "restaurant");
        assert_eq!(color(FOOD_DINING), "#EF4444");
        assert_eq!(icon(TRANSFERS), "swap_horiz");
        assert_eq!(color(OTHER), "#6B7280");
        assert_eq!(icon("Nonsense"), "category");
    }
}
