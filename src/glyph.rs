// Unicode glyph normalization.
//
// Some SMS gateways transmit bank messages in styled mathematical Latin
// characters that look like plain letters but occupy supplementary-plane
// code points (e.g. 𝖸𝗈𝗎𝗋 instead of Your), which defeats ASCII pattern
// matching. Each styled alphabet is a contiguous block of 26 uppercase
// letters immediately followed by 26 lowercase letters, so the mapping back
// to ASCII is fixed offset arithmetic.

/// Styled Latin alphabet blocks: (first uppercase code point, first
/// lowercase code point).
const STYLED_RANGES: [(u32, u32); 4] = [
    (0x1D400, 0x1D41A), // mathematical bold
    (0x1D5A0, 0x1D5BA), // mathematical sans-serif
    (0x1D5D4, 0x1D5EE), // mathematical sans-serif bold
    (0x1D608, 0x1D622), // mathematical sans-serif italic
];

/// Map styled Latin code points back to plain ASCII. Code points outside
/// all known ranges and outside the basic multilingual plane are replaced
/// with a single space; everything else passes through unchanged. Never
/// fails.
pub fn normalize(text: &str) -> String {
    text.chars().map(normalize_char).collect()
}

fn normalize_char(c: char) -> char {
    let cp = c as u32;

    for (upper_start, lower_start) in STYLED_RANGES {
        if cp >= upper_start && cp < upper_start + 26 {
            return char::from(b'A' + (cp - upper_start) as u8);
        }
        if cp >= lower_start && cp < lower_start + 26 {
            return char::from(b'a' + (cp - lower_start) as u8);
        }
    }

    // Unmapped supplementary-plane glyph: fail safe, never concatenate
    // unrelated characters.
    if cp > 0xFFFF {
        return ' ';
    }
    c
}

// ============================================================================
// TESTS
// ============================================================================
