//!
//! Canonicalizer for SKU codes.
//!
//! Turns one raw operator-entered token into a canonical, storage-ready code
//! string. Canonical codes compare and store as exact strings.
//!
//! Pipeline:
//! 1. Replace non-breaking spaces with ordinary spaces; strip zero-width
//!    characters that sneak into pasted SKUs.
//! 2. Trim, drop interior spaces, upper-case.
//! 3. If the result is positive-exponent scientific notation (a spreadsheet
//!    export artifact, e.g. `5.6061E+11`), expand it to the plain digit
//!    string it denotes. Anything that fails to expand passes through as the
//!    cleaned text; canonicalization never errors, it only drops to "".

use regex::Regex;
use std::sync::OnceLock;

/// Zero-width characters that often sneak into copied identifiers.
const ZERO_WIDTH: [char; 5] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}',
];

/// Expansion guard: an exponent that would render more digits than this
/// takes the no-conversion fallback instead of allocating unbounded memory.
const MAX_EXPANDED_DIGITS: usize = 4096;

fn sci_notation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Whole-string anchored: only digits, an optional fraction, and a
    // positive exponent convert. Negative exponents and partial matches
    // inside a longer token must pass through untouched.
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]+)(?:\.([0-9]+))?[eE]\+([0-9]+)$")
            .expect("scientific notation pattern")
    })
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,;\n]+").expect("separator pattern"))
}

/// Canonicalizes one raw token. An empty result means "drop this token".
pub fn canonicalize(raw: &str) -> String {
    let mut s = raw.replace('\u{00A0}', " ");
    s.retain(|c| !ZERO_WIDTH.contains(&c));
    let s: String = s
        .trim()
        .chars()
        .filter(|c| *c != ' ')
        .collect::<String>()
        .to_uppercase();
    if s.is_empty() {
        return s;
    }
    if let Some(caps) = sci_notation().captures(&s) {
        let frac = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if let Some(plain) = expand_scientific(&caps[1], frac, &caps[3]) {
            return plain;
        }
    }
    s
}

/// Splits a freeform operator-entered block into raw token pieces.
///
/// Pieces may be empty or dirty; feed each through [`canonicalize`].
pub fn split_block(raw: &str) -> Vec<&str> {
    separators().split(raw).collect()
}

/// Exact decimal expansion of `int.frac E+exp` into a plain digit string.
///
/// Uses digit-string point shifting rather than binary floating point, which
/// would alter trailing digits of 12-digit EAN-style codes. Reproduces the
/// rendering of an exact decimal formatter with the point dropped, so
/// `5.6061E+11` is `560610000000` and `0.05E+1` stays `05`.
fn expand_scientific(int_part: &str, frac_part: &str, exp_part: &str) -> Option<String> {
    let exp: usize = exp_part.parse().ok()?;
    let point = int_part.len().checked_add(exp)?;
    if point > MAX_EXPANDED_DIGITS {
        return None;
    }
    let digits = format!("{int_part}{frac_part}");
    if point >= digits.len() {
        // Integer value: pad with zeros up to the point position.
        let mut whole = digits;
        whole.push_str(&"0".repeat(point - whole.len()));
        Some(strip_leading_zeros(&whole).to_string())
    } else {
        // Point lands inside the digit string: the integer part loses its
        // leading zeros, the fractional digits are kept verbatim.
        let (whole, frac) = digits.split_at(point);
        Some(format!("{}{frac}", strip_leading_zeros(whole)))
    }
}

fn strip_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}
