//! Spelled-out numbers → numerals.
//!
//! Documents typed on old ledgers spell amounts and rates out in words
//! ("FOURTEEN POINT SEVENTY FOUR PERCENT"), and the OCR service transcribes
//! them verbatim when asked for strings. Two paths turn those into numbers:
//!
//! * [`convert_number_phrases`] rewrites every number phrase embedded in free
//!   text, leaving other words alone. [`parse_quantity`] builds on it for
//!   percentages and periods.
//! * [`parse_currency`] reads a whole string as one amount of money.
//!
//! Neither path fails: text that does not parse comes back as
//! [`PhraseValue::Text`] so callers can still print it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Result of reading a phrase as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PhraseValue {
    /// The phrase parsed.
    Number(f64),
    /// The phrase did not parse; the original text is preserved.
    Text(String),
}

impl PhraseValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PhraseValue::Number(n) => Some(*n),
            PhraseValue::Text(_) => None,
        }
    }
}

const POINT: &str = "POINT";

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_PERCENT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bPERCENT\b").unwrap());
static RE_THOUSANDS_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());
static RE_CURRENCY_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:AND|DOLLARS?|USD)\b").unwrap());
// OCR regularly splits HUNDRED with a stray space.
static RE_BROKEN_HUNDRED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bHUN\s+DRED\b|\bHUND\s+RED\b|\bHUNDR\s+ED\b|\bHUNDRE\s+D\b").unwrap());

/// Replace every number phrase in `text` with its numeral.
///
/// ```
/// use mortgage_extract::pipeline::words::convert_number_phrases;
///
/// assert_eq!(convert_number_phrases("twenty three %"), "23");
/// assert_eq!(convert_number_phrases("FOURTEEN AND SEVENTY FOUR"), "14.74");
/// assert_eq!(convert_number_phrases("THIRTY YEARS"), "30 YEARS");
/// ```
pub fn convert_number_phrases(text: &str) -> String {
    let upper = text.to_uppercase().replace('%', "");
    let upper = RE_PERCENT_WORD.replace_all(&upper, " ");
    let normalised = format!(" {} ", upper.trim())
        .replace(" AND ", " POINT ")
        .replace('.', " POINT ");
    let tokens: Vec<&str> = normalised.split_whitespace().collect();

    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut pos = 0;
    while pos < tokens.len() {
        match longest_phrase_at(&tokens, pos) {
            Some((numeral, consumed)) => {
                out.push(numeral);
                pos += consumed;
            }
            None => {
                out.push(tokens[pos].to_string());
                pos += 1;
            }
        }
    }
    out.join(" ")
}

/// Read a percentage or period field.
///
/// The phrase is converted first; the result is the whole string as a number,
/// or the one numeric token when exactly one is present (`"15 YEARS"`).
pub fn parse_quantity(text: &str) -> PhraseValue {
    let converted = convert_number_phrases(text);
    if let Some(n) = parse_finite(&converted) {
        return PhraseValue::Number(n);
    }
    let mut numbers = converted.split_whitespace().filter_map(parse_finite);
    match (numbers.next(), numbers.next()) {
        (Some(n), None) => PhraseValue::Number(n),
        _ => PhraseValue::Text(text.to_string()),
    }
}

/// Read a whole string as an amount of money.
///
/// Currency symbols, thousands separators, `AND` and `DOLLARS` are dropped and
/// split `HUNDRED`s are repaired before parsing. Anything that still does not
/// parse is returned untouched as [`PhraseValue::Text`].
pub fn parse_currency(text: &str) -> PhraseValue {
    let upper = text.to_uppercase();
    let cleaned: String = upper
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£'))
        .collect();
    let cleaned = RE_THOUSANDS_SEP.replace_all(&cleaned, "");
    let cleaned = RE_CURRENCY_WORDS.replace_all(&cleaned, " ");
    let cleaned = RE_BROKEN_HUNDRED.replace_all(&cleaned, "HUNDRED");
    let cleaned = cleaned.replace('.', " POINT ");
    let cleaned = RE_WHITESPACE.replace_all(cleaned.trim(), " ");

    let tokens: Vec<&str> = cleaned.split(' ').filter(|t| !t.is_empty()).collect();
    match parse_phrase(&tokens).as_deref().and_then(parse_finite) {
        Some(n) => PhraseValue::Number(n),
        None => {
            tracing::debug!("currency phrase left as text: {:?}", text);
            PhraseValue::Text(text.to_string())
        }
    }
}

// `f64::from_str` accepts "NaN" and "inf", which are never amounts.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Try spans starting at `pos`, longest first. Returns the numeral and the
/// number of tokens it consumed.
fn longest_phrase_at(tokens: &[&str], pos: usize) -> Option<(String, usize)> {
    (pos + 1..=tokens.len())
        .rev()
        .find_map(|end| parse_phrase(&tokens[pos..end]).map(|n| (n, end - pos)))
}

/// Parse a complete number phrase: an integer part with an optional
/// `POINT <fraction>`, which may itself be scaled (`ONE POINT FIVE MILLION`).
/// Returns the numeral as a string so digits such as `05` survive.
fn parse_phrase(tokens: &[&str]) -> Option<String> {
    let Some(split) = tokens.iter().position(|&t| t == POINT) else {
        return parse_whole(tokens);
    };
    let (whole, rest) = (&tokens[..split], &tokens[split + 1..]);

    let Some(k) = rest.iter().position(|t| is_multiplier(t)) else {
        let whole = parse_whole(whole)?;
        let fraction = parse_fraction(rest)?;
        return Some(format!("{whole}.{fraction}"));
    };

    // The scale applies to the whole decimal, so the integer part is plain.
    if whole.iter().any(|t| is_multiplier(t)) {
        return None;
    }
    let whole = parse_whole(whole)?;
    let fraction = parse_fraction(&rest[..k])?;
    let exponent = multiplier_exponent(&rest[k..])?;
    Some(shift_decimal(&whole, &fraction, exponent))
}

/// Integer part of a phrase. A lone numeral is kept verbatim (`007`).
fn parse_whole(tokens: &[&str]) -> Option<String> {
    match tokens {
        [t] if is_numeral(t) => Some((*t).to_string()),
        _ => parse_integer(tokens).map(|n| n.to_string()),
    }
}

fn parse_fraction(tokens: &[&str]) -> Option<String> {
    match tokens {
        [] => None,
        _ if tokens.iter().any(|t| is_multiplier(t)) => None,
        [t] if is_numeral(t) => Some((*t).to_string()),
        _ if tokens.iter().all(|t| digit_word(t).is_some()) => {
            tokens.iter().map(|t| digit_word(t)).collect()
        }
        _ => parse_integer(tokens).map(|n| n.to_string()),
    }
}

fn is_multiplier(token: &str) -> bool {
    token == "HUNDRED" || scale_word(token).is_some()
}

/// Power of ten named by a trailing `HUNDRED`, scale word, or `HUNDRED <scale>`.
fn multiplier_exponent(tokens: &[&str]) -> Option<usize> {
    let scale_exponent = |t: &str| match t {
        "THOUSAND" => Some(3),
        "MILLION" => Some(6),
        "BILLION" => Some(9),
        _ => None,
    };
    match tokens {
        ["HUNDRED"] => Some(2),
        ["HUNDRED", scale] => scale_exponent(scale).map(|e| e + 2),
        [scale] => scale_exponent(scale),
        _ => None,
    }
}

/// `whole.fraction × 10^exponent`, moving the decimal point on the digits
/// themselves so no binary rounding creeps in.
fn shift_decimal(whole: &str, fraction: &str, exponent: usize) -> String {
    let digits = format!("{whole}{fraction}");
    let point = whole.len() + exponent;
    let (int_part, frac_part) = if digits.len() <= point {
        (format!("{digits}{}", "0".repeat(point - digits.len())), String::new())
    } else {
        (digits[..point].to_string(), digits[point..].to_string())
    };

    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Numeral,
    Unit,
    Teen,
    Tens,
    Hundred,
    Scale,
}

/// Parse a well-formed cardinal: `THREE HUNDRED TWENTY ONE THOUSAND FIVE`.
///
/// Rejects sequences that merely sum to something (`FOUR FOURTEEN`) so the
/// longest-match scan does not glue unrelated numbers together.
fn parse_integer(tokens: &[&str]) -> Option<u64> {
    match tokens {
        [] => return None,
        [t] if *t == "ZERO" => return Some(0),
        _ => {}
    }

    let mut total: u64 = 0;
    let mut group: u64 = 0;
    let mut last = Last::Start;
    let mut last_scale = u64::MAX;
    let mut group_has_hundred = false;

    for &token in tokens {
        if is_numeral(token) {
            if last != Last::Start && last != Last::Scale {
                return None;
            }
            group = token.parse().ok()?;
            last = Last::Numeral;
        } else if let Some(v) = unit_word(token) {
            if !matches!(last, Last::Start | Last::Tens | Last::Hundred | Last::Scale) {
                return None;
            }
            group += v;
            last = Last::Unit;
        } else if let Some(v) = teen_word(token) {
            if !matches!(last, Last::Start | Last::Hundred | Last::Scale) {
                return None;
            }
            group += v;
            last = Last::Teen;
        } else if let Some(v) = tens_word(token) {
            if !matches!(last, Last::Start | Last::Hundred | Last::Scale) {
                return None;
            }
            group += v;
            last = Last::Tens;
        } else if token == "HUNDRED" {
            if group_has_hundred || group == 0 || group >= 100 {
                return None;
            }
            if !matches!(last, Last::Unit | Last::Teen | Last::Numeral) {
                return None;
            }
            group *= 100;
            group_has_hundred = true;
            last = Last::Hundred;
        } else if let Some(scale) = scale_word(token) {
            if group == 0 || scale >= last_scale || matches!(last, Last::Start | Last::Scale) {
                return None;
            }
            total = total.checked_add(group.checked_mul(scale)?)?;
            group = 0;
            group_has_hundred = false;
            last_scale = scale;
            last = Last::Scale;
        } else {
            return None;
        }
    }

    total.checked_add(group)
}

fn is_numeral(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn digit_word(token: &str) -> Option<char> {
    match token {
        "ZERO" => Some('0'),
        "OH" => Some('0'),
        _ => unit_word(token).and_then(|v| char::from_digit(v as u32, 10)),
    }
}

fn unit_word(token: &str) -> Option<u64> {
    Some(match token {
        "ONE" => 1,
        "TWO" => 2,
        "THREE" => 3,
        "FOUR" => 4,
        "FIVE" => 5,
        "SIX" => 6,
        "SEVEN" => 7,
        "EIGHT" => 8,
        "NINE" => 9,
        _ => return None,
    })
}

fn teen_word(token: &str) -> Option<u64> {
    Some(match token {
        "TEN" => 10,
        "ELEVEN" => 11,
        "TWELVE" => 12,
        "THIRTEEN" => 13,
        "FOURTEEN" => 14,
        "FIFTEEN" => 15,
        "SIXTEEN" => 16,
        "SEVENTEEN" => 17,
        "EIGHTEEN" => 18,
        "NINETEEN" => 19,
        _ => return None,
    })
}

fn tens_word(token: &str) -> Option<u64> {
    Some(match token {
        "TWENTY" => 20,
        "THIRTY" => 30,
        "FORTY" => 40,
        "FIFTY" => 50,
        "SIXTY" => 60,
        "SEVENTY" => 70,
        "EIGHTY" => 80,
        "NINETY" => 90,
        _ => return None,
    })
}

fn scale_word(token: &str) -> Option<u64> {
    Some(match token {
        "THOUSAND" => 1_000,
        "MILLION" => 1_000_000,
        "BILLION" => 1_000_000_000,
        _ => return None,
    })
}
