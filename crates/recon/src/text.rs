//! Text canonicalization for product names and price strings.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a product name used for matching.
///
/// Lowercases, folds diacritics (compatibility decomposition with combining
/// marks dropped), turns everything that is not a Latin/Cyrillic letter or an
/// ASCII digit into a space and collapses whitespace. Idempotent.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let folded: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if is_name_char(c) { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || ('а'..='я').contains(&c)
}

/// Extract a price from noisy text such as `"1 234,56 ₽"`.
///
/// Only the first run of digits, whitespace, commas and periods is considered,
/// so a crossed-out old price later in the text is ignored. A run that does
/// not form a valid number yields `None`, and that includes the lone space
/// between two leading words: `parse_price("Price is 100")` is `None`.
///
/// Callers holding free-form text should narrow it to the price first.
/// `SiteExtractor` runs the site's `price_regex` over the card text and passes
/// only the match here; sites whose price cells carry leading words need a
/// pattern that starts at a digit, e.g. `\d[\d\s,.]*`.
pub fn parse_price(text: &str) -> Option<f64> {
    let s: String = text
        .nfkc()
        .map(|c| if c == '\u{202f}' || c == '\u{a0}' { ' ' } else { c })
        .collect();

    let start = s.find(is_price_char)?;
    let run: String = s[start..]
        .chars()
        .take_while(|c| is_price_char(*c))
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    run.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_price_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || c == ',' || c == '.'
}
