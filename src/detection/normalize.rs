/// Minimum length of a usable plate string after cleaning
pub const MIN_PLATE_LEN: usize = 4;

/// Letter-for-digit swaps commonly produced by OCR, applied in order.
const SUBSTITUTIONS: [(char, char); 2] = [('O', '0'), ('I', '1')];

/// Uppercase the input and drop everything except `A-Z` and `0-9`.
pub fn clean(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Clean the text and correct sporadic OCR confusions.
///
/// A substitution only fires when the character occurs fewer than `len / 2`
/// times, so a plate that genuinely consists mostly of that letter is left
/// alone. Returns an empty string when fewer than four characters survive.
///
/// The ratio rule is a heuristic: a plate with a real `O` or `I` in a minority
/// position is rewritten to digits. It trades precision on those plates for
/// recall on the far more common misread.
pub fn normalize(raw: &str) -> String {
    let mut cleaned = clean(raw);
    let len = cleaned.len();

    for (from, to) in SUBSTITUTIONS {
        let count = cleaned.chars().filter(|c| *c == from).count();
        if count < len / 2 {
            cleaned = cleaned.replace(from, &to.to_string());
        }
    }

    if cleaned.len() < MIN_PLATE_LEN {
        return String::new();
    }
    cleaned
}
