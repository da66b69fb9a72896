use std::sync::LazyLock;

use regex::Regex;

use crate::detection::normalize::{MIN_PLATE_LEN, clean};

pub const MAX_PLATE_LEN: usize = 10;

/// Plate shapes, any match accepts:
/// letters-digits-letters (`AB1234C`), digits-letters-digits (`123AB4567`),
/// and a catch-all for short mixed strings.
static PLATE_SHAPES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"^[A-Z]{1,3}[0-9]{1,4}[A-Z]{0,3}$").expect("valid plate shape"),
        Regex::new(r"^[0-9]{1,3}[A-Z]{1,3}[0-9]{1,4}$").expect("valid plate shape"),
        Regex::new(r"^[A-Z0-9]{4,8}$").expect("valid plate shape"),
    ]
});

/// Whether raw OCR text could plausibly be a license plate.
///
/// Works on the cleaned text without OCR corrections. Deliberately permissive:
/// a false positive only costs one "Unregistered" log entry.
pub fn looks_like_plate(raw: &str) -> bool {
    let cleaned = clean(raw);

    if cleaned.len() < MIN_PLATE_LEN || cleaned.len() > MAX_PLATE_LEN {
        return false;
    }

    let has_letter = cleaned.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = cleaned.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return false;
    }

    PLATE_SHAPES.iter().any(|shape| shape.is_match(&cleaned))
}
