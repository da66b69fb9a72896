pub mod normalize;
pub mod ocr;
pub mod pattern;
pub mod preprocessing;
pub mod render;

use tracing::debug;

use crate::models::{PlateCandidate, RawAnnotation};

pub use normalize::normalize;
pub use ocr::{Annotator, OcrsAnnotator};
pub use pattern::looks_like_plate;
pub use render::draw_detections;

/// Default minimum annotation confidence; annotations at or below it are dropped
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Turns raw OCR annotations of one frame into plate candidates
#[derive(Debug, Clone)]
pub struct PlateDetector {
    pub min_confidence: f32,
}

impl PlateDetector {
    pub fn new() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Filter and clean annotations into candidates, preserving input order.
    ///
    /// The plausibility test runs on the original text; the candidate carries
    /// the normalized text. Normalized strings that lost every letter or every
    /// digit to OCR corrections are dropped.
    pub fn extract_candidates(&self, annotations: &[RawAnnotation]) -> Vec<PlateCandidate> {
        let mut candidates = Vec::new();

        for annotation in annotations {
            if annotation.confidence.is_nan() || annotation.confidence <= self.min_confidence {
                debug!(text = %annotation.text, confidence = annotation.confidence, "Rejected: low confidence");
                continue;
            }
            if !looks_like_plate(&annotation.text) {
                debug!(text = %annotation.text, "Rejected: not plate-like");
                continue;
            }

            let bbox = annotation.bbox();
            let text = normalize(&annotation.text);
            if text.is_empty() || !is_mixed(&text) {
                debug!(text = %annotation.text, normalized = %text, "Rejected: unusable after normalization");
                continue;
            }

            candidates.push(PlateCandidate {
                text,
                confidence: annotation.confidence,
                bbox,
            });
        }

        candidates
    }

    /// Highest-confidence candidate; the first one wins a tie.
    pub fn select_best<'a>(&self, candidates: &'a [PlateCandidate]) -> Option<&'a PlateCandidate> {
        select_best(candidates)
    }
}

impl Default for PlateDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest-confidence candidate; the first one wins a tie.
pub fn select_best(candidates: &[PlateCandidate]) -> Option<&PlateCandidate> {
    let mut best: Option<&PlateCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.confidence <= current.confidence => {}
            _ => best = Some(candidate),
        }
    }
    best
}

fn is_mixed(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_uppercase()) && text.chars().any(|c| c.is_ascii_digit())
}
