use time::OffsetDateTime;
use tracing::{error, info};

use crate::core::db::{Lookup, RegistryRepository};
use crate::core::events::EventSink;
use crate::models::{ClassificationResult, PlateCandidate};

/// Classify a candidate against the registry and record the outcome.
///
/// Registry faults are logged and treated as "not found". Sink faults are
/// logged and swallowed; the returned result is valid either way.
pub async fn classify_and_record<R, S>(
    candidate: &PlateCandidate,
    camera_index: u32,
    registry: &R,
    sink: &S,
) -> ClassificationResult
where
    R: RegistryRepository,
    S: EventSink,
{
    let lookup = match registry.lookup(&candidate.text).await {
        Ok(lookup) => lookup,
        Err(e) => {
            error!(plate = %candidate.text, error = %e, "Registry lookup failed");
            Lookup::default()
        }
    };

    let result = ClassificationResult {
        plate_text: candidate.text.clone(),
        is_registered: lookup.is_registered(),
        confidence: candidate.confidence,
        timestamp: now(),
        camera_index,
    };

    info!(
        plate = %result.plate_text,
        status = %result.status(),
        confidence = result.confidence,
        "Classified plate"
    );

    if let Err(e) = sink.append(&result).await {
        error!(plate = %result.plate_text, error = %e, "Failed to record detection");
    }

    result
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
