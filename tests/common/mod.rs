mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from plate_watch for tests
pub use plate_watch::core::db::{
    AddOutcome, Lookup, NewVehicle, RegistryEntry, RegistryRepository, RemoveOutcome, VehicleDb,
    VehicleStatus,
};
pub use plate_watch::core::events::{
    CSV_HEADER, CsvEventLog, DetectionStats, EventSink, JsonEventLog, TeeSink,
};
pub use plate_watch::{
    AnnotateError, Annotator, AppContext, ClassificationResult, Config, DetectionStatus, Frame,
    PlateCandidate, PlateDetector, RawAnnotation,
};
