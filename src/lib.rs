pub mod classification;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use classification::classify_and_record;
pub use config::Config;
pub use detection::{Annotator, OcrsAnnotator, PlateDetector};
pub use error::{AnnotateError, ConfigError};
pub use models::{
    BoundingBox, ClassificationResult, DetectionStatus, Frame, PlateCandidate, Point,
    RawAnnotation,
};
pub use pipeline::{
    AppContext, ChannelFrameSource, DebugConfig, DirectoryFrameSource, FrameReport, FrameSource,
    IterFrameSource, RunSummary, spawn_acquisition,
};
