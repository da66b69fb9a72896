use image::{DynamicImage, ImageBuffer, Rgb};
use plate_watch::core::db::{
    AddOutcome, Lookup, NewVehicle, RegistryEntry, RegistryRepository, RemoveOutcome, VehicleDb,
    VehicleStatus,
};
use plate_watch::core::events::{DetectionStats, EventSink};
use plate_watch::{
    AnnotateError, Annotator, BoundingBox, ClassificationResult, Frame, PlateCandidate,
    RawAnnotation,
};
use std::path::Path;
use tempfile::NamedTempFile;
use time::{Duration, OffsetDateTime};

/// Creates a 100x100 gray test image with a dark bar in the middle.
pub fn create_test_image() -> DynamicImage {
    let img = ImageBuffer::from_fn(100, 100, |_, y| {
        if (40..60).contains(&y) {
            Rgb([20u8, 20u8, 20u8])
        } else {
            Rgb([200u8, 200u8, 200u8])
        }
    });
    DynamicImage::ImageRgb8(img)
}

/// Saves the test image as a PNG at `path`
pub fn write_test_image(path: &Path) {
    create_test_image()
        .save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test image");
}

/// Creates a temporary PNG file holding the test image.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image_file() -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    write_test_image(file.path());
    file
}

pub fn make_frame(index: u64) -> Frame {
    Frame::new(index, 0, create_test_image())
}

/// Creates a VehicleDb in a temporary directory.
/// Returns both the database and the temp directory (which must be kept alive).
pub async fn create_test_db() -> (VehicleDb, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let db = VehicleDb::new(dir.path().join("vehicles.db"))
        .await
        .expect("Failed to create test database");
    (db, dir)
}

/// Creates a VehicleDb with the given plates registered and active
pub async fn create_registry_with(plates: &[&str]) -> (VehicleDb, tempfile::TempDir) {
    let (db, dir) = create_test_db().await;
    for plate in plates {
        let outcome = db
            .add(&NewVehicle::new(*plate))
            .await
            .expect("Failed to register test plate");
        assert_eq!(outcome, AddOutcome::Added);
    }
    (db, dir)
}

/// The three annotations of the reference frame: two plates and a line of noise
pub fn reference_annotations() -> Vec<RawAnnotation> {
    vec![
        RawAnnotation::from_rect("AB123X", 0.9, 10.0, 10.0, 60.0, 20.0),
        RawAnnotation::from_rect("noise!!", 0.95, 5.0, 50.0, 40.0, 10.0),
        RawAnnotation::from_rect("CD4567", 0.6, 30.0, 70.0, 50.0, 15.0),
    ]
}

pub fn make_candidate(text: &str, confidence: f32) -> PlateCandidate {
    PlateCandidate {
        text: text.to_string(),
        confidence,
        bbox: BoundingBox {
            x: 0,
            y: 0,
            width: 10,
            height: 5,
        },
    }
}

/// A result timestamped `minutes_ago` before now
pub fn make_result(
    plate: &str,
    is_registered: bool,
    confidence: f32,
    minutes_ago: i64,
) -> ClassificationResult {
    ClassificationResult {
        plate_text: plate.to_string(),
        is_registered,
        confidence,
        timestamp: OffsetDateTime::now_utc() - Duration::minutes(minutes_ago),
        camera_index: 0,
    }
}

/// Annotator returning the same annotations for every frame
pub struct FakeAnnotator {
    pub annotations: Vec<RawAnnotation>,
}

impl FakeAnnotator {
    pub fn new(annotations: Vec<RawAnnotation>) -> Self {
        Self { annotations }
    }
}

impl Annotator for FakeAnnotator {
    fn annotate(&self, _image: &DynamicImage) -> Result<Vec<RawAnnotation>, AnnotateError> {
        Ok(self.annotations.clone())
    }
}

/// Annotator that fails on every frame
pub struct FailingAnnotator;

impl Annotator for FailingAnnotator {
    fn annotate(&self, _image: &DynamicImage) -> Result<Vec<RawAnnotation>, AnnotateError> {
        Err(AnnotateError::Engine("model crashed".to_string()))
    }
}

/// Sink whose every operation fails
pub struct FailingSink;

impl EventSink for FailingSink {
    async fn append(&self, _result: &ClassificationResult) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    async fn recent(&self, _limit: usize) -> anyhow::Result<Vec<ClassificationResult>> {
        anyhow::bail!("disk full")
    }

    async fn statistics(&self) -> anyhow::Result<DetectionStats> {
        anyhow::bail!("disk full")
    }

    async fn clear(&self) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

/// Registry whose every operation fails
pub struct FailingRegistry;

impl RegistryRepository for FailingRegistry {
    async fn lookup(&self, _plate: &str) -> anyhow::Result<Lookup> {
        anyhow::bail!("database locked")
    }

    async fn add(&self, _vehicle: &NewVehicle) -> anyhow::Result<AddOutcome> {
        anyhow::bail!("database locked")
    }

    async fn remove(&self, _plate: &str) -> anyhow::Result<RemoveOutcome> {
        anyhow::bail!("database locked")
    }

    async fn list_all(&self) -> anyhow::Result<Vec<RegistryEntry>> {
        anyhow::bail!("database locked")
    }

    async fn set_status(&self, _plate: &str, _status: VehicleStatus) -> anyhow::Result<bool> {
        anyhow::bail!("database locked")
    }
}
