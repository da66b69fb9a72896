use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A corner of an annotation quadrilateral, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in the original frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest axis-aligned box enclosing the quadrilateral. Coordinates are
    /// truncated toward zero, extents are `max - min` truncated.
    pub fn from_geometry(geometry: &[Point; 4]) -> Self {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for point in geometry {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Self {
            x: min_x as i32,
            y: min_y as i32,
            width: (max_x - min_x).max(0.0) as u32,
            height: (max_y - min_y).max(0.0) as u32,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// One hit reported by the OCR annotator for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub text: String,
    pub confidence: f32,
    pub geometry: [Point; 4],
}

impl RawAnnotation {
    pub fn new(text: impl Into<String>, confidence: f32, geometry: [Point; 4]) -> Self {
        Self {
            text: text.into(),
            confidence,
            geometry,
        }
    }

    /// Annotation covering the axis-aligned rectangle `(x, y, width, height)`.
    pub fn from_rect(text: impl Into<String>, confidence: f32, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(
            text,
            confidence,
            [
                Point::new(x, y),
                Point::new(x + width, y),
                Point::new(x + width, y + height),
                Point::new(x, y + height),
            ],
        )
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_geometry(&self.geometry)
    }
}

/// A normalized plate string that survived filtering for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateCandidate {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Outcome label surfaced to consumers of classification results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionStatus {
    Registered,
    Unregistered,
}

impl DetectionStatus {
    pub fn from_registered(is_registered: bool) -> Self {
        if is_registered {
            DetectionStatus::Registered
        } else {
            DetectionStatus::Unregistered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Registered => "Registered",
            DetectionStatus::Unregistered => "Unregistered",
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, DetectionStatus::Registered)
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DetectionStatus {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Registered" => Ok(DetectionStatus::Registered),
            "Unregistered" => Ok(DetectionStatus::Unregistered),
            _ => Err(anyhow::anyhow!("Invalid detection status: {}", value)),
        }
    }
}

/// The classification emitted for the best candidate of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub plate_text: String,
    pub is_registered: bool,
    pub confidence: f32,
    pub timestamp: OffsetDateTime,
    pub camera_index: u32,
}

impl ClassificationResult {
    pub fn status(&self) -> DetectionStatus {
        DetectionStatus::from_registered(self.is_registered)
    }
}

/// A decoded frame handed to the pipeline by value.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub camera_index: u32,
    pub image: DynamicImage,
}

impl Frame {
    pub fn new(index: u64, camera_index: u32, image: DynamicImage) -> Self {
        Self {
            index,
            camera_index,
            image,
        }
    }
}
