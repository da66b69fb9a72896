use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::{Path, PathBuf};

use crate::error::AnnotateError;
use crate::models::{Point, RawAnnotation};

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// External OCR engine: maps a frame to text fragments with geometry.
///
/// Implementations report failures as `Err`; the frame processor is the only
/// caller and treats an error as "no annotations for this frame".
pub trait Annotator {
    fn annotate(&self, image: &DynamicImage) -> Result<Vec<RawAnnotation>, AnnotateError>;
}

/// Default model directory, `~/.cache/ocrs`
pub fn default_model_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(|home| Path::new(&home).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine, AnnotateError> {
    let detection_model_path = model_dir.join(DETECTION_MODEL);
    let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(AnnotateError::ModelsNotFound {
            detection: detection_model_path,
            recognition: recognition_model_path,
        });
    }

    let detection_model = load_model(&detection_model_path)?;
    let recognition_model = load_model(&recognition_model_path)?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| AnnotateError::Engine(e.to_string()))
}

fn load_model(path: &Path) -> Result<Model, AnnotateError> {
    Model::load_file(path).map_err(|e| AnnotateError::ModelLoad {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Annotator backed by the `ocrs` engine, one annotation per recognized line.
pub struct OcrsAnnotator {
    engine: OcrEngine,
    /// ocrs does not score lines, so every line is reported with this value
    assumed_confidence: f32,
}

impl OcrsAnnotator {
    pub fn new(engine: OcrEngine, assumed_confidence: f32) -> Self {
        Self {
            engine,
            assumed_confidence,
        }
    }

    pub fn from_model_dir(model_dir: &Path, assumed_confidence: f32) -> Result<Self, AnnotateError> {
        Ok(Self::new(init_ocr_engine(model_dir)?, assumed_confidence))
    }
}

impl Annotator for OcrsAnnotator {
    fn annotate(&self, image: &DynamicImage) -> Result<Vec<RawAnnotation>, AnnotateError> {
        let img = image.to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| AnnotateError::ImageSource(e.to_string()))?;
        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| AnnotateError::Engine(e.to_string()))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| AnnotateError::Engine(e.to_string()))?;
        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| AnnotateError::Engine(e.to_string()))?;

        let annotations = lines
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string().trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                let (left, top) = (rect.left() as f32, rect.top() as f32);
                let (right, bottom) = (rect.right() as f32, rect.bottom() as f32);
                Some(RawAnnotation::new(
                    text,
                    self.assumed_confidence,
                    [
                        Point::new(left, top),
                        Point::new(right, top),
                        Point::new(right, bottom),
                        Point::new(left, bottom),
                    ],
                ))
            })
            .collect();

        Ok(annotations)
    }
}
