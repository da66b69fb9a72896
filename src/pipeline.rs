use anyhow::Context;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::classification::classify_and_record;
use crate::config::Config;
use crate::core::db::RegistryRepository;
use crate::core::events::EventSink;
use crate::detection::{Annotator, PlateDetector, draw_detections, preprocessing};
use crate::models::{ClassificationResult, Frame, PlateCandidate, RawAnnotation};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "webp", "tiff"];

/// Pull-based source of frames. `None` means the source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Frames from the image files of a directory, in file name order.
/// Files that fail to decode are skipped.
pub struct DirectoryFrameSource {
    paths: std::vec::IntoIter<PathBuf>,
    camera_index: u32,
    next_index: u64,
}

impl DirectoryFrameSource {
    pub fn new<P: AsRef<Path>>(dir: P, camera_index: u32) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {:?}", dir))?
        {
            let path = entry?.path();
            if path.is_file() && is_image_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), "Opened frame directory");

        Ok(Self {
            paths: paths.into_iter(),
            camera_index,
            next_index: 0,
        })
    }

    /// A source yielding a single image file
    pub fn single<P: AsRef<Path>>(path: P, camera_index: u32) -> Self {
        Self {
            paths: vec![path.as_ref().to_path_buf()].into_iter(),
            camera_index,
            next_index: 0,
        }
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Option<Frame> {
        for path in self.paths.by_ref() {
            match image::open(&path) {
                Ok(image) => {
                    let frame = Frame::new(self.next_index, self.camera_index, image);
                    self.next_index += 1;
                    return Some(frame);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping undecodable frame"),
            }
        }
        None
    }
}

/// Adapts any iterator of frames
pub struct IterFrameSource<I>(pub I);

impl<I: Iterator<Item = Frame>> FrameSource for IterFrameSource<I> {
    fn next_frame(&mut self) -> Option<Frame> {
        self.0.next()
    }
}

/// Frames handed over by an acquisition thread
pub struct ChannelFrameSource {
    receiver: Receiver<Frame>,
}

impl ChannelFrameSource {
    pub fn new(receiver: Receiver<Frame>) -> Self {
        Self { receiver }
    }
}

impl FrameSource for ChannelFrameSource {
    fn next_frame(&mut self) -> Option<Frame> {
        self.receiver.recv().ok()
    }
}

/// Move `source` onto its own thread, buffering at most `capacity` frames.
/// The thread stops when the source is exhausted or the receiving side is
/// dropped, and returns the number of frames it sent.
pub fn spawn_acquisition<S>(mut source: S, capacity: usize) -> (ChannelFrameSource, JoinHandle<u64>)
where
    S: FrameSource + Send + 'static,
{
    let (sender, receiver) = mpsc::sync_channel(capacity);
    let handle = std::thread::spawn(move || {
        let mut sent = 0u64;
        while let Some(frame) = source.next_frame() {
            if sender.send(frame).is_err() {
                debug!("Frame receiver dropped, stopping acquisition");
                break;
            }
            sent += 1;
        }
        sent
    });
    (ChannelFrameSource::new(receiver), handle)
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory receiving detection overlays and preprocessed frames
    pub output_dir: PathBuf,
}

/// What the pipeline decided for one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    pub annotation_count: usize,
    pub candidates: Vec<PlateCandidate>,
    pub best: Option<PlateCandidate>,
    pub result: Option<ClassificationResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub detections: u64,
    pub registered: u64,
    pub unregistered: u64,
}

impl RunSummary {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        if let Some(result) = &report.result {
            self.detections += 1;
            if result.is_registered {
                self.registered += 1;
            } else {
                self.unregistered += 1;
            }
        }
    }
}

/// Everything the frame loop needs, built once and borrowed by every stage
pub struct AppContext<A, R, S> {
    pub config: Config,
    pub detector: PlateDetector,
    pub annotator: A,
    pub registry: R,
    pub sink: S,
    pub debug: Option<DebugConfig>,
}

impl<A, R, S> AppContext<A, R, S>
where
    A: Annotator,
    R: RegistryRepository,
    S: EventSink,
{
    pub fn new(config: Config, annotator: A, registry: R, sink: S) -> Self {
        let detector = PlateDetector::new().with_min_confidence(config.min_confidence);
        Self {
            config,
            detector,
            annotator,
            registry,
            sink,
            debug: None,
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> anyhow::Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Run the annotator; a failure yields no annotations
    pub fn annotate(&self, image: &DynamicImage) -> Vec<RawAnnotation> {
        match self.annotator.annotate(image) {
            Ok(annotations) => annotations,
            Err(e) => {
                error!(error = %e, "Annotator failed, continuing with no annotations");
                Vec::new()
            }
        }
    }

    /// Preprocess, annotate, extract, select and classify one frame
    pub async fn process_frame(&self, frame: Frame) -> FrameReport {
        let processed = self.config.preprocess.then(|| {
            let processed = preprocessing::preprocess(&frame.image);
            self.save_debug_image(frame.index, "preprocessed", &processed);
            processed
        });

        let annotations = self.annotate(processed.as_ref().unwrap_or(&frame.image));
        let candidates = self.detector.extract_candidates(&annotations);
        let best = self.detector.select_best(&candidates).cloned();

        if self.debug.is_some() {
            let overlay = DynamicImage::ImageRgb8(draw_detections(&frame.image, &candidates));
            self.save_debug_image(frame.index, "detections", &overlay);
        }

        debug!(
            frame = frame.index,
            annotations = annotations.len(),
            candidates = candidates.len(),
            "Processed frame"
        );

        let result = match &best {
            Some(candidate) => Some(
                classify_and_record(candidate, frame.camera_index, &self.registry, &self.sink)
                    .await,
            ),
            None => None,
        };

        FrameReport {
            frame_index: frame.index,
            annotation_count: annotations.len(),
            candidates,
            best,
            result,
        }
    }

    /// Process frames until the source is exhausted
    pub async fn run<F: FrameSource>(&self, source: &mut F) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(frame) = source.next_frame() {
            let report = self.process_frame(frame).await;
            summary.record(&report);
        }
        info!(
            frames = summary.frames,
            detections = summary.detections,
            registered = summary.registered,
            unregistered = summary.unregistered,
            "Frame source exhausted"
        );
        summary
    }

    fn save_debug_image(&self, index: u64, stage: &str, image: &DynamicImage) {
        if let Some(debug_config) = &self.debug {
            let path = debug_config
                .output_dir
                .join(format!("{:06}_{}.png", index, stage));
            match image.save(&path) {
                Ok(()) => debug!(path = %path.display(), "Saved debug frame"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to save debug frame"),
            }
        }
    }
}
