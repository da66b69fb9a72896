use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, PlateCandidate};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CONFIDENCE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Outline thickness in pixels
const BOX_THICKNESS: i32 = 2;

/// Label strip above the box, one cell per plate character
const LABEL_HEIGHT: u32 = 8;
const LABEL_CELL_WIDTH: u32 = 6;

/// Confidence bar below the box, full box width at confidence 1.0
const CONFIDENCE_BAR_HEIGHT: u32 = 3;

/// Copy of `image` with every candidate outlined.
///
/// No font ships with the crate, so text and confidence are drawn as bars:
/// a filled strip above the box sized to the plate text, and a bar below it
/// scaled to the confidence.
pub fn draw_detections(image: &DynamicImage, candidates: &[PlateCandidate]) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for candidate in candidates {
        let bbox = candidate.bbox;
        if bbox.area() == 0 {
            continue;
        }

        for inset in 0..BOX_THICKNESS {
            if let Some(rect) = inset_rect(&bbox, inset) {
                draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            }
        }

        let label_width = LABEL_CELL_WIDTH * candidate.text.chars().count().max(1) as u32;
        let label = Rect::at(bbox.x, bbox.y - LABEL_HEIGHT as i32 - 1).of_size(label_width, LABEL_HEIGHT);
        draw_filled_rect_mut(&mut canvas, label, BOX_COLOR);

        let bar_width = (bbox.width as f32 * candidate.confidence.clamp(0.0, 1.0)) as u32;
        if bar_width > 0 {
            let bar = Rect::at(bbox.x, bbox.y + bbox.height as i32 + 2)
                .of_size(bar_width, CONFIDENCE_BAR_HEIGHT);
            draw_filled_rect_mut(&mut canvas, bar, CONFIDENCE_COLOR);
        }
    }

    canvas
}

fn inset_rect(bbox: &BoundingBox, inset: i32) -> Option<Rect> {
    let width = bbox.width as i32 - 2 * inset;
    let height = bbox.height as i32 - 2 * inset;
    if width <= 0 || height <= 0 {
        return None;
    }
    Some(Rect::at(bbox.x + inset, bbox.y + inset).of_size(width as u32, height as u32))
}
