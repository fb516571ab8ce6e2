use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict intersection test; rectangles that only share an edge do not
    /// overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// The hoop location, fixed for the lifetime of a session.
pub type GoalRegion = Rect;

/// One object-detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    #[serde(rename = "class")]
    pub label: String,
    #[serde(rename = "score")]
    pub confidence: f32,
    #[serde(rename = "bbox")]
    pub bounds: Rect,
}

impl DetectionBox {
    pub fn new(label: impl Into<String>, confidence: f32, bounds: Rect) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounds,
        }
    }
}

/// Picks the most confident box carrying `label` with at least
/// `min_confidence`.
pub fn best_box<'a>(
    boxes: &'a [DetectionBox],
    label: &str,
    min_confidence: f32,
) -> Option<&'a DetectionBox> {
    boxes
        .iter()
        .filter(|b| b.label == label && b.confidence >= min_confidence)
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}
