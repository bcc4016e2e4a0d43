//! Raw detector output

use serde::{Deserialize, Serialize};

/// One plate-shaped region found in a frame, with whatever text OCR read.
/// The text has not been validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateCandidate {
    pub text: String,
    /// Bounding box `[x1, y1, x2, y2]` in frame pixels
    #[serde(default)]
    pub bbox: Option<Vec<i32>>,
}

impl PlateCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox: None,
        }
    }
}
