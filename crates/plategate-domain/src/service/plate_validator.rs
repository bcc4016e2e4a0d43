//! Plate text validation
//!
//! OCR output is noisy: stray characters around the plate, partial reads,
//! lowercase confusions. A plate is accepted only when the regional marker
//! appears and the 7 characters starting there read as
//! `LLL DDD L` (3 uppercase letters, 3 digits, 1 uppercase letter).

/// Regional marker every local plate starts with
pub const DEFAULT_REGION_MARKER: &str = "RA";

/// Characters in a plate, marker included
pub const PLATE_LEN: usize = 7;

const PREFIX_LEN: usize = 3;
const DIGITS_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateValidator {
    marker: String,
}

impl Default for PlateValidator {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_MARKER)
    }
}

impl PlateValidator {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Extract a well-formed plate from raw OCR text.
    ///
    /// Whitespace is dropped first (OCR splits "RAB 123C"). Only the first
    /// occurrence of the marker is considered. Returns `None` for anything
    /// that is not a plate; this is not an error.
    pub fn validate(&self, raw: &str) -> Option<String> {
        let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let start = text.find(self.marker.as_str())?;

        let window: Vec<char> = text[start..].chars().take(PLATE_LEN).collect();
        if window.len() != PLATE_LEN {
            return None;
        }

        let (prefix, rest) = window.split_at(PREFIX_LEN);
        let (digits, suffix) = rest.split_at(DIGITS_LEN);

        let well_formed = prefix.iter().all(char::is_ascii_uppercase)
            && digits.iter().all(char::is_ascii_digit)
            && suffix.iter().all(char::is_ascii_uppercase);

        well_formed.then(|| window.into_iter().collect())
    }
}

/// Validate with the default regional marker
pub fn validate_plate(raw: &str) -> Option<String> {
    PlateValidator::default().validate(raw)
}
