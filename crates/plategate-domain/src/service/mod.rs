//! Domain services

pub mod plate_validator;
pub mod stabilizer;

pub use plate_validator::{validate_plate, PlateValidator, DEFAULT_REGION_MARKER, PLATE_LEN};
pub use stabilizer::{FrameReadingStabilizer, DEFAULT_STABILIZER_THRESHOLD};
