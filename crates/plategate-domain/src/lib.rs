//! Gate domain: visit records, plate validation, reading stabilization,
//! and the traits the stations use to reach storage and hardware.

pub mod model;
pub mod port;
pub mod repository;
pub mod service;
