//! Application layer - station controllers, the control loop, configuration

pub mod config;
pub mod launch;
pub mod repository;
pub mod station;
