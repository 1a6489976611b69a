//! Technician route optimization engine.
//!
//! Orders a technician's jobs for the day to minimize travel, reports the
//! savings against the current order, and runs that for a whole roster.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod google;
pub mod haversine;
pub mod matrix;
pub mod optimizer;
pub mod osrm;
pub mod roster;
pub mod schedule;
pub mod solver;
pub mod traits;
