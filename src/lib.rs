//! ZenMeds — medication reminder engine.
//!
//! Computes dose schedules from start date/time, inclusive end date and a
//! fixed hourly frequency, polls wall-clock time to fire each reminder
//! exactly once inside a bounded detection window, and tracks confirmed
//! doses across restarts. Storage, presentation and scheduling are
//! collaborators behind traits; the core stays pure over an injected clock.

pub mod config;
pub mod db;
pub mod display;
pub mod engine;
pub mod models;
pub mod monitor;
pub mod runtime;
pub mod schedule;
