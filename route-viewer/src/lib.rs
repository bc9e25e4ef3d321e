//! Route viewer for a vehicle-routing solver.
//!
//! Streams a solve from the optimisation service, keeps the session's logs
//! and solution, and derives what the viewer draws from it: a per-vehicle
//! timeline and road-following route maps.

pub mod geometry;
pub mod problem;
pub mod schedule;
pub mod session;
pub mod solution;
pub mod stream;
pub mod web;
