//! Web layer for the route viewer.
//!
//! JSON endpoints for starting and cancelling solves, reading session
//! progress, the solution summary and timeline, and per-route map views.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
