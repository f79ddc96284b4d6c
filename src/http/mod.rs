//! HTTP API for controlling live translation sessions
//!
//! - POST /sessions/start - Start a new session
//! - POST /sessions/stop/:id - Stop a session and return its stats
//! - GET /sessions/:id/status - Query session stats
//! - POST /sessions/:id/utterances - Push a finalized recognition result
//! - POST /timeline/assemble - Place clips on a non-overlapping timeline
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
