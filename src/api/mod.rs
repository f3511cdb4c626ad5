//! API Module
//!
//! Demo HTTP surface over the cache-aside accessor.
//!
//! # Endpoints
//! - `GET /helloget/:id` - Read a greeting row through the cache
//! - `GET /stats` - Accessor statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
