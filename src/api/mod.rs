//! API Module
//!
//! HTTP handlers and routing that host the cache facade.
//!
//! # Endpoints
//! - `PUT /set`, `POST /add`, `POST /replace` - Store a value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `POST /flush` - Delete stored records
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
