//! Routes Module
//!
//! Route configuration and router assembly.
//!
//! - **`router`** - top-level router, static files and CORS
//! - **`api_routes`** - `/api/*` endpoints and their auth requirements

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
