//! Backend Error Module
//!
//! Error types used by HTTP handlers. All of them implement `IntoResponse`,
//! so handlers return them directly and Axum turns them into a status code
//! plus JSON body.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
