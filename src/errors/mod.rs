//! Centralized error handling for the gateway
//!
//! # Error Categories
//!
//! - **Validation Errors**: bad title ids and page numbers supplied by the client
//! - **Origin Errors**: the upstream platform API failed or returned unusable data
//! - **Selection Errors**: nothing playable was offered for a part
//! - **Render Errors**: a manifest could not be written
//!
//! How each category maps to an HTTP status lives in `web::responses`.
//!
//! # Usage
//!
//! ```rust
//! use bproxy::errors::{AppError, AppResult};
//!
//! fn parse_page(raw: &str) -> AppResult<usize> {
//!     raw.parse()
//!         .map_err(|_| AppError::validation(format!("Invalid page num: {raw}")))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for origin client Results
pub type OriginResult<T> = Result<T, OriginError>;
