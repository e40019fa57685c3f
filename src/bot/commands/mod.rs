//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Help and changelog commands
pub mod general;

/// Store browsing command
pub mod store;

/// Player trade command
pub mod trade;

// Export commands
pub use general::*;
pub use store::*;
pub use trade::*;
