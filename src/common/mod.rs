//! Shared types, constants, and the crate-wide error enum.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::{MinirelError, Result};
pub use types::{FrameId, PageId};
