//! # artac-shared
//!
//! Domain types, REST wire DTOs and constants shared by the ARTAC
//! communication crates.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::{ArtacError, Result};
pub use types::*;
