pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod marker;
pub mod ui;
pub mod workflow;

pub use error::{ReleaseError, Result};
