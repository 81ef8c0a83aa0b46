//! # Botline Core
//!
//! Error and result types shared by every Botline crate.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod result;

pub use error::Error;
pub use result::{OptionExt, Result, ResultExt};
