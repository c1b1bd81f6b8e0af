//!
//! [`Result`] alias encapsulating [`super::error::Error`]
//!

pub type Result<T> = std::result::Result<T, super::error::Error>;
