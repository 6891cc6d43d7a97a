//! Fixed-layout rendering through an external converter
//!
//! Conversion shells out to a headless office process (LibreOffice's
//! `soffice` by default) and blocks until it exits. The process is
//! invoked exactly once per conversion; a non-zero exit, a missing
//! binary, or a missing output artifact is surfaced as a typed error
//! and never retried.

mod convert;
mod error;

pub use convert::Converter;
pub use error::{ConvertError, ConvertResult};
