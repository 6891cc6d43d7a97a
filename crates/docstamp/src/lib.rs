//! The docstamp pipeline
//!
//! Copies a template package, substitutes placeholder tokens (text and
//! images) in every story part of the copy, saves the result, and
//! optionally renders it to PDF through an external converter. The
//! template itself is never mutated.

mod pipeline;

pub use pipeline::{Pipeline, PipelineError, PipelineResult, PipelineState, RunReport};
