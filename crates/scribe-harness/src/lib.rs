#![forbid(unsafe_code)]

//! Reference host and fixtures for exercising Scribe without a real
//! document engine.
//!
//! - [`MemoryDocument`]: arena-backed [`DocumentSurface`](scribe_core::DocumentSurface)
//! - [`markup`]: the small markup dialect it reads and writes
//! - [`EventRecorder`]: listener that keeps every event for assertions

pub mod document;
pub mod markup;
pub mod recorder;

pub use document::{ExecRecord, MemoryDocument, text_position};
pub use recorder::EventRecorder;
