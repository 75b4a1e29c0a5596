//! Testing infrastructure for revex integration tests.
//!
//! This crate provides utilities for exercising the export pipeline
//! without a live remote system:
//! - `fixtures`: work item and revision builders, snapshot file writing
//! - `source`: a scripted in-memory `WorkItemSource` with failure injection
//! - `metrics`: a recording `ExportMetrics` fake
//! - `download`: a stub `AttachmentDownloader` backed by a temp directory

pub mod download;
pub mod fixtures;
pub mod metrics;
pub mod source;

pub use download::StubDownloader;
pub use metrics::RecordingMetrics;
pub use source::ScriptedSource;
