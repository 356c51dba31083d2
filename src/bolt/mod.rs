//! # Bolt Protocol Vocabulary
//!
//! The protocol-level types the response handlers consume.
//!
//! ## Overview
//!
//! Every Bolt request is answered by zero or more RECORD messages followed
//! by exactly one summary message (SUCCESS, FAILURE or IGNORED). This module
//! provides:
//!
//! - **Responses** - Decoded response messages and their metadata
//! - **Metadata** - Version-aware extraction of keys, timings, bookmarks and summaries
//! - **Versions** - Protocol version and server product version
//! - **Error codes** - Server error codes the driver reacts to
//!
//! Framing and PackStream decoding happen upstream of this crate; messages
//! arrive here already decoded into [`crate::driver::Value`]s.

pub mod error;
pub mod metadata;
pub mod response;
pub mod version;

pub use error::{code_suffix, BoltErrorCode};
pub use metadata::{MetadataExtractor, ABSENT_QUERY_ID, ABSENT_TIMING};
pub use response::{tag, BoltResponse, FailureMessage, RecordMessage, SuccessMessage};
pub use version::{BoltVersion, ServerVersion};
