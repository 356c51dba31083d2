//! # Zeta4G Bolt Core
//!
//! The pull-based result streaming core of the Zeta4G Bolt driver.
//!
//! Network I/O delivers protocol messages from a single I/O task through
//! callbacks, while application code consumes results from any task through
//! futures. This crate sits between the two:
//!
//! - **Response handlers** - One handler per request, completing the caller's futures
//! - **Flow control** - Record buffering with high/low watermarks that pause and
//!   resume socket reads
//! - **Propagate-once failures** - A server failure reaches exactly one consumer
//! - **Lifecycle** - HELLO/INIT, BEGIN, COMMIT, ROLLBACK and RESET-then-release
//! - **Routing** - Cluster-aware reclassification of server failures
//!
//! ## Streaming a result
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use futures::future::{self, BoxFuture, FutureExt};
//! use zeta4g_bolt_core::bolt::MetadataExtractor;
//! use zeta4g_bolt_core::driver::handlers::{
//!     PullAllResponseHandler, PullCompletion, ResponseHandler, RunResponseHandler,
//! };
//! use zeta4g_bolt_core::{
//!     BookmarkHolder, ChannelAttributes, Connection, DriverConfig, DriverResult, Query,
//!     ResultCursor, ServerAddress, Value,
//! };
//!
//! struct Channel {
//!     address: ServerAddress,
//!     attributes: ChannelAttributes,
//! }
//!
//! impl Connection for Channel {
//!     fn id(&self) -> u64 { 1 }
//!     fn address(&self) -> &ServerAddress { &self.address }
//!     fn attributes(&self) -> &ChannelAttributes { &self.attributes }
//!     fn enable_auto_read(&self) {}
//!     fn disable_auto_read(&self) {}
//!     fn close(&self) -> BoxFuture<'static, DriverResult<()>> { future::ready(Ok(())).boxed() }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> DriverResult<()> {
//! let connection = Arc::new(Channel {
//!     address: ServerAddress::new("localhost", 7687),
//!     attributes: ChannelAttributes::new(),
//! });
//! let extractor = MetadataExtractor::V3;
//!
//! let (run, _run_done) = RunResponseHandler::new(extractor);
//! let run = Arc::new(run);
//! let pull = Arc::new(PullAllResponseHandler::new(
//!     Query::new("RETURN 1 AS n"),
//!     run.clone(),
//!     connection,
//!     extractor,
//!     PullCompletion::Session(BookmarkHolder::new()),
//!     &DriverConfig::default(),
//! ));
//!
//! // Normally called by the connection's I/O task.
//! let mut metadata = HashMap::new();
//! metadata.insert("fields".to_string(), Value::List(vec![Value::from("n")]));
//! run.on_success(metadata);
//! pull.on_record(vec![Value::Integer(1)])?;
//! pull.on_success(HashMap::new());
//!
//! let cursor = ResultCursor::new(run, pull);
//! let record = cursor.single_async().await?;
//! assert_eq!(record.get_int("n")?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`bolt`] - Protocol vocabulary: responses, metadata, versions, error codes
//! - [`driver`] - Handlers, dispatcher, cursor, pool and routing
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod driver;

// Re-exports for convenience
pub use driver::{
    AccessMode, Bookmark, BookmarkHolder, ChannelAttributes, Connection, ConnectionPool,
    DriverConfig, DriverConfigBuilder, DriverError, DriverResult, IdleConnectionPool, Query,
    Record, ResultCursor, ResultSummary, ServerAddress, ServerInfo, TransactionHandle, Value,
};

pub use bolt::{BoltResponse, BoltVersion, ServerVersion};
