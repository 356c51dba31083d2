//! Bolt connection plumbing for the driver.
//!
//! The socket, framing and PackStream codec live outside this crate. Decoded
//! [`BoltResponse`](crate::bolt::BoltResponse)s are handed to a
//! [`ResponseDispatcher`], which routes them to the response handlers queued
//! for the connection.
//!
//! ```text
//! Connection I/O task
//!   └── ResponseDispatcher
//!         ├── FIFO of ResponseHandler (one per request)
//!         └── CurrentError (shared with the RESET handler)
//! ```

mod dispatcher;

pub use dispatcher::{CurrentError, ResponseDispatcher};
