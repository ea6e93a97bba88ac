//! Per-connection protocol engine for EPP (RFC 5730/5734) servers.
//!
//! This crate implements the wire framing, XML parsing, session and
//! transaction-id bookkeeping, handler dispatch, and response construction
//! that every EPP server needs, independent of what `domain`, `host`, or
//! `contact` objects actually mean. An embedding application supplies
//! handlers through a [`registry::HandlerRegistry`], an already-accepted
//! (and, if required, already certificate-validated) async stream, and
//! drives [`connection::run_connection`] per connection.
//!
//! TLS termination, certificate validation, persistence, and the wire
//! schemas for specific object types are out of scope; see `SPEC_FULL.md`
//! for the full boundary.

#![cfg_attr(test, expect(clippy::unwrap_used, reason = "test code can panic"))]
#![cfg_attr(test, expect(clippy::expect_used, reason = "test code can panic"))]
#![cfg_attr(
    test,
    expect(clippy::indexing_slicing, reason = "test code with known bounds")
)]
#![cfg_attr(test, expect(clippy::shadow_reuse, reason = "test code shadowing"))]
#![cfg_attr(
    test,
    expect(clippy::let_underscore_must_use, reason = "test cleanup code")
)]

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod framer;
pub mod greeting;
pub mod registry;
pub mod response;
pub mod result_code;
pub mod session;
pub mod trid;
pub mod xml;

pub use config::EppConfig;
pub use connection::{run_connection, run_connection_with_validator};
pub use dispatch::{AlwaysValid, DispatchOutcome, Dispatcher, LoopAction, SchemaValidator};
pub use registry::{
    CommandContext, CommandHandler, GreetingMetadata, HandlerReply, HandlerRegistry, HelloHandler,
    LifecycleHook, ResponseHook,
};
pub use result_code::ResultCode;
pub use session::{Session, SessionState};
pub use trid::TridGenerator;
pub use xml::{Document, Element, Node, QName};
