//! Handler Registry and the handler contract it dispatches
//! through.
//!
//! The registry is built once, at server start, and is shared read-only
//! across every connection. Handlers are supplied by the
//! embedding application as implementations of the traits below; the core
//! never knows what a `domain`, `host`, or `contact` is.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::result_code::ResultCode;
use crate::session::Session;
use crate::xml::{Document, Element};

/// Event names the registry recognizes for commands.
///
/// `logout` is deliberately absent: the core handles it directly
/// and never looks it up here.
pub const COMMAND_EVENTS: &[&str] =
    &["login", "poll", "check", "info", "create", "update", "renew", "delete", "transfer", "other"];

/// Everything a command handler is given to produce a reply.
#[derive(Debug)]
pub struct CommandContext<'a> {
    /// The parsed inbound frame.
    pub frame: &'a Document,
    /// The session as it stood before this command was dispatched.
    pub session: &'a Session,
    /// The client transaction ID echoed from the inbound frame (may be
    /// empty).
    pub cl_trid: &'a str,
    /// The server transaction ID minted for this exchange.
    pub sv_trid: &'a str,
}

/// The four shapes a handler's return value may take.
///
/// Kept as a single closed, exhaustively matched enum rather than a dynamic
/// return type, to make a handler's dynamic polymorphism an explicit,
/// statically checked contract.
#[derive(Debug)]
pub enum HandlerReply {
    /// A pre-built response document, used verbatim.
    Document(Document),
    /// A bare result code; the default message for its band is used.
    Code(ResultCode),
    /// A result code and an explicit message.
    CodeMessage(ResultCode, String),
    /// A result code plus up to three elements (`resData`, `msgQ`,
    /// `extension`, in any order — the normalizer reorders them).
    CodeElements(ResultCode, Vec<Element>),
}

/// A command handler: `login`, `poll`, `check`, `info`, `create`, `update`,
/// `renew`, `delete`, `transfer`, or `other`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Produce a reply for the given command frame.
    async fn call(&self, ctx: CommandContext<'_>) -> HandlerReply;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: for<'a> Fn(CommandContext<'a>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerReply> + Send,
{
    async fn call(&self, ctx: CommandContext<'_>) -> HandlerReply { (self)(ctx).await }
}

/// Server metadata returned by the `hello` callback, consumed by the
/// Greeting Builder.
#[derive(Debug, Clone)]
pub struct GreetingMetadata {
    /// Server identifier. Defaults to the lowercased host name when `None`.
    pub sv_id: Option<String>,
    /// Negotiated language tags, in order. Defaults to `["en"]` when empty.
    pub lang: Vec<String>,
    /// Object-service namespace URIs this server supports.
    pub objects: Vec<String>,
    /// Extension namespace URIs this server supports.
    pub extensions: Vec<String>,
}

/// The `hello` callback: server-metadata advertisement for the greeting.
#[async_trait]
pub trait HelloHandler: Send + Sync {
    /// Produce the server's greeting metadata.
    async fn call(&self) -> GreetingMetadata;
}

#[async_trait]
impl<F, Fut> HelloHandler for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = GreetingMetadata> + Send,
{
    async fn call(&self) -> GreetingMetadata { (self)().await }
}

/// A lifecycle hook that observes but cannot influence the outcome:
/// `frame_received` and `session_closed`.
///
/// Errors are swallowed by the dispatcher.H step 4, so
/// hooks report failure only through their own logging.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Observe the current session at this lifecycle point.
    async fn call(&self, session: &Session);
}

#[async_trait]
impl<F, Fut> LifecycleHook for F
where
    F: for<'a> Fn(&'a Session) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn call(&self, session: &Session) { (self)(session).await; }
}

/// The `response_prepared` hook: fires after the response frame is built,
/// before it is sent.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    /// Observe the session and the response about to be sent.
    async fn call(&self, session: &Session, response: &Document);
}

#[async_trait]
impl<F, Fut> ResponseHook for F
where
    F: for<'a, 'b> Fn(&'a Session, &'b Document) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn call(&self, session: &Session, response: &Document) {
        (self)(session, response).await;
    }
}

/// An immutable mapping from event name to callback, established once at
/// server start and shared read-only across every connection.
///
/// Unknown events yield no call and no error; a missing
/// *command* handler is distinct and yields `2101 UNIMPLEMENTED_COMMAND`
/// from the dispatcher, not from the registry itself.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    hello: Option<Arc<dyn HelloHandler>>,
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    frame_received: Option<Arc<dyn LifecycleHook>>,
    response_prepared: Option<Arc<dyn ResponseHook>>,
    session_closed: Option<Arc<dyn LifecycleHook>>,
}

impl HandlerRegistry {
    /// An empty registry: every command is unimplemented, there is no
    /// `hello` metadata, and no lifecycle hooks fire.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register the `hello` server-metadata callback.
    #[must_use]
    pub fn hello(mut self, handler: impl HelloHandler + 'static) -> Self {
        self.hello = Some(Arc::new(handler));
        self
    }

    /// Register a command handler.
    ///
    /// `event` is typically one of [`COMMAND_EVENTS`]; names outside that
    /// list (including `"logout"`) are stored without error but are never
    /// looked up by the dispatcher — `logout` is not a handler slot.
    #[must_use]
    pub fn command(mut self, event: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        self.commands.insert(event.into(), Arc::new(handler));
        self
    }

    /// Register the `frame_received` lifecycle hook.
    #[must_use]
    pub fn on_frame_received(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.frame_received = Some(Arc::new(hook));
        self
    }

    /// Register the `response_prepared` lifecycle hook.
    #[must_use]
    pub fn on_response_prepared(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_prepared = Some(Arc::new(hook));
        self
    }

    /// Register the `session_closed` lifecycle hook.
    #[must_use]
    pub fn on_session_closed(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.session_closed = Some(Arc::new(hook));
        self
    }

    /// The registered `hello` handler, if any.
    #[must_use]
    pub fn hello_handler(&self) -> Option<&Arc<dyn HelloHandler>> { self.hello.as_ref() }

    /// The handler registered for `event`, if any.
    #[must_use]
    pub fn command_handler(&self, event: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(event)
    }

    /// The registered `frame_received` hook, if any.
    #[must_use]
    pub fn frame_received_hook(&self) -> Option<&Arc<dyn LifecycleHook>> {
        self.frame_received.as_ref()
    }

    /// The registered `response_prepared` hook, if any.
    #[must_use]
    pub fn response_prepared_hook(&self) -> Option<&Arc<dyn ResponseHook>> {
        self.response_prepared.as_ref()
    }

    /// The registered `session_closed` hook, if any.
    #[must_use]
    pub fn session_closed_hook(&self) -> Option<&Arc<dyn LifecycleHook>> {
        self.session_closed.as_ref()
    }
}
