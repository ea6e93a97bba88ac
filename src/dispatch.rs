//! Command Dispatcher and Return-Value Normalizer.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt as _;
use tracing::{info_span, warn, Instrument as _};

use crate::greeting::GreetingBuilder;
use crate::registry::{CommandContext, HandlerRegistry, HandlerReply};
use crate::response::ResponseBuilder;
use crate::result_code::ResultCode;
use crate::session::Session;
use crate::trid::TridGenerator;
use crate::xml::{parse_document, Document, Element, XmlError};

/// Everything a connection needs to turn inbound bytes into an outbound
/// frame: the shared, read-only handler registry, the trid generator, and
/// the cached greeting skeleton.
pub struct Dispatcher {
    registry: HandlerRegistry,
    trid: TridGenerator,
    greeting: GreetingBuilder,
}

/// What the connection loop should do after a dispatch round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep reading frames on this connection.
    Continue,
    /// Send the response, then close the connection.
    Terminate,
}

/// One dispatch round's outcome: the frame to send, and what to do next.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// The response (or greeting) frame to write back.
    pub frame: Document,
    /// Whether the connection loop should continue or terminate.
    pub action: LoopAction,
}

/// A schema validator seam. An implementation that always
/// accepts satisfies the contract; the core never inspects a schema itself.
pub trait SchemaValidator: Send + Sync {
    /// Returns `true` if `doc` satisfies whatever schema this validator
    /// enforces.
    fn validate(&self, doc: &Document) -> bool;
}

/// A validator that accepts every document; schema validation may start
/// out as always-true and be replaced once a real schema is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl SchemaValidator for AlwaysValid {
    fn validate(&self, _doc: &Document) -> bool { true }
}

impl Dispatcher {
    /// Build a dispatcher around a handler registry established at server
    /// start.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry, trid: TridGenerator::new(), greeting: GreetingBuilder::new() }
    }

    /// Run one frame through the full gating protocol.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        payload: &[u8],
        validator: &dyn SchemaValidator,
    ) -> DispatchOutcome {
        let sv_trid = self.trid.next_id();
        let span = info_span!("dispatch", sv_trid = %sv_trid);
        self.dispatch_inner(session, payload, validator, &sv_trid).instrument(span).await
    }

    async fn dispatch_inner(
        &self,
        session: &mut Session,
        payload: &[u8],
        validator: &dyn SchemaValidator,
        sv_trid: &str,
    ) -> DispatchOutcome {
        // Step 1: parse.
        let frame = match parse_document(payload) {
            Ok(doc) => doc,
            Err(XmlError::Parse(_) | XmlError::Malformed(_)) => {
                return terminal_free(ResponseBuilder::new().code(ResultCode::SYNTAX_ERROR)
                    .msg("XML parse error.")
                    .sv_trid(sv_trid)
                    .build());
            }
            Err(XmlError::SchemaViolation) => {
                return terminal_free(ResponseBuilder::new().code(ResultCode::SYNTAX_ERROR)
                    .msg("XML schema error.")
                    .sv_trid(sv_trid)
                    .build());
            }
        };

        // Step 2: schema validation.
        if !validator.validate(&frame) {
            return terminal_free(ResponseBuilder::new()
                .code(ResultCode::SYNTAX_ERROR)
                .msg("XML schema error.")
                .sv_trid(sv_trid)
                .build());
        }

        let Some(top) = frame.root.first_child_element() else {
            return terminal_free(structural_error(sv_trid));
        };

        // Step 3: hello bypasses every other check.
        if top.name.local == "hello" {
            let hello = self.registry.hello_handler().map(std::convert::AsRef::as_ref);
            let greeting = self.greeting.build(hello).await;
            return DispatchOutcome { frame: greeting, action: LoopAction::Continue };
        }

        // Step 4: frame_received hook, errors swallowed by construction
        // (LifecycleHook::call returns nothing fallible).
        if let Some(hook) = self.registry.frame_received_hook() {
            hook.call(session).await;
        }

        // Step 5: determine command_name, or reject the structural shape.
        let command_name = match top.name.local.as_str() {
            "command" => {
                let Some(command_el) = top.first_child_element() else {
                    return terminal_free(structural_error(sv_trid));
                };
                command_el.name.local.clone()
            }
            "extension" => "other".to_owned(),
            _ => return terminal_free(structural_error(sv_trid)),
        };

        let cl_trid = extract_cl_trid(top);

        // Step 6: auth gate.
        if !session.is_authenticated() && command_name != "login" {
            return terminal_free(
                ResponseBuilder::new()
                    .code(ResultCode::AUTHENTICATION_ERROR)
                    .msg("You are not logged in.")
                    .cl_trid(cl_trid)
                    .sv_trid(sv_trid)
                    .build(),
            );
        }
        if session.is_authenticated() && command_name == "login" {
            return terminal_free(
                ResponseBuilder::new()
                    .code(ResultCode::AUTHENTICATION_ERROR)
                    .msg("You are already logged in.")
                    .cl_trid(cl_trid)
                    .sv_trid(sv_trid)
                    .build(),
            );
        }

        // Step 7: logout short-circuit. Not a registry slot.
        if command_name == "logout" {
            if let Some(hook) = self.registry.session_closed_hook() {
                hook.call(session).await;
            }
            let response = ResponseBuilder::new()
                .code(ResultCode::OK_BYE)
                .msg("Command completed successfully; ending session.")
                .cl_trid(cl_trid)
                .sv_trid(sv_trid)
                .build();
            return DispatchOutcome { frame: response, action: LoopAction::Terminate };
        }

        // Step 8: handler lookup.
        let Some(handler) = self.registry.command_handler(&command_name) else {
            return terminal_free(
                ResponseBuilder::new()
                    .code(ResultCode::UNIMPLEMENTED_COMMAND)
                    .msg(format!("This server does not implement the <{command_name}> command."))
                    .cl_trid(cl_trid)
                    .sv_trid(sv_trid)
                    .build(),
            );
        };

        // Step 9: object-service repertoire check.
        const OBJECT_COMMANDS: [&str; 7] =
            ["check", "info", "create", "delete", "renew", "transfer", "update"];
        if command_name != "login" && OBJECT_COMMANDS.contains(&command_name.as_str()) {
            if let Some(uri) = object_type_uri(top) {
                let in_repertoire = session.objects().is_some_and(|objects| objects.contains(&uri));
                if !in_repertoire {
                    return terminal_free(
                        ResponseBuilder::new()
                            .code(ResultCode::UNIMPLEMENTED_OBJECT_SERVICE)
                            .msg(format!("This server does not support {uri} objects."))
                            .cl_trid(cl_trid)
                            .sv_trid(sv_trid)
                            .build(),
                    );
                }
            }
        }

        // Step 10: extension repertoire check.
        if command_name != "login" {
            if let Some(uri) = unsupported_extension_uri(top, &command_name, session) {
                return terminal_free(
                    ResponseBuilder::new()
                        .code(ResultCode::UNIMPLEMENTED_EXTENSION)
                        .msg(format!("This server does not support the {uri} extension."))
                        .cl_trid(cl_trid)
                        .sv_trid(sv_trid)
                        .build(),
                );
            }
        }

        // Step 11: invoke handler, catching panics.
        let ctx = CommandContext { frame: &frame, session, cl_trid: &cl_trid, sv_trid };
        let reply = AssertUnwindSafe(handler.call(ctx)).catch_unwind().await.unwrap_or_else(|_| {
            warn!(command = %command_name, "handler panicked");
            HandlerReply::Code(ResultCode::COMMAND_FAILED)
        });

        // Step 12: normalize.
        let response = normalize(reply, &cl_trid, sv_trid);

        // Step 13: commit login on success.
        if command_name == "login" {
            if let Some(code) = response_code(&response) {
                if code.is_success() {
                    commit_login_from_frame(session, top);
                }
            }
        }

        // Step 14: response_prepared hook.
        if let Some(hook) = self.registry.response_prepared_hook() {
            hook.call(session, &response).await;
        }

        // Step 15: return, terminating if the code says so.
        let action = response_code(&response)
            .map_or(LoopAction::Continue, |c| if c.is_terminal() { LoopAction::Terminate } else { LoopAction::Continue });
        DispatchOutcome { frame: response, action }
    }
}

fn terminal_free(frame: Document) -> DispatchOutcome {
    let action = response_code(&frame)
        .map_or(LoopAction::Continue, |c| if c.is_terminal() { LoopAction::Terminate } else { LoopAction::Continue });
    DispatchOutcome { frame, action }
}

fn structural_error(sv_trid: &str) -> Document {
    ResponseBuilder::new()
        .code(ResultCode::SYNTAX_ERROR)
        .msg("First child element of <epp> is not <command> or <extension>.")
        .sv_trid(sv_trid)
        .build()
}

fn extract_cl_trid(top: &Element) -> String {
    top.find_child("clTRID").map(Element::text).unwrap_or_default()
}

/// The namespace URI of the innermost object element: the first child of
/// the command element's first child.
fn object_type_uri(top: &Element) -> Option<String> {
    let command_el = top.first_child_element()?;
    let object_envelope = command_el.first_child_element()?;
    object_envelope.name.ns.clone()
}

/// The first extension namespace URI not present in the session's
/// negotiated repertoire, if any.
///
/// `<extension>` is nested inside `<command>` as a sibling of the
/// command-type element for every normal command; for the bare
/// extension-only "other" path, `top` itself is the `<extension>` element.
fn unsupported_extension_uri(top: &Element, command_name: &str, session: &Session) -> Option<String> {
    let extension = if command_name == "other" { Some(top) } else { top.find_child("extension") }?;
    let allowed = session.extensions();
    extension.child_elements().find_map(|child| {
        let uri = child.name.ns.clone()?;
        let permitted = allowed.is_some_and(|set| set.contains(&uri));
        if permitted { None } else { Some(uri) }
    })
}

fn commit_login_from_frame(session: &mut Session, top: &Element) {
    let Some(command_el) = top.first_child_element() else { return };
    let clid = command_el.find_child("clID").map(Element::text).unwrap_or_default();
    let lang = command_el
        .find_child("options")
        .and_then(|options| options.find_child("lang"))
        .map(Element::text)
        .unwrap_or_else(|| "en".to_owned());

    let svc_menu = command_el.find_child("svcs");
    let objects: BTreeSet<String> = svc_menu
        .into_iter()
        .flat_map(|m| m.child_elements())
        .filter(|e| e.name.local == "objURI")
        .map(Element::text)
        .collect();
    let extensions: BTreeSet<String> = svc_menu
        .and_then(|m| m.find_child("svcExtension"))
        .into_iter()
        .flat_map(|ext| ext.child_elements())
        .filter(|e| e.name.local == "extURI")
        .map(Element::text)
        .collect();

    session.commit_login(clid, lang, objects, extensions);
}

fn response_code(doc: &Document) -> Option<ResultCode> {
    let child = doc.root.first_child_element()?;
    if child.name.local == "greeting" {
        return Some(ResultCode::OK);
    }
    let result = child.find_child("result")?;
    let raw = result.attrs.iter().find(|(name, _)| name.local == "code")?.1.as_str();
    raw.parse::<u16>().ok().map(ResultCode::new)
}

/// Coerce a handler's return value into a response document.
fn normalize(reply: HandlerReply, cl_trid: &str, sv_trid: &str) -> Document {
    match reply {
        HandlerReply::Document(doc) => doc,
        HandlerReply::Code(code) => {
            ResponseBuilder::new().code(code).cl_trid(cl_trid).sv_trid(sv_trid).build()
        }
        HandlerReply::CodeMessage(code, msg) => {
            ResponseBuilder::new().code(code).msg(msg).cl_trid(cl_trid).sv_trid(sv_trid).build()
        }
        HandlerReply::CodeElements(code, elements) => {
            let mut builder = ResponseBuilder::new().code(code).cl_trid(cl_trid).sv_trid(sv_trid);
            let mut seen = BTreeSet::new();
            for element in elements {
                let local = element.name.local.clone();
                if !matches!(local.as_str(), "resData" | "msgQ" | "extension") {
                    warn!(local, "return-value normalizer: unrecognized element name, skipping");
                    continue;
                }
                if !seen.insert(local.clone()) {
                    warn!(local, "return-value normalizer: duplicate element, first wins");
                    continue;
                }
                builder = builder.child(element);
            }
            builder.build()
        }
    }
}
