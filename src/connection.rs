//! Connection Loop.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::dispatch::{AlwaysValid, Dispatcher, LoopAction, SchemaValidator};
use crate::framer::{self, DEFAULT_READ_TIMEOUT, FrameError};
use crate::result_code::ResultCode;
use crate::session::Session;
use crate::trid::TridGenerator;
use crate::xml::build::serialize_document;

/// Drives one accepted connection from the initial greeting to the final
/// response.
///
/// Generic over the stream so the core never depends on a TLS stack;
/// certificate handling happens before a stream reaches this function.
pub async fn run_connection<S>(stream: S, dispatcher: &Dispatcher, read_timeout: Duration)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    run_connection_with_validator(stream, dispatcher, read_timeout, &AlwaysValid).await;
}

/// As [`run_connection`], but with an explicit schema validator.
pub async fn run_connection_with_validator<S>(
    mut stream: S,
    dispatcher: &Dispatcher,
    read_timeout: Duration,
    validator: &dyn SchemaValidator,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let sv_trid_seed = TridGenerator::new().next_id();
    let mut session = Session::new(sv_trid_seed);

    const HELLO_FRAME: &[u8] = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><hello/></epp>"#;
    let greeting = dispatcher.dispatch(&mut session, HELLO_FRAME, validator).await.frame;
    if send(&mut stream, &greeting).await.is_err() {
        return;
    }

    loop {
        let payload = match framer::read_frame(&mut stream, read_timeout).await {
            Ok(payload) => payload,
            Err(FrameError::Timeout) => {
                info!("connection idle-timed out, closing");
                return;
            }
            Err(FrameError::Eof) => {
                info!("peer closed connection");
                return;
            }
            Err(err) => {
                warn!(error = %err, "frame read failed, closing connection");
                return;
            }
        };

        let outcome = dispatcher.dispatch(&mut session, &payload, validator).await;
        if send(&mut stream, &outcome.frame).await.is_err() {
            return;
        }

        if outcome.action == LoopAction::Terminate {
            return;
        }
    }
}

async fn send<S>(stream: &mut S, frame: &crate::xml::Document) -> Result<(), FrameError>
where
    S: AsyncWrite + Unpin,
{
    let payload = match serialize_document(frame) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound frame");
            return Err(FrameError::Eof);
        }
    };
    framer::write_frame(stream, &payload).await
}
