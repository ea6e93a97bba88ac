#![allow(missing_docs, reason = "test file")]
#![allow(clippy::expect_used, reason = "test assertions")]
#![allow(clippy::unwrap_used, reason = "test assertions")]
#![allow(clippy::indexing_slicing, reason = "test assertions with known bounds")]

//! End-to-end scenarios against a live, in-memory connection loop, covering
//! the literal walkthroughs an EPP client/server exchange must satisfy.

use std::sync::Arc;
use std::time::Duration;

use epp_core::{
    run_connection, CommandContext, Dispatcher, GreetingMetadata, HandlerRegistry, HandlerReply,
    ResultCode,
};
use tokio::io::duplex;

mod support {
    pub mod framer {
        use std::time::Duration;

        use epp_core::framer;

        pub async fn read<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> Vec<u8> {
            framer::read_frame(reader, Duration::from_secs(5)).await.expect("frame read")
        }

        pub async fn write<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) {
            framer::write_frame(writer, payload).await.expect("frame write");
        }
    }
}

fn registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .hello(|| async {
            GreetingMetadata {
                sv_id: Some("epp.example.com".to_owned()),
                lang: vec!["en".to_owned()],
                objects: vec!["urn:ietf:params:xml:ns:domain-1.0".to_owned()],
                extensions: vec!["urn:ietf:params:xml:ns:secDNS-1.1".to_owned()],
            }
        })
        .command("login", |_: CommandContext<'_>| async { HandlerReply::Code(ResultCode::OK) })
        .command("check", |_: CommandContext<'_>| async { HandlerReply::Code(ResultCode::OK) })
        .command("info", |_: CommandContext<'_>| async { HandlerReply::Code(ResultCode::OK) })
}

async fn harness() -> tokio::io::DuplexStream {
    let dispatcher = Arc::new(Dispatcher::new(registry()));
    let (client, server) = duplex(16 * 1024);
    tokio::spawn(async move {
        run_connection(server, &dispatcher, Duration::from_secs(5)).await;
    });
    client
}

#[tokio::test]
async fn scenario_1_greeting_advertises_configured_repertoire() {
    let mut client = harness().await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid greeting");
    let greeting = doc.root.find_child("greeting").expect("greeting");

    assert_eq!(greeting.find_child("svID").expect("svID").text(), "epp.example.com");
    let svc_menu = greeting.find_child("svcMenu").expect("svcMenu");
    assert_eq!(
        svc_menu.find_child("objURI").expect("objURI").text(),
        "urn:ietf:params:xml:ns:domain-1.0"
    );
    let ext = svc_menu.find_child("svcExtension").expect("svcExtension");
    assert_eq!(ext.find_child("extURI").expect("extURI").text(), "urn:ietf:params:xml:ns:secDNS-1.1");

    let sv_date = greeting.find_child("svDate").expect("svDate").text();
    assert!(chrono::DateTime::parse_from_rfc3339(&sv_date.replace(".0Z", "Z")).is_ok());
}

#[tokio::test]
async fn scenario_2_command_before_login_is_rejected() {
    let mut client = harness().await;
    let _greeting = support::framer::read(&mut client).await;

    let check = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><check/><clTRID>ABC-1</clTRID></command></epp>"#;
    support::framer::write(&mut client, check).await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid xml");
    let result = doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "2200");
    assert_eq!(result.find_child("msg").expect("msg").text(), "You are not logged in.");
}

#[tokio::test]
async fn scenario_3_login_then_unsupported_object_service() {
    let mut client = harness().await;
    let _greeting = support::framer::read(&mut client).await;

    let login = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><login><clID>gavin</clID><pw>foo2bar</pw><svcs><objURI>urn:ietf:params:xml:ns:domain-1.0</objURI><svcExtension><extURI>urn:ietf:params:xml:ns:loginSec-1.0</extURI></svcExtension></svcs></login></command></epp>"#;
    support::framer::write(&mut client, login).await;
    let login_payload = support::framer::read(&mut client).await;
    let login_doc = epp_core::xml::parse_document(&login_payload).expect("valid xml");
    let login_result =
        login_doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(login_result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "1000");

    let check = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><check><contact:check xmlns:contact="urn:ietf:params:xml:ns:contact-1.0"/></check></command></epp>"#;
    support::framer::write(&mut client, check).await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid xml");
    let result = doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "2307");
    assert_eq!(
        result.find_child("msg").expect("msg").text(),
        "This server does not support urn:ietf:params:xml:ns:contact-1.0 objects."
    );
}

#[tokio::test]
async fn scenario_4_unsupported_extension_after_login() {
    let mut client = harness().await;
    let _greeting = support::framer::read(&mut client).await;

    let login = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><login><clID>gavin</clID><svcs><objURI>urn:ietf:params:xml:ns:domain-1.0</objURI></svcs></login></command></epp>"#;
    support::framer::write(&mut client, login).await;
    let _login_response = support::framer::read(&mut client).await;

    let info = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><info><domain:info xmlns:domain="urn:ietf:params:xml:ns:domain-1.0"/></info><extension><secDNS:ext xmlns:secDNS="urn:ietf:params:xml:ns:secDNS-1.1"/></extension></command></epp>"#;
    support::framer::write(&mut client, info).await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid xml");
    let result = doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "2103");
    assert_eq!(
        result.find_child("msg").expect("msg").text(),
        "This server does not support the urn:ietf:params:xml:ns:secDNS-1.1 extension."
    );
}

#[tokio::test]
async fn scenario_5_malformed_xml_keeps_session_alive() {
    let mut client = harness().await;
    let _greeting = support::framer::read(&mut client).await;

    support::framer::write(&mut client, b"<epp><command").await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid xml");
    let result = doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "2001");
    assert_eq!(result.find_child("msg").expect("msg").text(), "XML parse error.");

    // session still alive: a well-formed frame gets a further response.
    let check = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><check/></command></epp>"#;
    support::framer::write(&mut client, check).await;
    let _second_response = support::framer::read(&mut client).await;
}

#[tokio::test]
async fn scenario_6_logout_after_login_ends_the_session() {
    let mut client = harness().await;
    let _greeting = support::framer::read(&mut client).await;

    let login = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><login><clID>gavin</clID></login></command></epp>"#;
    support::framer::write(&mut client, login).await;
    let _login_response = support::framer::read(&mut client).await;

    let logout = br#"<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><command><logout/></command></epp>"#;
    support::framer::write(&mut client, logout).await;
    let payload = support::framer::read(&mut client).await;
    let doc = epp_core::xml::parse_document(&payload).expect("valid xml");
    let result = doc.root.find_child("response").expect("response").find_child("result").expect("result");
    assert_eq!(result.attrs.iter().find(|(n, _)| n.local == "code").expect("code").1, "1500");
    assert_eq!(
        result.find_child("msg").expect("msg").text(),
        "Command completed successfully; ending session."
    );
}
