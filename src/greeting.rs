//! Greeting Builder.
//!
//! The parts of the greeting that do not depend on send time — `<svID>`,
//! languages, object and extension URIs, and the fixed `<dcp>` block — are
//! computed once and cached; `<svDate>` is always computed fresh so two
//! greetings sent seconds apart are identical except for that one element.

use tokio::sync::OnceCell;

use crate::registry::{GreetingMetadata, HelloHandler};
use crate::xml::{Document, Element, EPP_NS, QName};

/// Builds and caches greeting frames for one handler registry's lifetime.
#[derive(Default)]
pub struct GreetingBuilder {
    skeleton: OnceCell<Element>,
}

impl GreetingBuilder {
    /// Construct a builder with nothing cached yet.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Build the current greeting frame, invoking the `hello` handler (if
    /// registered) only on the first call.
    pub async fn build(&self, hello: Option<&dyn HelloHandler>) -> Document {
        let skeleton = self
            .skeleton
            .get_or_init(|| async {
                let metadata = match hello {
                    Some(handler) => handler.call().await,
                    None => GreetingMetadata {
                        sv_id: None,
                        lang: Vec::new(),
                        objects: Vec::new(),
                        extensions: Vec::new(),
                    },
                };
                build_skeleton(&metadata)
            })
            .await;

        let mut greeting = skeleton.clone();
        // svDate must be the second child, right after svID; the skeleton
        // caches everything else, so it is spliced in fresh on every call.
        greeting.children.insert(1, sv_date_element().into());

        let root = Element::new(QName::new("epp", Some(EPP_NS))).with_child(greeting);
        Document { root }
    }
}

fn sv_date_element() -> Element {
    let now = chrono::Utc::now();
    let formatted = format!("{}.0Z", now.format("%Y-%m-%dT%H:%M:%S"));
    Element::new(QName::unqualified("svDate")).with_child(formatted)
}

fn default_sv_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_owned())
        .to_lowercase()
}

fn build_skeleton(metadata: &GreetingMetadata) -> Element {
    let sv_id = metadata.sv_id.clone().unwrap_or_else(default_sv_id);
    let langs = if metadata.lang.is_empty() { vec!["en".to_owned()] } else { metadata.lang.clone() };

    let mut svc_menu = Element::new(QName::unqualified("svcMenu"))
        .with_child(Element::new(QName::unqualified("version")).with_child("1.0"));
    for lang in &langs {
        svc_menu.push_child(Element::new(QName::unqualified("lang")).with_child(lang.as_str()));
    }
    for uri in &metadata.objects {
        svc_menu.push_child(Element::new(QName::unqualified("objURI")).with_child(uri.as_str()));
    }
    if !metadata.extensions.is_empty() {
        let mut svc_extension = Element::new(QName::unqualified("svcExtension"));
        for uri in &metadata.extensions {
            svc_extension.push_child(Element::new(QName::unqualified("extURI")).with_child(uri.as_str()));
        }
        svc_menu.push_child(svc_extension);
    }

    let dcp = Element::new(QName::unqualified("dcp"))
        .with_child(Element::new(QName::unqualified("access")).with_child(Element::new(QName::unqualified("all"))))
        .with_child(
            Element::new(QName::unqualified("statement")).with_child(
                Element::new(QName::unqualified("purpose"))
                    .with_child(Element::new(QName::unqualified("prov"))),
            ),
        )
        .with_child(
            Element::new(QName::unqualified("recipient"))
                .with_child(Element::new(QName::unqualified("public"))),
        )
        .with_child(
            Element::new(QName::unqualified("retention"))
                .with_child(Element::new(QName::unqualified("legal"))),
        );

    // svID is pushed first and svDate is inserted after it on every build();
    // the skeleton otherwise holds svcMenu and dcp.
    Element::new(QName::unqualified("greeting"))
        .with_child(Element::new(QName::unqualified("svID")).with_child(sv_id))
        .with_child(svc_menu)
        .with_child(dcp)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::registry::GreetingMetadata;

    fn metadata() -> GreetingMetadata {
        GreetingMetadata {
            sv_id: Some("epp.example.com".to_owned()),
            lang: vec!["en".to_owned()],
            objects: vec!["urn:ietf:params:xml:ns:domain-1.0".to_owned()],
            extensions: vec!["urn:ietf:params:xml:ns:secDNS-1.1".to_owned()],
        }
    }

    #[rstest]
    #[tokio::test]
    async fn builds_expected_structure() {
        let builder = GreetingBuilder::new();
        let md = metadata();
        let doc = builder.build(Some(&move || { let md = md.clone(); async move { md } })).await;
        let greeting = doc.root.find_child("greeting").expect("greeting present");

        let children: Vec<_> = greeting.child_elements().map(|e| e.name.local.clone()).collect();
        assert_eq!(children, vec!["svID", "svDate", "svcMenu", "dcp"]);

        let sv_id = greeting.find_child("svID").expect("svID");
        assert_eq!(sv_id.text(), "epp.example.com");

        let svc_menu = greeting.find_child("svcMenu").expect("svcMenu");
        let ext = svc_menu.find_child("svcExtension").expect("svcExtension present");
        let ext_uri = ext.find_child("extURI").expect("extURI");
        assert_eq!(ext_uri.text(), "urn:ietf:params:xml:ns:secDNS-1.1");
    }

    #[rstest]
    #[tokio::test]
    async fn svc_menu_omits_extension_block_when_none_negotiated() {
        let builder = GreetingBuilder::new();
        let md = GreetingMetadata {
            sv_id: Some("epp.example.com".to_owned()),
            lang: vec![],
            objects: vec!["urn:ietf:params:xml:ns:domain-1.0".to_owned()],
            extensions: vec![],
        };
        let doc = builder.build(Some(&move || { let md = md.clone(); async move { md } })).await;
        let greeting = doc.root.find_child("greeting").expect("greeting");
        let svc_menu = greeting.find_child("svcMenu").expect("svcMenu");
        assert!(svc_menu.find_child("svcExtension").is_none());
        // default language applied
        assert_eq!(svc_menu.find_child("lang").expect("lang").text(), "en");
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_calls_are_identical_except_sv_date() {
        let builder = GreetingBuilder::new();
        let md = metadata();
        let handler = move || {
            let md = md.clone();
            async move { md }
        };
        let first = builder.build(Some(&handler)).await;
        let second = builder.build(Some(&handler)).await;

        let strip_date = |doc: &Document| {
            let mut greeting = doc.root.find_child("greeting").expect("greeting").clone();
            greeting.children.retain(|n| !matches!(n, crate::xml::Node::Element(e) if e.name.local == "svDate"));
            greeting
        };
        assert_eq!(strip_date(&first), strip_date(&second));
    }
}
