//! Response Builder.

use crate::result_code::ResultCode;
use crate::xml::{Document, Element, EPP_NS, QName};

/// The three optional response-body elements, in the order they must appear
/// within `<response>` regardless of the order a handler supplied them.
const CHILD_ORDER: [&str; 3] = ["resData", "msgQ", "extension"];

/// Builds a `<response>` frame.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    code: Option<ResultCode>,
    msg: Option<String>,
    cl_trid: Option<String>,
    sv_trid: Option<String>,
    children: Vec<Element>,
}

impl ResponseBuilder {
    /// Start building a response, defaulting to `1000 OK`.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the result code. Defaults to `1000` if never called.
    #[must_use]
    pub fn code(mut self, code: ResultCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set an explicit message, overriding the code's default.
    #[must_use]
    pub fn msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    /// Set the echoed client transaction ID.
    #[must_use]
    pub fn cl_trid(mut self, cl_trid: impl Into<String>) -> Self {
        self.cl_trid = Some(cl_trid.into());
        self
    }

    /// Set the minted server transaction ID.
    #[must_use]
    pub fn sv_trid(mut self, sv_trid: impl Into<String>) -> Self {
        self.sv_trid = Some(sv_trid.into());
        self
    }

    /// Attach a `resData`, `msgQ`, or `extension` element. The element is
    /// deep-cloned as-is; ordering among several calls does not matter, only
    /// which local names were supplied.
    #[must_use]
    pub fn child(mut self, element: Element) -> Self {
        self.children.push(element);
        self
    }

    /// Build the `<epp><response>…</response></epp>` document.
    #[must_use]
    pub fn build(self) -> Document {
        let code = self.code.unwrap_or(ResultCode::OK);
        let msg = self.msg.unwrap_or_else(|| code.default_message().to_owned());

        let result = Element::new(QName::unqualified("result"))
            .with_attr(QName::unqualified("code"), code.to_string())
            .with_child(Element::new(QName::unqualified("msg")).with_child(msg));

        let mut response = Element::new(QName::unqualified("response")).with_child(result);

        for local in CHILD_ORDER {
            if let Some(element) = self.children.iter().find(|e| e.name.local == local) {
                response.push_child(element.clone());
            }
        }

        if self.cl_trid.is_some() || self.sv_trid.is_some() {
            let mut tr_id = Element::new(QName::unqualified("trID"));
            if let Some(cl_trid) = self.cl_trid {
                tr_id.push_child(Element::new(QName::unqualified("clTRID")).with_child(cl_trid));
            }
            if let Some(sv_trid) = self.sv_trid {
                tr_id.push_child(Element::new(QName::unqualified("svTRID")).with_child(sv_trid));
            }
            response.push_child(tr_id);
        }

        let root = Element::new(QName::new("epp", Some(EPP_NS))).with_child(response);
        Document { root }
    }
}
