//! The EPP result code newtype.
//!
//! Classification is computed from the numeric bands RFC 5730 defines, not
//! via membership checks against a list of literals, so a code the engine
//! has never seen before (a handler-chosen business-failure code, say) is
//! still classified correctly.

use std::fmt;

/// An RFC 5730 result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultCode(u16);

impl ResultCode {
    /// 1000 — command completed successfully.
    pub const OK: Self = Self(1000);
    /// 1300 — command completed successfully; no messages.
    pub const OK_NO_MESSAGES: Self = Self(1300);
    /// 1500 — command completed successfully; ending session.
    pub const OK_BYE: Self = Self(1500);
    /// 2000 — unknown command.
    pub const UNKNOWN_COMMAND: Self = Self(2000);
    /// 2001 — command syntax error.
    pub const SYNTAX_ERROR: Self = Self(2001);
    /// 2101 — unimplemented command.
    pub const UNIMPLEMENTED_COMMAND: Self = Self(2101);
    /// 2102 — unimplemented option.
    pub const UNIMPLEMENTED_OPTION: Self = Self(2102);
    /// 2103 — unimplemented extension.
    pub const UNIMPLEMENTED_EXTENSION: Self = Self(2103);
    /// 2200 — authentication error.
    pub const AUTHENTICATION_ERROR: Self = Self(2200);
    /// 2307 — unimplemented object service.
    pub const UNIMPLEMENTED_OBJECT_SERVICE: Self = Self(2307);
    /// 2400 — command failed.
    pub const COMMAND_FAILED: Self = Self(2400);
    /// 2500 — command failed; ending session.
    pub const COMMAND_FAILED_BYE: Self = Self(2500);

    /// The lowest integer a handler may return as a bare result code.
    pub const MIN_HANDLER_CODE: i64 = 1000;
    /// The highest integer a handler may return as a bare result code.
    pub const MAX_HANDLER_CODE: i64 = 2502;

    /// Build a result code from its numeric value, without validating it
    /// against the RFC 5730 range. Used for codes the engine itself
    /// constructs from known-good constants.
    #[must_use]
    pub const fn new(code: u16) -> Self { Self(code) }

    /// Parse a handler-returned integer result code, which is any integer
    /// in `[1000, 2502]`.
    #[must_use]
    pub fn from_handler_int(code: i64) -> Option<Self> {
        if (Self::MIN_HANDLER_CODE..=Self::MAX_HANDLER_CODE).contains(&code) {
            u16::try_from(code).ok().map(Self)
        } else {
            None
        }
    }

    /// The raw numeric code.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Codes below 2000 indicate success.
    #[must_use]
    pub const fn is_success(self) -> bool { self.0 < 2000 }

    /// Codes at or above 2000 indicate an error.
    #[must_use]
    pub const fn is_error(self) -> bool { !self.is_success() }

    /// `1500` specifically (a graceful, successful session end).
    #[must_use]
    pub const fn is_bye(self) -> bool { self.0 == Self::OK_BYE.0 }

    /// `1500` or `>= 2500`: the session ends after this response is sent.
    #[must_use]
    pub const fn is_terminal(self) -> bool { self.is_bye() || self.0 >= Self::COMMAND_FAILED_BYE.0 }

    /// The default message for this code's success/error band.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        if self.is_success() { "Command completed successfully." } else { "Command failed." }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:04}", self.0) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(999, None)]
    #[case(1000, Some(1000))]
    #[case(2502, Some(2502))]
    #[case(2503, None)]
    fn from_handler_int_bounds(#[case] input: i64, #[case] expected: Option<u16>) {
        assert_eq!(ResultCode::from_handler_int(input).map(ResultCode::get), expected);
    }

    #[rstest]
    #[case(ResultCode::OK, true, false, false)]
    #[case(ResultCode::OK_BYE, true, true, true)]
    #[case(ResultCode::UNKNOWN_COMMAND, false, false, false)]
    #[case(ResultCode::COMMAND_FAILED_BYE, false, false, true)]
    fn classification_bands(
        #[case] code: ResultCode,
        #[case] success: bool,
        #[case] bye: bool,
        #[case] terminal: bool,
    ) {
        assert_eq!(code.is_success(), success);
        assert_eq!(code.is_bye(), bye);
        assert_eq!(code.is_terminal(), terminal);
    }

    #[rstest]
    fn display_pads_to_four_digits() {
        assert_eq!(ResultCode::new(1000).to_string(), "1000");
    }
}
