//! Per-connection session state: a two-state machine tracking whether the
//! connection has authenticated, and if so, what it negotiated.
//!
//! A [`Session`] is created fresh on connection accept and lives only for
//! that connection — nothing here is ever persisted to disk. It is mutated
//! in exactly one place: the dispatcher's login-commit step.

use std::collections::BTreeSet;

/// The two states a connection's session can be in.
///
/// Replacing scattered `Option<String>` checks with this enum means the
/// dispatcher's auth gate is a single match rather
/// than a handful of independent `is_some`/`is_none` checks that could drift
/// out of sync with each other.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No successful `login` has occurred yet. The only command the
    /// dispatcher will route to a handler is `login`.
    Unauthenticated,
    /// `login` succeeded. `clid`/`lang`/`objects`/`extensions` are read-only
    /// from this point on, for the lifetime of the connection.
    Authenticated {
        /// The authenticated client identifier.
        clid: String,
        /// The negotiated language tag.
        lang: String,
        /// Object-service namespace URIs negotiated at login.
        objects: BTreeSet<String>,
        /// Extension namespace URIs negotiated at login.
        extensions: BTreeSet<String>,
    },
}

/// Per-connection session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Server-side identifier seed minted at session start, used to derive
    /// `svTRID` values for this connection.
    pub sv_trid_seed: String,
    state: SessionState,
}

impl Session {
    /// Create a fresh, unauthenticated session.
    #[must_use]
    pub const fn new(sv_trid_seed: String) -> Self {
        Self { sv_trid_seed, state: SessionState::Unauthenticated }
    }

    /// The current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState { &self.state }

    /// Whether `login` has succeeded on this connection.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// The authenticated client identifier, if logged in.
    #[must_use]
    pub fn clid(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { clid, .. } => Some(clid.as_str()),
            SessionState::Unauthenticated => None,
        }
    }

    /// The negotiated language, if logged in.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { lang, .. } => Some(lang.as_str()),
            SessionState::Unauthenticated => None,
        }
    }

    /// The negotiated object-service repertoire, if logged in.
    #[must_use]
    pub fn objects(&self) -> Option<&BTreeSet<String>> {
        match &self.state {
            SessionState::Authenticated { objects, .. } => Some(objects),
            SessionState::Unauthenticated => None,
        }
    }

    /// The negotiated extension repertoire, if logged in.
    #[must_use]
    pub fn extensions(&self) -> Option<&BTreeSet<String>> {
        match &self.state {
            SessionState::Authenticated { extensions, .. } => Some(extensions),
            SessionState::Unauthenticated => None,
        }
    }

    /// Commit a successful `login`, transitioning
    /// `Unauthenticated -> Authenticated`.
    ///
    /// Calling this while already authenticated overwrites the prior
    /// repertoire; the dispatcher never does this in practice since step 6
    /// rejects `login` once authenticated, but the method itself has no
    /// reason to enforce that — it is a pure state transition.
    pub fn commit_login(
        &mut self,
        clid: String,
        lang: String,
        objects: BTreeSet<String>,
        extensions: BTreeSet<String>,
    ) {
        self.state = SessionState::Authenticated { clid, lang, objects, extensions };
    }
}
