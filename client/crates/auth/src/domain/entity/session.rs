//! Session Entity
//!
//! Represents the authenticated user session held in memory. The single
//! invariant: an identity exists if and only if a token exists. Both are
//! set and cleared together by the session service; nothing else holds a
//! mutable handle to either.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{BearerToken, Email, Nickname, Role};

/// Fully established identity, as issued by a completed login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub nickname: Nickname,
    /// Real/display name; falls back to the nickname when the backend omits it
    pub name: String,
    pub email: Email,
    pub role: Role,
}

/// What the session knows about who is logged in
///
/// A reload only persists the token and nickname, so a restored session
/// carries a deliberately partial identity: role and email stay unknown
/// until a real login re-establishes them. Keeping the two shapes distinct
/// means no code path can read a fabricated role out of a restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    /// Established by a completed login in this process lifetime
    Known(Identity),
    /// Restored optimistically from persisted credentials
    Restored { nickname: Nickname },
}

impl SessionIdentity {
    pub fn nickname(&self) -> &Nickname {
        match self {
            SessionIdentity::Known(identity) => &identity.nickname,
            SessionIdentity::Restored { nickname } => nickname,
        }
    }

    /// Role, when it is actually known
    pub fn role(&self) -> Option<Role> {
        match self {
            SessionIdentity::Known(identity) => Some(identity.role),
            SessionIdentity::Restored { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&Email> {
        match self {
            SessionIdentity::Known(identity) => Some(&identity.email),
            SessionIdentity::Restored { .. } => None,
        }
    }

    pub const fn is_established(&self) -> bool {
        matches!(self, SessionIdentity::Known(_))
    }
}

/// The in-memory session
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: SessionIdentity,
    pub token: BearerToken,
    /// When this process first observed the session (login or restore)
    pub established_at: DateTime<Utc>,
}

impl Session {
    /// Session created by a completed login
    pub fn established(identity: Identity, token: BearerToken) -> Self {
        Self {
            identity: SessionIdentity::Known(identity),
            token,
            established_at: Utc::now(),
        }
    }

    /// Session restored from persisted credentials at startup
    pub fn restored(nickname: Nickname, token: BearerToken) -> Self {
        Self {
            identity: SessionIdentity::Restored { nickname },
            token,
            established_at: Utc::now(),
        }
    }

    pub fn nickname(&self) -> &Nickname {
        self.identity.nickname()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.role()
    }
}
