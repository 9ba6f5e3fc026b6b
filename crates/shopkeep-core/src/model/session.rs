// ── Session state ──

use serde::Serialize;

/// The signed-in user as far as the storefront cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Stable account id.
    pub uid: String,
    pub email: Option<String>,
}

/// Three-state session signal.
///
/// Starts as `Unknown` until the provider reports for the first time.
/// Transitions are pushed by the authentication provider only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(tag = "state", content = "identity", rename_all = "snake_case")]
pub enum Session {
    #[default]
    #[strum(to_string = "unknown")]
    Unknown,
    #[strum(to_string = "signed out")]
    SignedOut,
    #[strum(to_string = "signed in")]
    SignedIn(Identity),
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

impl From<Option<Identity>> for Session {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::SignedOut, Self::SignedIn)
    }
}
