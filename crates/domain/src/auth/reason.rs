//! Refresh token revocation reasons.

use std::fmt;

/// Why a refresh token was revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationReason {
    /// Token was used once and replaced by a new one.
    Rotation,
    /// An already revoked token was presented again; the downstream chain is
    /// revoked with this reason.
    ReuseDetected,
    /// User explicitly logged out.
    Logout,
    /// Revocation requested without a reason.
    NotSpecified,
    /// Free-form reason supplied by the caller.
    Other(String),
}

impl RevocationReason {
    /// Build a reason from caller input, blank input meaning
    /// [`RevocationReason::NotSpecified`].
    pub fn from_input(reason: Option<&str>) -> Self {
        match reason.map(str::trim) {
            None | Some("") => Self::NotSpecified,
            Some(reason) => Self::parse(reason),
        }
    }

    /// Restore a reason from its stored text.
    pub fn parse(reason: &str) -> Self {
        match reason {
            "rotation" => Self::Rotation,
            "reuse_detected" => Self::ReuseDetected,
            "logout" => Self::Logout,
            "not_specified" => Self::NotSpecified,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Rotation => "rotation",
            Self::ReuseDetected => "reuse_detected",
            Self::Logout => "logout",
            Self::NotSpecified => "not_specified",
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
