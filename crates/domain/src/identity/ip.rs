//! Client IP address.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::Deref;

/// Value object of a client IP address, recorded on refresh token creation
/// and revocation.
///
/// Best effort: unknown or malformed addresses become `0.0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddress(String);

impl IpAddress {
    /// Address used when the client IP is unknown.
    pub const UNSPECIFIED: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

    /// Parses an optional textual address. Never fails.
    pub fn parse_or_unspecified(ip: Option<&str>) -> Self {
        let ip = ip
            .map(str::trim)
            .and_then(|ip| ip.parse::<IpAddr>().ok())
            .unwrap_or(Self::UNSPECIFIED);

        Self(ip.to_string())
    }

    /// Restores an address exactly as it was stored.
    pub fn restore(ip: impl Into<String>) -> Self {
        Self(ip.into())
    }

    /// Returns the same string as a string slice `&str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IpAddress {
    fn default() -> Self {
        Self(Self::UNSPECIFIED.to_string())
    }
}

impl From<IpAddr> for IpAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for IpAddress {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ip_is_unspecified() {
        assert_eq!(IpAddress::parse_or_unspecified(None).as_str(), "0.0.0.0");
        assert_eq!(IpAddress::default().as_str(), "0.0.0.0");
    }

    #[test]
    fn test_malformed_ip_is_unspecified() {
        let ip = IpAddress::parse_or_unspecified(Some("not an ip"));
        assert_eq!(ip.as_str(), "0.0.0.0");
    }

    #[test]
    fn test_valid_ip_is_kept() {
        let v4 = IpAddress::parse_or_unspecified(Some(" 1.2.3.4 "));
        let v6 = IpAddress::parse_or_unspecified(Some("::1"));
        assert_eq!(v4.as_str(), "1.2.3.4");
        assert_eq!(v6.as_str(), "::1");
    }
}
