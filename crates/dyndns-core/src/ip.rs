//! IP address literal validation and comparison
//!
//! Three untrusted inputs pass through here: the echo service response, the
//! value stored in the DNS record, and the value about to be written back.

use crate::error::{Error, Result};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Returns `true` iff `candidate` is an IPv4 dotted-quad or IPv6 literal.
///
/// Hostnames, empty strings, surrounding whitespace and out-of-range octets
/// are rejected.
pub fn is_valid_ip_address(candidate: &str) -> bool {
    let valid = candidate.parse::<IpAddr>().is_ok();
    tracing::trace!(candidate, valid, "validated IP address literal");
    valid
}

/// Address-level equality of two literals.
///
/// Compares parsed addresses, so differently written forms of the same
/// address (`2001:db8::1` and `2001:0db8:0:0:0:0:0:1`, or `::ffff:1.2.3.4`
/// and `1.2.3.4`) are equal. Empty or unparsable input is never equal to
/// anything.
pub fn addresses_equal(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a.to_canonical() == b.to_canonical(),
        _ => false,
    }
}

/// A validated IP address literal.
///
/// Keeps the text exactly as received alongside its parsed form: the text is
/// what gets written to the provider, the parsed form is what gets compared.
#[derive(Debug, Clone)]
pub struct IpAddress {
    literal: String,
    addr: IpAddr,
}

impl IpAddress {
    /// Validate `literal` as an IP address.
    pub fn parse(literal: impl Into<String>) -> Result<Self> {
        let literal = literal.into();
        let addr = literal
            .parse::<IpAddr>()
            .map_err(|_| Error::validation(format!("invalid IP address: {literal:?}")))?;

        Ok(Self { literal, addr })
    }

    /// The literal as received
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// The parsed address
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn is_ipv6(&self) -> bool {
        self.addr.to_canonical().is_ipv6()
    }

    /// Address-level equality, see [`addresses_equal`].
    pub fn same_address(&self, other: &IpAddress) -> bool {
        self.addr.to_canonical() == other.addr.to_canonical()
    }
}

impl FromStr for IpAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        Self {
            literal: addr.to_string(),
            addr,
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}
