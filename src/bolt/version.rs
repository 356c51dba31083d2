//! Bolt protocol and server version definitions.

use std::cmp::Ordering;
use std::fmt;

use crate::driver::{DriverError, DriverResult};

/// Bolt protocol versions.
///
/// Version numbers are encoded as 4-byte big-endian integers:
/// - Major version in high 2 bytes
/// - Minor version in low 2 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BoltVersion {
    /// Bolt 1 - INIT handshake, `result_available_after` metadata keys
    V1 = 0x0000_0001,
    /// Bolt 2 - adds temporal and spatial types
    V2 = 0x0000_0002,
    /// Bolt 3 - HELLO handshake, explicit BEGIN, `t_first`/`t_last` metadata keys
    V3 = 0x0000_0003,
    /// Bolt 4.0
    V4_0 = 0x0004_0000,
    /// Bolt 4.4
    V4_4 = 0x0004_0004,
    /// Bolt 5.0
    V5_0 = 0x0005_0000,
}

impl BoltVersion {
    /// Create a BoltVersion from a raw u32 value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x0000_0001 => Some(BoltVersion::V1),
            0x0000_0002 => Some(BoltVersion::V2),
            0x0000_0003 => Some(BoltVersion::V3),
            0x0004_0000 => Some(BoltVersion::V4_0),
            0x0004_0004 => Some(BoltVersion::V4_4),
            0x0005_0000 => Some(BoltVersion::V5_0),
            _ => None,
        }
    }

    /// Get the raw u32 value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get the major version number.
    pub fn major(self) -> u16 {
        match self {
            BoltVersion::V1 | BoltVersion::V2 | BoltVersion::V3 => self.as_u32() as u16,
            _ => (self.as_u32() >> 16) as u16,
        }
    }

    /// Get the minor version number.
    pub fn minor(self) -> u16 {
        match self {
            BoltVersion::V1 | BoltVersion::V2 | BoltVersion::V3 => 0,
            _ => (self.as_u32() & 0xFFFF) as u16,
        }
    }

    /// Whether connections are initialized with HELLO (and report a connection id).
    /// Older versions use INIT.
    pub fn uses_hello(self) -> bool {
        self >= BoltVersion::V3
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

impl PartialOrd for BoltVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BoltVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major(), self.minor()).cmp(&(other.major(), other.minor()))
    }
}

/// Server product version as reported in the `server` entry of the
/// initialization SUCCESS, e.g. `Zeta4G/1.2.0` or `Neo4j/3.5.11`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerVersion {
    product: String,
    major: u32,
    minor: u32,
    patch: u32,
}

impl ServerVersion {
    /// Create a server version.
    pub fn new(product: impl Into<String>, major: u32, minor: u32, patch: u32) -> Self {
        Self {
            product: product.into(),
            major,
            minor,
            patch,
        }
    }

    /// Parse `<product>/<major>.<minor>[.<patch>][-suffix]`.
    pub fn parse(agent: &str) -> DriverResult<Self> {
        let invalid = || DriverError::protocol(format!("Cannot parse server version '{}'", agent));

        let (product, version) = agent.split_once('/').ok_or_else(invalid)?;
        if product.is_empty() {
            return Err(invalid());
        }

        let numeric = version.split('-').next().unwrap_or(version);
        let mut parts = numeric.split('.').map(str::parse::<u32>);
        let major = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
        let minor = parts.next().and_then(Result::ok).ok_or_else(invalid)?;
        let patch = match parts.next() {
            Some(part) => part.map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self::new(product, major, minor, patch))
    }

    /// Product name.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// `(major, minor, patch)`.
    pub fn numbers(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// Whether this server is at least `major.minor.patch`.
    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        self.numbers() >= (major, minor, patch)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}.{}", self.product, self.major, self.minor, self.patch)
    }
}
