//! Access pattern definitions
//!
//! A pattern identifier such as `SEQ1M QD8` names the access order, the
//! block size and the queue depth of one test.

use crate::util::units::parse_bytes;
use crate::{DiskIoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifiers of the standard suite, in run order
pub const STANDARD_SUITE: [&str; 4] = ["SEQ1M QD8", "SEQ1M QD1", "RND4K QD64", "RND4K QD1"];

/// Largest block size a pattern may name
pub const MAX_BLOCK_SIZE: u64 = 64 * 1024 * 1024;

/// Order in which blocks are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Sequential,
    Random,
}

impl AccessKind {
    fn prefix(&self) -> &'static str {
        match self {
            AccessKind::Sequential => "SEQ",
            AccessKind::Random => "RND",
        }
    }
}

/// One test configuration of the suite
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessPattern {
    id: String,
    kind: AccessKind,
    block_size: u64,
    queue_depth: u32,
}

impl AccessPattern {
    /// The identifier, also used as result label
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> AccessKind {
        self.kind
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    pub fn queue_depth(&self) -> u32 {
        self.queue_depth
    }

    /// SEQ1M QD8, SEQ1M QD1, RND4K QD64, RND4K QD1
    pub fn standard_suite() -> Vec<AccessPattern> {
        STANDARD_SUITE
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect()
    }
}

impl FromStr for AccessPattern {
    type Err = DiskIoError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DiskIoError::InvalidPattern(s.to_string());
        let mut parts = s.split_whitespace();
        let (access, depth) = match (parts.next(), parts.next(), parts.next()) {
            (Some(access), Some(depth), None) => (access.to_uppercase(), depth.to_uppercase()),
            _ => return Err(invalid()),
        };

        let (kind, size_token) = if let Some(rest) = access.strip_prefix("SEQ") {
            (AccessKind::Sequential, rest)
        } else if let Some(rest) = access.strip_prefix("RND") {
            (AccessKind::Random, rest)
        } else {
            return Err(invalid());
        };

        let block_size = parse_bytes(size_token).map_err(|_| invalid())?;
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(invalid());
        }

        let queue_depth: u32 = depth
            .strip_prefix("QD")
            .and_then(|n| n.parse().ok())
            .filter(|&n| n > 0)
            .ok_or_else(invalid)?;

        Ok(Self {
            id: format!("{}{} QD{}", kind.prefix(), size_token, queue_depth),
            kind,
            block_size,
            queue_depth,
        })
    }
}

impl TryFrom<String> for AccessPattern {
    type Error = DiskIoError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AccessPattern> for String {
    fn from(pattern: AccessPattern) -> Self {
        pattern.id
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
