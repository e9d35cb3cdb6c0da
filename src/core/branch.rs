//! Branch identifiers

use crate::core::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an independently connected order partition
///
/// Parsing only checks the shape of the identifier. Whether the branch is
/// actually known is decided by the [`ConnectionRegistry`](crate::core::ConnectionRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(u32);

impl BranchId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BranchId {
    type Err = QueryError;

    /// Only the canonical decimal form is accepted: no sign, padding or
    /// leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .ok()
            .filter(|id| id.to_string() == s)
            .map(BranchId)
            .ok_or_else(|| QueryError::InvalidBranch {
                branch: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_branch() {
        assert_eq!("2".parse::<BranchId>().unwrap(), BranchId::new(2));
        assert_eq!("10".parse::<BranchId>().unwrap(), BranchId::new(10));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "abc", "-1", "1.5", "01", "+1", " 1", " 3 ", "0x1"] {
            let err = raw.parse::<BranchId>().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_BRANCH");
        }
    }
}
