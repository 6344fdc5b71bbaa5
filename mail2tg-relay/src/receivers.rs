use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::RelayError;

pub const WILDCARD: &str = "*";

/// A chat the relay can deliver to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationId(pub i64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recipient address to chat id mapping, always holding a wildcard entry.
#[derive(Debug, Clone)]
pub struct Receivers {
    map: HashMap<String, String>,
}

impl Receivers {
    pub fn new(map: HashMap<String, String>) -> Result<Self, RelayError> {
        if map.get(WILDCARD).map_or(true, |v| v.is_empty()) {
            return Err(RelayError::MissingWildcard);
        }

        for (address, id) in map.iter() {
            if id.parse::<i64>().is_err() {
                warn!(address=%address, id=%id, "receiver id is not an int64, mail for it will be dropped");
            }
        }

        Ok(Self { map })
    }

    /// `" <ops@example.com> "` becomes `ops@example.com`
    pub fn normalize(address: &str) -> &str {
        address.trim_matches(' ').trim_matches('<').trim_matches('>')
    }

    /// Chat for a recipient. Lookup is exact and case-sensitive, unknown
    /// addresses go to the wildcard.
    pub fn resolve(&self, recipient: &str) -> Result<DestinationId, RelayError> {
        let address = Self::normalize(recipient);
        let raw = self
            .map
            .get(address)
            .filter(|v| !v.is_empty())
            .or_else(|| self.map.get(WILDCARD))
            .ok_or(RelayError::MissingWildcard)?;

        raw.parse::<i64>()
            .map(DestinationId)
            .map_err(|_| RelayError::InvalidDestinationId(raw.clone()))
    }
}
