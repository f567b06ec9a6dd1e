use serde::Serialize;

use crate::constants::GOVERNOR_NAME_MAX;
use crate::error::Result;

/// Truncate `name` to at most [`GOVERNOR_NAME_MAX`] bytes without splitting a char.
pub fn bounded_governor(name: &str) -> &str {
    if name.len() <= GOVERNOR_NAME_MAX {
        return name;
    }
    let mut end = GOVERNOR_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Requested {min, max, governor} triple passed to `set_policy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub min: u64,
    pub max: u64,
    pub governor: String,
}

impl Policy {
    pub fn new(min: u64, max: u64, governor: &str) -> Policy {
        Policy {
            min,
            max,
            governor: governor.to_owned(),
        }
    }
}

/// Caller-owned copy of a unit's policy. Mutating it never touches the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    pub min: u64,
    pub max: u64,
    pub governor: String,
}

impl PolicySnapshot {
    pub(crate) fn try_new(min: u64, max: u64, governor: &str) -> Result<Self> {
        let governor = bounded_governor(governor);
        let mut copy = String::new();
        copy.try_reserve_exact(governor.len())?;
        copy.push_str(governor);

        Ok(Self {
            min,
            max,
            governor: copy,
        })
    }
}

/// Release a snapshot returned by `policy`. Absent snapshots are ignored.
pub fn release_policy(snapshot: Option<PolicySnapshot>) {
    drop(snapshot);
}
