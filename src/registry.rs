//! Fixed-capacity table of per-unit frequency scaling records.

use std::io::{Error as IoError, ErrorKind};

use log::info;

use crate::UnitId;
use crate::constants::MAX_UNITS;
use crate::error::{CpufreqError, Result};
use crate::policy::bounded_governor;
use crate::scalar::{Fault, Scalar};

/// Frequency scaling state of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    /// Current clock rate, kHz
    pub frequency: Scalar,
    /// Cost of a frequency change, ns
    pub transition_latency: Scalar,
    /// Hardware (min, max), kHz
    pub limits: (Scalar, Scalar),
    pub policy_min: Scalar,
    pub policy_max: Scalar,
    policy_governor: String,
}

impl UnitRecord {
    pub fn new(
        frequency: u64,
        transition_latency: u64,
        limits: (u64, u64),
        policy: (u64, u64),
        governor: &str,
    ) -> Self {
        Self {
            frequency: frequency.into(),
            transition_latency: transition_latency.into(),
            limits: (limits.0.into(), limits.1.into()),
            policy_min: policy.0.into(),
            policy_max: policy.1.into(),
            policy_governor: bounded_governor(governor).to_owned(),
        }
    }

    /// A permanently broken unit: every scalar holds `fault`.
    pub fn faulted(fault: Fault, governor: &str) -> Self {
        Self {
            frequency: fault.into(),
            transition_latency: fault.into(),
            limits: (fault.into(), fault.into()),
            policy_min: fault.into(),
            policy_max: fault.into(),
            policy_governor: bounded_governor(governor).to_owned(),
        }
    }

    pub fn policy_governor(&self) -> &str {
        &self.policy_governor
    }

    pub fn set_policy_governor(&mut self, governor: &str) {
        self.policy_governor.clear();
        self.policy_governor.push_str(bounded_governor(governor));
    }
}

/// Owned, indexed collection of unit records. Never resized after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    records: Vec<UnitRecord>,
}

impl Registry {
    pub fn new(records: Vec<UnitRecord>) -> std::result::Result<Self, IoError> {
        if records.is_empty() {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                "registry must hold at least one unit",
            ));
        }
        if records.len() > MAX_UNITS {
            return Err(IoError::new(
                ErrorKind::InvalidInput,
                format!("registry cannot hold more than {MAX_UNITS} units"),
            ));
        }
        info!("unit registry created with {} units", records.len());
        Ok(Self { records })
    }

    /// The reference table: one healthy unit and one that always reports access denied.
    pub fn reference() -> Self {
        info!("unit registry created from the reference table");
        Self {
            records: vec![
                UnitRecord::new(
                    2_400_000,
                    1000,
                    (100_000, 1_000_000),
                    (100_000, 1_000_000),
                    "performance",
                ),
                UnitRecord::faulted(Fault::ACCESS_DENIED, "a"),
            ],
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    pub fn exists(&self, id: UnitId) -> bool {
        id < self.records.len()
    }

    pub fn get(&self, id: UnitId) -> Result<&UnitRecord> {
        self.records.get(id).ok_or(CpufreqError::NotFound { id })
    }

    pub fn get_mut(&mut self, id: UnitId) -> Result<&mut UnitRecord> {
        self.records
            .get_mut(id)
            .ok_or(CpufreqError::NotFound { id })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::reference()
    }
}
