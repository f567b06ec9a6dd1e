//! Source of per-unit data the registry does not hold itself.

use crate::UnitId;
use crate::constants::DEFAULT_DRIVER;
use crate::error::{CpufreqError, Result};
use crate::list::OwnedList;
use crate::stat::{Stat, total_time};

/// Live data supplier consulted after the controller has bounds-checked the unit id.
///
/// Returned lists and strings are owned by the caller, like the ones the
/// controller builds itself.
pub trait Backend {
    fn driver_name(&self, id: UnitId) -> Result<String>;
    fn available_frequencies(&self, id: UnitId) -> Result<OwnedList<u64>>;
    fn affected_units(&self, id: UnitId) -> Result<OwnedList<UnitId>>;
    fn related_units(&self, id: UnitId) -> Result<OwnedList<UnitId>>;
    /// Stats list plus the total time accounted over all entries.
    fn stats(&self, id: UnitId) -> Result<(OwnedList<Stat>, u64)>;
    fn transition_count(&self, id: UnitId) -> Result<u64>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn driver_name(&self, id: UnitId) -> Result<String> {
        (**self).driver_name(id)
    }

    fn available_frequencies(&self, id: UnitId) -> Result<OwnedList<u64>> {
        (**self).available_frequencies(id)
    }

    fn affected_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        (**self).affected_units(id)
    }

    fn related_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        (**self).related_units(id)
    }

    fn stats(&self, id: UnitId) -> Result<(OwnedList<Stat>, u64)> {
        (**self).stats(id)
    }

    fn transition_count(&self, id: UnitId) -> Result<u64> {
        (**self).transition_count(id)
    }
}

/// Fixed data for one unit of a [`StaticBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticUnit {
    pub driver: String,
    pub frequencies: Vec<u64>,
    pub affected: Vec<UnitId>,
    pub related: Vec<UnitId>,
    pub stats: Vec<Stat>,
    pub transitions: u64,
}

impl StaticUnit {
    /// A unit alone in its frequency domain with a default frequency table.
    pub fn standalone(id: UnitId) -> Self {
        let frequencies = vec![1_000_000, 800_000, 100_000];
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            stats: frequencies.iter().map(|&f| Stat::new(f, 0)).collect(),
            frequencies,
            affected: vec![id],
            related: vec![id],
            transitions: 0,
        }
    }
}

/// In-memory backend standing in for hardware.
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    units: Vec<StaticUnit>,
}

impl StaticBackend {
    pub fn new(units: Vec<StaticUnit>) -> Self {
        Self { units }
    }

    /// `count` standalone units.
    pub fn reference(count: usize) -> Self {
        Self::new((0..count).map(StaticUnit::standalone).collect())
    }

    fn unit(&self, id: UnitId) -> Result<&StaticUnit> {
        self.units
            .get(id)
            .ok_or_else(|| CpufreqError::Backend(format!("no static data for unit {id}")))
    }
}

impl Backend for StaticBackend {
    fn driver_name(&self, id: UnitId) -> Result<String> {
        let driver = &self.unit(id)?.driver;
        let mut name = String::new();
        name.try_reserve_exact(driver.len())?;
        name.push_str(driver);
        Ok(name)
    }

    fn available_frequencies(&self, id: UnitId) -> Result<OwnedList<u64>> {
        OwnedList::try_from_iter(self.unit(id)?.frequencies.iter().copied())
    }

    fn affected_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        OwnedList::try_from_iter(self.unit(id)?.affected.iter().copied())
    }

    fn related_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        OwnedList::try_from_iter(self.unit(id)?.related.iter().copied())
    }

    fn stats(&self, id: UnitId) -> Result<(OwnedList<Stat>, u64)> {
        let stats = OwnedList::try_from_iter(self.unit(id)?.stats.iter().copied())?;
        let total = total_time(&stats);
        Ok((stats, total))
    }

    fn transition_count(&self, id: UnitId) -> Result<u64> {
        Ok(self.unit(id)?.transitions)
    }
}
