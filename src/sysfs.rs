//! Backend reading the kernel's cpufreq sysfs tree.

use std::io::{Error as IoError, ErrorKind};
use std::path::PathBuf;

use log::{debug, warn};

use crate::UnitId;
use crate::backend::Backend;
use crate::constants::{DEFAULT_SYSFS_ROOT, MAX_UNITS};
use crate::error::{CpufreqError, Result};
use crate::list::{ListBuilder, OwnedList};
use crate::registry::{Registry, UnitRecord};
use crate::scalar::{Fault, Scalar};
use crate::stat::Stat;

/// Reads `<root>/cpu<N>/cpufreq/*` attributes.
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    root: PathBuf,
}

impl SysfsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cpufreq_dir(&self, id: UnitId) -> PathBuf {
        self.root.join(format!("cpu{id}")).join("cpufreq")
    }

    fn read_raw(&self, id: UnitId, attr: &str) -> std::io::Result<String> {
        let path = self.cpufreq_dir(id).join(attr);
        debug!("reading {}", path.display());
        std::fs::read_to_string(&path).map(|s| s.trim().to_string())
    }

    fn read_attr(&self, id: UnitId, attr: &str) -> Result<String> {
        self.read_raw(id, attr).map_err(|e| {
            CpufreqError::Backend(format!(
                "{}: {e}",
                self.cpufreq_dir(id).join(attr).display()
            ))
        })
    }

    fn read_number(&self, id: UnitId, attr: &str) -> Result<u64> {
        let value = self.read_attr(id, attr)?;
        value
            .parse()
            .map_err(|_| CpufreqError::Backend(format!("{attr}: not a number: {value:?}")))
    }

    fn read_list(&self, id: UnitId, attr: &str) -> Result<OwnedList<u64>> {
        let content = self.read_attr(id, attr)?;
        let mut builder = ListBuilder::new();
        for word in content.split_whitespace() {
            let value = word
                .parse()
                .map_err(|_| CpufreqError::Backend(format!("{attr}: not a number: {word:?}")))?;
            builder.push(value)?;
        }
        Ok(builder.finish())
    }

    fn read_unit_list(&self, id: UnitId, attr: &str) -> Result<OwnedList<UnitId>> {
        let values = self.read_list(id, attr)?;
        let mut builder = ListBuilder::new();
        for value in values {
            let unit = UnitId::try_from(value)
                .map_err(|_| CpufreqError::Backend(format!("{attr}: unit id out of range")))?;
            builder.push(unit)?;
        }
        Ok(builder.finish())
    }

    /// Number of consecutive `cpuN/cpufreq` directories starting at cpu0, capped at `MAX_UNITS`.
    pub fn unit_count(&self) -> usize {
        (0..MAX_UNITS)
            .take_while(|&id| self.cpufreq_dir(id).is_dir())
            .count()
    }

    fn read_scalar(&self, id: UnitId, attr: &str) -> Scalar {
        match self.read_raw(id, attr) {
            Ok(value) => match value.parse::<u64>() {
                Ok(v) => Scalar::Value(v),
                Err(_) => {
                    warn!("cpu{id}/{attr}: unparsable value {value:?}, seeding I/O fault");
                    Scalar::Fault(Fault::IO)
                }
            },
            Err(e) => {
                let fault = if e.kind() == ErrorKind::PermissionDenied {
                    Fault::ACCESS_DENIED
                } else {
                    Fault::IO
                };
                warn!("cpu{id}/{attr}: {e}, seeding fault {fault}");
                Scalar::Fault(fault)
            }
        }
    }

    /// Build a registry from the current sysfs values.
    ///
    /// Attributes that cannot be read become stored faults in the record.
    pub fn snapshot_registry(&self) -> std::result::Result<Registry, IoError> {
        let count = self.unit_count();
        if count == 0 {
            return Err(IoError::new(
                ErrorKind::NotFound,
                format!("no cpufreq units under {}", self.root.display()),
            ));
        }

        let records = (0..count)
            .map(|id| {
                let mut record = UnitRecord::faulted(Fault::IO, "");
                record.frequency = self.read_scalar(id, "scaling_cur_freq");
                record.transition_latency = self.read_scalar(id, "cpuinfo_transition_latency");
                record.limits = (
                    self.read_scalar(id, "cpuinfo_min_freq"),
                    self.read_scalar(id, "cpuinfo_max_freq"),
                );
                record.policy_min = self.read_scalar(id, "scaling_min_freq");
                record.policy_max = self.read_scalar(id, "scaling_max_freq");
                match self.read_raw(id, "scaling_governor") {
                    Ok(governor) => record.set_policy_governor(&governor),
                    Err(e) => warn!("cpu{id}/scaling_governor: {e}"),
                }
                record
            })
            .collect();

        Registry::new(records)
    }
}

impl Default for SysfsBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl Backend for SysfsBackend {
    fn driver_name(&self, id: UnitId) -> Result<String> {
        self.read_attr(id, "scaling_driver")
    }

    fn available_frequencies(&self, id: UnitId) -> Result<OwnedList<u64>> {
        self.read_list(id, "scaling_available_frequencies")
    }

    fn affected_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        self.read_unit_list(id, "affected_cpus")
    }

    fn related_units(&self, id: UnitId) -> Result<OwnedList<UnitId>> {
        self.read_unit_list(id, "related_cpus")
    }

    fn stats(&self, id: UnitId) -> Result<(OwnedList<Stat>, u64)> {
        let content = self.read_attr(id, "stats/time_in_state")?;
        let mut builder = ListBuilder::new();
        let mut total = 0u64;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let mut parts = line.split_whitespace();
            let parsed = match (parts.next(), parts.next(), parts.next()) {
                (Some(freq), Some(time), None) => {
                    freq.parse::<u64>().ok().zip(time.parse::<u64>().ok())
                }
                _ => None,
            };
            let Some((frequency, time_in_state)) = parsed else {
                return Err(CpufreqError::Backend(format!(
                    "stats/time_in_state: malformed line {line:?}"
                )));
            };
            total = total.saturating_add(time_in_state);
            builder.push(Stat::new(frequency, time_in_state))?;
        }
        Ok((builder.finish(), total))
    }

    fn transition_count(&self, id: UnitId) -> Result<u64> {
        self.read_number(id, "stats/total_trans")
    }
}
