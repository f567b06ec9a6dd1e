//! TOML configuration: which backend to use and how to seed the registry.

use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use log::{info, warn};
use toml::{Table, Value};

use crate::backend::{Backend, StaticBackend, StaticUnit};
use crate::constants::{DEFAULT_SYSFS_ROOT, MAX_UNITS};
use crate::controller::Controller;
use crate::privilege::Principal;
use crate::registry::{Registry, UnitRecord};
use crate::scalar::Fault;
use crate::stat::Stat;
use crate::sysfs::SysfsBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Static,
    Sysfs,
}

/// One `[[units]]` entry: the seeded record and its static backend data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    pub record: UnitRecord,
    pub data: StaticUnit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendKind,
    pub sysfs_root: PathBuf,
    /// Empty means the reference table.
    pub units: Vec<UnitConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Static,
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            units: Vec::new(),
        }
    }
}

/// `$XDG_CONFIG_HOME/cpufreq-control/config.toml`, or under /etc if there is no config dir.
pub fn default_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("/etc"));
    path.push("cpufreq-control");
    path.push("config.toml");
    path
}

fn invalid(msg: String) -> IoError {
    IoError::new(ErrorKind::InvalidInput, msg)
}

fn non_negative(value: &Value, key: &str) -> Result<u64, IoError> {
    value
        .as_integer()
        .ok_or_else(|| invalid(format!("{key} must be an integer")))
        .and_then(|v| u64::try_from(v).map_err(|_| invalid(format!("{key} must not be negative"))))
}

fn integer_list(value: &Value, key: &str) -> Result<Vec<u64>, IoError> {
    value
        .as_array()
        .ok_or_else(|| invalid(format!("{key} must be an array")))?
        .iter()
        .enumerate()
        .map(|(i, v)| non_negative(v, &format!("{key}[{i}]")))
        .collect()
}

/// Optional scalar key, falling back to `default` with a warning when missing.
fn scalar_or(t: &Table, key: &str, ctx: &str, default: u64) -> Result<u64, IoError> {
    match t.get(key) {
        Some(v) => non_negative(v, &format!("{ctx}.{key}")),
        None => {
            warn!("{ctx}.{key} is missing, replaced with the default of {default}");
            Ok(default)
        }
    }
}

/// Parse `units[i]`; `unit_count` bounds the ids allowed in `affected`/`related`.
fn parse_unit(i: usize, unit_count: usize, t: &Table) -> Result<UnitConfig, IoError> {
    let ctx = format!("units[{i}]");

    let governor = t
        .get("governor")
        .map(|v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| invalid(format!("{ctx}.governor must be a string")))
        })
        .transpose()?
        .unwrap_or_else(|| {
            warn!("{ctx}.governor is missing, replaced with the default of performance");
            "performance".to_string()
        });

    let record = if let Some(fault) = t.get("fault") {
        let fault = fault
            .as_integer()
            .and_then(|v| i32::try_from(v).ok())
            .and_then(Fault::new)
            .ok_or_else(|| invalid(format!("{ctx}.fault must be a positive errno code")))?;
        UnitRecord::faulted(fault, &governor)
    } else {
        let frequency = scalar_or(t, "frequency", &ctx, 2_400_000)?;
        let latency = scalar_or(t, "latency", &ctx, 1000)?;
        let limits = match t.get("limits") {
            Some(v) => match integer_list(v, &format!("{ctx}.limits"))?.as_slice() {
                &[min, max] => (min, max),
                _ => return Err(invalid(format!("{ctx}.limits must hold exactly [min, max]"))),
            },
            None => {
                warn!("{ctx}.limits is missing, replaced with the default of [100000, 1000000]");
                (100_000, 1_000_000)
            }
        };
        let policy_min = scalar_or(t, "policy-min", &ctx, limits.0)?;
        let policy_max = scalar_or(t, "policy-max", &ctx, limits.1)?;
        if policy_min > policy_max {
            warn!("{ctx}.policy-min is greater than {ctx}.policy-max");
        }
        UnitRecord::new(frequency, latency, limits, (policy_min, policy_max), &governor)
    };

    let mut data = StaticUnit::standalone(i);
    if let Some(driver) = t.get("driver") {
        data.driver = driver
            .as_str()
            .ok_or_else(|| invalid(format!("{ctx}.driver must be a string")))?
            .to_owned();
    }
    if let Some(v) = t.get("available-frequencies") {
        data.frequencies = integer_list(v, &format!("{ctx}.available-frequencies"))?;
    }
    for (key, slot) in [("affected", &mut data.affected), ("related", &mut data.related)] {
        if let Some(v) = t.get(key) {
            *slot = integer_list(v, &format!("{ctx}.{key}"))?
                .into_iter()
                .map(|id| {
                    usize::try_from(id)
                        .ok()
                        .filter(|&id| id < unit_count)
                        .ok_or_else(|| invalid(format!("{ctx}.{key} holds unit {id} out of range")))
                })
                .collect::<Result<_, _>>()?;
        }
    }
    if let Some(v) = t.get("transitions") {
        data.transitions = non_negative(v, &format!("{ctx}.transitions"))?;
    }
    if let Some(v) = t.get("stats") {
        let array = v
            .as_array()
            .ok_or_else(|| invalid(format!("{ctx}.stats must be an array")))?;
        data.stats = array
            .iter()
            .enumerate()
            .map(|(j, s)| -> Result<Stat, IoError> {
                let s = s
                    .as_table()
                    .ok_or_else(|| invalid(format!("{ctx}.stats[{j}] must be a table")))?;
                let get = |key: &str| {
                    s.get(key)
                        .ok_or_else(|| invalid(format!("{ctx}.stats[{j}].{key} must exist")))
                        .and_then(|v| non_negative(v, &format!("{ctx}.stats[{j}].{key}")))
                };
                Ok(Stat::new(get("frequency")?, get("time")?))
            })
            .collect::<Result<_, _>>()?;
    }

    Ok(UnitConfig { record, data })
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, IoError> {
        let table = content
            .parse::<Table>()
            .map_err(|e| invalid(format!("invalid TOML: {e}")))?;
        let mut config = Config::default();

        config.backend = match table.get("backend").map(|v| v.as_str()) {
            None => BackendKind::Static,
            Some(Some("static")) => BackendKind::Static,
            Some(Some("sysfs")) => BackendKind::Sysfs,
            Some(_) => {
                warn!("backend must be \"static\" or \"sysfs\", replaced with the default of static");
                BackendKind::Static
            }
        };

        if let Some(root) = table.get("sysfs-root") {
            config.sysfs_root = root
                .as_str()
                .map(PathBuf::from)
                .ok_or_else(|| invalid("sysfs-root must be a string".to_string()))?;
        }

        if let Some(units) = table.get("units") {
            let array = units
                .as_array()
                .ok_or_else(|| invalid("units must be an array of tables".to_string()))?;
            if array.is_empty() {
                return Err(invalid("units must not be empty".to_string()));
            }
            if array.len() > MAX_UNITS {
                return Err(invalid(format!("units can hold at most {MAX_UNITS} entries")));
            }
            config.units = array
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    t.as_table()
                        .ok_or_else(|| invalid(format!("units[{i}] must be a table")))
                        .and_then(|t| parse_unit(i, array.len(), t))
                })
                .collect::<Result<_, _>>()?;
        }

        Ok(config)
    }

    /// Read `path`, or the default path; a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, IoError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!("loading configuration from {}", path.display());
                Self::parse(&content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Build the controller this configuration describes.
    pub fn build_controller(
        &self,
        principal: Principal,
    ) -> Result<Controller<Box<dyn Backend>>, IoError> {
        match self.backend {
            BackendKind::Sysfs => {
                if !self.units.is_empty() {
                    warn!("units are ignored with the sysfs backend");
                }
                let backend = SysfsBackend::new(&self.sysfs_root);
                let registry = backend.snapshot_registry()?;
                Ok(Controller::new(registry, Box::new(backend), principal))
            }
            BackendKind::Static if self.units.is_empty() => {
                let registry = Registry::reference();
                let backend = StaticBackend::reference(registry.capacity());
                Ok(Controller::new(registry, Box::new(backend), principal))
            }
            BackendKind::Static => {
                let registry =
                    Registry::new(self.units.iter().map(|u| u.record.clone()).collect())?;
                let backend = StaticBackend::new(self.units.iter().map(|u| u.data.clone()).collect());
                Ok(Controller::new(registry, Box::new(backend), principal))
            }
        }
    }
}
