// Public modules
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod list;
pub mod mutation;
pub mod policy;
pub mod privilege;
pub mod query;
pub mod registry;
pub mod scalar;
pub mod stat;
pub mod sysfs;

pub use backend::{Backend, StaticBackend, StaticUnit};
pub use controller::Controller;
pub use error::{CpufreqError, Result};
pub use list::{OwnedList, release_driver, release_list};
pub use policy::{Policy, PolicySnapshot, release_policy};
pub use privilege::Principal;
pub use registry::{Registry, UnitRecord};
pub use scalar::{Fault, Scalar};
pub use stat::Stat;
pub use sysfs::SysfsBackend;

/// Index of a managed unit (CPU) in the registry.
pub type UnitId = usize;

// Re-export constants commonly used
pub mod constants {
    /// Upper bound on the number of records a registry may hold.
    pub const MAX_UNITS: usize = 64;

    /// Meaningful bytes kept from a governor name (buffer of 512 minus terminator).
    pub const GOVERNOR_NAME_MAX: usize = 511;
    /// Longest name accepted by `modify_policy_governor`.
    pub const GOVERNOR_ARG_MAX: usize = 19;

    /// Governors reported by `available_governors`, in order.
    pub const AVAILABLE_GOVERNORS: [&str; 5] = [
        "conservative",
        "ondemand",
        "powersave",
        "userspace",
        "performance",
    ];

    pub const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system/cpu";
    pub const DEFAULT_DRIVER: &str = "acpi-cpufreq";
}
