use thiserror::Error;

use crate::scalar::Fault;
use crate::UnitId;

/// Errors surfaced by every query and mutation on a [`Controller`](crate::controller::Controller).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpufreqError {
    #[error("unit {id} not found")]
    NotFound { id: UnitId },

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("permission denied")]
    PermissionDenied,

    #[error("allocation failed")]
    AllocationFailed,

    /// A fault stored in the unit's record, returned unchanged.
    #[error("stored fault: {0}")]
    Fault(Fault),

    #[error("backend error: {0}")]
    Backend(String),
}

impl CpufreqError {
    /// errno-style code for this error, used as the process exit status.
    pub fn errno(&self) -> i32 {
        match self {
            CpufreqError::NotFound { .. } => libc::ENODEV,
            CpufreqError::InvalidArgument(_) => libc::EINVAL,
            CpufreqError::PermissionDenied => libc::EACCES,
            CpufreqError::AllocationFailed => libc::ENOMEM,
            CpufreqError::Fault(fault) => fault.code(),
            CpufreqError::Backend(_) => libc::EIO,
        }
    }
}

impl From<Fault> for CpufreqError {
    fn from(fault: Fault) -> Self {
        CpufreqError::Fault(fault)
    }
}

impl From<std::collections::TryReserveError> for CpufreqError {
    fn from(_: std::collections::TryReserveError) -> Self {
        CpufreqError::AllocationFailed
    }
}

pub type Result<T> = std::result::Result<T, CpufreqError>;
