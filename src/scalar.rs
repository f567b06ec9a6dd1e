use std::fmt;

/// Error code baked into a record in place of real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fault(i32);

impl Fault {
    pub const IO: Fault = Fault(libc::EIO);
    pub const ACCESS_DENIED: Fault = Fault(libc::EACCES);
    pub const NO_DEVICE: Fault = Fault(libc::ENODEV);

    /// Build a fault from a positive errno code.
    ///
    /// Returns None for zero or negative codes.
    pub fn new(code: i32) -> Option<Self> {
        (code > 0).then_some(Self(code))
    }

    pub fn code(self) -> i32 {
        self.0
    }

    fn name(self) -> &'static str {
        match self.0 {
            libc::EIO => "I/O error",
            libc::EACCES => "access denied",
            libc::ENODEV => "no such device",
            libc::EBUSY => "device busy",
            libc::EINVAL => "invalid value",
            _ => "fault",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", self.name(), self.0)
    }
}

/// A numeric cell holding either a valid value or a stored fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Value(u64),
    Fault(Fault),
}

impl Scalar {
    pub fn read(self) -> Result<u64, Fault> {
        match self {
            Scalar::Value(v) => Ok(v),
            Scalar::Fault(fault) => Err(fault),
        }
    }

    pub fn write(&mut self, value: u64) {
        *self = Scalar::Value(value);
    }

    pub fn is_fault(self) -> bool {
        matches!(self, Scalar::Fault(_))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Value(value)
    }
}

impl From<Fault> for Scalar {
    fn from(fault: Fault) -> Self {
        Scalar::Fault(fault)
    }
}
