use std::fmt;

/// Compute device class used for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Accelerated,
    Cpu,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Accelerated => "accelerated",
            DeviceKind::Cpu => "cpu",
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, DeviceKind::Accelerated)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
