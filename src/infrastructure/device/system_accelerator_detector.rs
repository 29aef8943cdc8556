use std::path::{Path, PathBuf};

use crate::application::ports::AcceleratorDetector;

const NVIDIA_DEVICE_NODES: [&str; 2] = ["/dev/nvidiactl", "/dev/nvidia0"];

/// Looks for an NVIDIA driver device node, or Apple silicon on macOS.
pub struct SystemAcceleratorDetector {
    device_nodes: Vec<PathBuf>,
}

impl SystemAcceleratorDetector {
    pub fn new() -> Self {
        Self::with_device_nodes(NVIDIA_DEVICE_NODES.iter().map(PathBuf::from).collect())
    }

    pub fn with_device_nodes(device_nodes: Vec<PathBuf>) -> Self {
        Self { device_nodes }
    }

    fn has_device_node(&self) -> bool {
        self.device_nodes.iter().any(|node| Path::new(node).exists())
    }
}

impl Default for SystemAcceleratorDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorDetector for SystemAcceleratorDetector {
    fn accelerator_available(&self) -> bool {
        if self.has_device_node() {
            tracing::debug!("NVIDIA device node present");
            return true;
        }
        apple_silicon()
    }
}

#[cfg(all(target_os = "macos", target_arch = "aarch64"))]
fn apple_silicon() -> bool {
    true
}

#[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
fn apple_silicon() -> bool {
    false
}
