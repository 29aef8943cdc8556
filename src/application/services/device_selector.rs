use std::sync::OnceLock;

use crate::application::ports::AcceleratorDetector;
use crate::domain::DeviceKind;

/// Chooses the inference device once per process and answers from cache afterwards.
/// Hardware changes are picked up only by a restart.
pub struct DeviceSelector {
    detector: Option<Box<dyn AcceleratorDetector>>,
    selected: OnceLock<DeviceKind>,
}

impl DeviceSelector {
    pub fn new(detector: Box<dyn AcceleratorDetector>) -> Self {
        Self {
            detector: Some(detector),
            selected: OnceLock::new(),
        }
    }

    /// Pins the device without running detection.
    pub fn fixed(device: DeviceKind) -> Self {
        let selected = OnceLock::new();
        let _ = selected.set(device);
        Self {
            detector: None,
            selected,
        }
    }

    pub fn current_device(&self) -> DeviceKind {
        *self.selected.get_or_init(|| {
            let accelerated = self
                .detector
                .as_ref()
                .is_some_and(|d| d.accelerator_available());
            let device = if accelerated {
                DeviceKind::Accelerated
            } else {
                DeviceKind::Cpu
            };
            tracing::info!(device = %device, "Inference device selected");
            device
        })
    }
}
