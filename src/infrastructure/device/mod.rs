mod system_accelerator_detector;

pub use system_accelerator_detector::SystemAcceleratorDetector;
