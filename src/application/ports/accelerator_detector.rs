pub trait AcceleratorDetector: Send + Sync {
    fn accelerator_available(&self) -> bool;
}
