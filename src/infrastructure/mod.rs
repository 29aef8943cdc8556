pub mod audio;
pub mod device;
pub mod fetch;
pub mod observability;
pub mod probe;
pub mod storage;
