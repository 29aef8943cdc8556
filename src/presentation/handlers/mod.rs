mod health;
mod inspect;
pub mod responses;
mod transcribe;
mod upload_form;

pub use health::health_handler;
pub use inspect::{InspectRequest, inspect_file_handler, inspect_handler};
pub use transcribe::{TranscribeRequest, transcribe_file_handler, transcribe_handler};
