use std::fmt;

use super::InvocationId;

const MAX_EXTENSION_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(invocation_id: &InvocationId, filename: &str) -> Self {
        Self(format!("{}/{}", invocation_id.as_uuid(), filename))
    }

    /// Scratch location for one invocation's audio, keeping a sanitized extension
    /// from `original_name` so format sniffers get a hint.
    pub fn for_audio(invocation_id: &InvocationId, original_name: Option<&str>) -> Self {
        match original_name.and_then(audio_extension) {
            Some(ext) => Self::new(invocation_id, &format!("source.{}", ext)),
            None => Self::new(invocation_id, "source"),
        }
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> Option<&str> {
        let filename = self.0.rsplit('/').next()?;
        let (_, ext) = filename.rsplit_once('.')?;
        Some(ext)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn audio_extension(name: &str) -> Option<String> {
    let name = name.split(['?', '#']).next().unwrap_or(name);
    let filename = name.rsplit(['/', '\\']).next()?;
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
