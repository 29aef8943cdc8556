use bytes::Bytes;

/// Where one invocation's audio comes from. Captured once per request and never mutated.
#[derive(Debug, Clone)]
pub enum AudioSource {
    Remote {
        url: String,
    },
    Upload {
        bytes: Bytes,
        declared_len: u64,
        filename: Option<String>,
    },
}

impl AudioSource {
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    /// Inline upload whose declared length is the payload length.
    pub fn upload(bytes: impl Into<Bytes>, filename: Option<String>) -> Self {
        let bytes = bytes.into();
        let declared_len = bytes.len() as u64;
        Self::Upload {
            bytes,
            declared_len,
            filename,
        }
    }

    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Remote { .. } => None,
            Self::Upload { declared_len, .. } => Some(*declared_len),
        }
    }

    pub fn name_hint(&self) -> Option<&str> {
        match self {
            Self::Remote { url } => Some(url.as_str()),
            Self::Upload { filename, .. } => filename.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "remote",
            Self::Upload { .. } => "upload",
        }
    }
}
