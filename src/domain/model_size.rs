use std::fmt;

pub const DEFAULT_MODEL_SIZE: &str = "base";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSize(String);

impl ModelSize {
    pub fn new(size: impl Into<String>) -> Self {
        Self(size.into().trim().to_string())
    }

    /// Uses `requested` when present and non-blank, otherwise `default`.
    pub fn resolve(requested: Option<&str>, default: &ModelSize) -> Self {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .unwrap_or_else(|| default.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelSize {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_SIZE)
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
