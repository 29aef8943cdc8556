use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::OnceCell;

use crate::application::ports::{Aligner, EngineError, SpeechBackend, Transcriber};
use crate::domain::{DeviceKind, ModelSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Transcribe,
    Align,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Transcribe => "transcribe",
            Capability::Align => "align",
        }
    }
}

/// Cache key: the capability plus its variant (model size for transcription,
/// language for alignment).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub capability: Capability,
    pub variant: String,
}

impl ModelKey {
    pub fn transcriber(model_size: &ModelSize) -> Self {
        Self {
            capability: Capability::Transcribe,
            variant: model_size.as_str().to_string(),
        }
    }

    pub fn aligner(language: &str) -> Self {
        Self {
            capability: Capability::Align,
            variant: language.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.capability.as_str(), self.variant)
    }
}

/// Per-key single-flight cache. Concurrent first requests for a key share one load;
/// a failed load leaves the slot empty so a later request can try again. Hits on a
/// loaded slot take only a shared read guard; the write lock is taken to insert a
/// new slot. Neither is held across an await.
pub struct SingleFlightCache<K, V> {
    slots: RwLock<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for SingleFlightCache<K, V> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_load<F, Fut, E>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let existing = self.slots.read().get(key).map(Arc::clone);
        let slot = match existing {
            Some(slot) => {
                if let Some(value) = slot.get() {
                    return Ok(value.clone());
                }
                slot
            }
            None => Arc::clone(self.slots.write().entry(key.clone()).or_default()),
        };
        slot.get_or_try_init(load).await.cloned()
    }

    pub fn is_loaded(&self, key: &K) -> bool {
        self.slots
            .read()
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn loaded_count(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

/// Shared model handles, loaded at most once per [`ModelKey`].
pub struct ModelRegistry {
    backend: Arc<dyn SpeechBackend>,
    transcribers: SingleFlightCache<ModelKey, Arc<dyn Transcriber>>,
    aligners: SingleFlightCache<ModelKey, Arc<dyn Aligner>>,
}

impl ModelRegistry {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self {
            backend,
            transcribers: SingleFlightCache::new(),
            aligners: SingleFlightCache::new(),
        }
    }

    pub async fn transcriber(
        &self,
        model_size: &ModelSize,
        device: DeviceKind,
    ) -> Result<Arc<dyn Transcriber>, EngineError> {
        let key = ModelKey::transcriber(model_size);
        self.transcribers
            .get_or_try_load(&key, || {
                timed_load(&key, device, self.backend.load_transcriber(model_size, device))
            })
            .await
    }

    pub async fn aligner(
        &self,
        language: &str,
        device: DeviceKind,
    ) -> Result<Arc<dyn Aligner>, EngineError> {
        let key = ModelKey::aligner(language);
        self.aligners
            .get_or_try_load(&key, || {
                timed_load(&key, device, self.backend.load_aligner(language, device))
            })
            .await
    }

    pub fn is_loaded(&self, key: &ModelKey) -> bool {
        match key.capability {
            Capability::Transcribe => self.transcribers.is_loaded(key),
            Capability::Align => self.aligners.is_loaded(key),
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.transcribers.loaded_count() + self.aligners.loaded_count()
    }
}

async fn timed_load<T, Fut>(key: &ModelKey, device: DeviceKind, load: Fut) -> Result<T, EngineError>
where
    Fut: Future<Output = Result<T, EngineError>>,
{
    tracing::info!(model = %key, device = %device, "Loading model");
    let started = Instant::now();
    match load.await {
        Ok(model) => {
            tracing::info!(
                model = %key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Model loaded"
            );
            Ok(model)
        }
        Err(e) => {
            tracing::error!(model = %key, error = %e, "Model load failed");
            Err(e)
        }
    }
}
