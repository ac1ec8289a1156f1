//! Ordered acquisition strategies
//!
//! Strategies are tried one after another until one yields a value:
//! `Trying(i) -> Acquired(i) | Trying(i + 1) | Exhausted`.

use async_trait::async_trait;
use base64::Engine;
use shelfcount_processing::content_type_for_name;
use std::path::PathBuf;
use std::time::SystemTime;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("{0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no acquisition strategy succeeded ({} tried)", .failures.len())]
    Exhausted { failures: Vec<(String, String)> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Trying(usize),
    Acquired(usize),
    Exhausted,
}

impl AcquisitionState {
    pub fn start(strategies: usize) -> Self {
        if strategies == 0 {
            AcquisitionState::Exhausted
        } else {
            AcquisitionState::Trying(0)
        }
    }

    /// Next state after the current attempt. Terminal states do not move.
    pub fn next(self, succeeded: bool, strategies: usize) -> Self {
        match self {
            AcquisitionState::Trying(i) if succeeded => AcquisitionState::Acquired(i),
            AcquisitionState::Trying(i) if i + 1 < strategies => AcquisitionState::Trying(i + 1),
            AcquisitionState::Trying(_) => AcquisitionState::Exhausted,
            terminal => terminal,
        }
    }
}

#[async_trait]
pub trait AcquisitionStrategy<T>: Send + Sync {
    fn name(&self) -> &str;

    async fn acquire(&self) -> Result<T, AcquisitionError>;
}

#[derive(Debug)]
pub struct Acquired<T> {
    pub value: T,
    pub strategy: String,
    /// Strategies that failed before this one, with their errors
    pub failures: Vec<(String, String)>,
}

pub struct AcquisitionChain<T> {
    strategies: Vec<Box<dyn AcquisitionStrategy<T>>>,
}

impl<T: Send> Default for AcquisitionChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> AcquisitionChain<T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl AcquisitionStrategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn acquire(&self) -> Result<Acquired<T>, AcquisitionError> {
        let total = self.strategies.len();
        let mut state = AcquisitionState::start(total);
        let mut failures = Vec::new();

        while let AcquisitionState::Trying(i) = state {
            let strategy = &self.strategies[i];
            match strategy.acquire().await {
                Ok(value) => {
                    tracing::debug!(strategy = %strategy.name(), attempt = i + 1, "Acquired");
                    return Ok(Acquired {
                        value,
                        strategy: strategy.name().to_string(),
                        failures,
                    });
                }
                Err(err) => {
                    tracing::debug!(strategy = %strategy.name(), error = %err, "Strategy failed");
                    failures.push((strategy.name().to_string(), err.to_string()));
                    state = state.next(false, total);
                }
            }
        }

        Err(AcquisitionError::Exhausted { failures })
    }
}

/// Photo bytes with the name they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CapturedPhoto {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            content_type_for_name(&self.file_name),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

async fn read_photo(path: &std::path::Path) -> Result<CapturedPhoto, AcquisitionError> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(AcquisitionError::Unavailable(format!("{} is empty", path.display())));
    }
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo.jpg")
        .to_string();
    Ok(CapturedPhoto { file_name, bytes })
}

fn is_image(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// An explicitly chosen photo file.
pub struct PhotoFile(pub Option<PathBuf>);

#[async_trait]
impl AcquisitionStrategy<CapturedPhoto> for PhotoFile {
    fn name(&self) -> &str {
        "photo-file"
    }

    async fn acquire(&self) -> Result<CapturedPhoto, AcquisitionError> {
        let path = self
            .0
            .as_ref()
            .ok_or_else(|| AcquisitionError::Unavailable("no photo file given".to_string()))?;
        read_photo(path).await
    }
}

/// The most recently modified image in a capture directory.
pub struct NewestImageInDir(pub Option<PathBuf>);

#[async_trait]
impl AcquisitionStrategy<CapturedPhoto> for NewestImageInDir {
    fn name(&self) -> &str {
        "capture-dir"
    }

    async fn acquire(&self) -> Result<CapturedPhoto, AcquisitionError> {
        let dir = self
            .0
            .as_ref()
            .ok_or_else(|| AcquisitionError::Unavailable("no capture directory given".to_string()))?;

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = entry.metadata().await?;
            if !meta.is_file() || !is_image(&path) {
                continue;
            }
            let modified = meta.modified()?;
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }

        let (_, path) = newest.ok_or_else(|| {
            AcquisitionError::Unavailable(format!("no images in {}", dir.display()))
        })?;
        read_photo(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct Fixed {
        name: &'static str,
        value: Option<u32>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AcquisitionStrategy<u32> for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn acquire(&self) -> Result<u32, AcquisitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value
                .ok_or_else(|| AcquisitionError::Unavailable(format!("{} unavailable", self.name)))
        }
    }

    fn fixed(name: &'static str, value: Option<u32>, calls: &Arc<AtomicUsize>) -> Fixed {
        Fixed {
            name,
            value,
            calls: calls.clone(),
        }
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(AcquisitionState::start(0), AcquisitionState::Exhausted);
        assert_eq!(AcquisitionState::start(2), AcquisitionState::Trying(0));
        assert_eq!(AcquisitionState::Trying(0).next(false, 2), AcquisitionState::Trying(1));
        assert_eq!(AcquisitionState::Trying(1).next(false, 2), AcquisitionState::Exhausted);
        assert_eq!(AcquisitionState::Trying(1).next(true, 2), AcquisitionState::Acquired(1));
        assert_eq!(AcquisitionState::Exhausted.next(true, 2), AcquisitionState::Exhausted);
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AcquisitionChain::new()
            .then(fixed("camera", None, &calls))
            .then(fixed("file", Some(7), &calls))
            .then(fixed("never", Some(9), &calls));

        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.value, 7);
        assert_eq!(acquired.strategy, "file");
        assert_eq!(acquired.failures.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = AcquisitionChain::new()
            .then(fixed("a", None, &calls))
            .then(fixed("b", None, &calls));

        match chain.acquire().await {
            Err(AcquisitionError::Exhausted { failures }) => {
                assert_eq!(failures[0].0, "a");
                assert_eq!(failures[1].1, "b unavailable");
            }
            other => panic!("unexpected {:?}", other.map(|a| a.value)),
        }
        assert!(AcquisitionChain::<u32>::new().acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_photo_strategies() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("shelf.PNG"), b"png-bytes").unwrap();

        let chain = AcquisitionChain::new()
            .then(PhotoFile(None))
            .then(NewestImageInDir(Some(dir.path().to_path_buf())));
        let acquired = chain.acquire().await.unwrap();
        assert_eq!(acquired.strategy, "capture-dir");
        assert_eq!(acquired.value.file_name, "shelf.PNG");
        assert_eq!(
            acquired.value.to_data_uri(),
            format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(b"png-bytes")
            )
        );
    }
}
