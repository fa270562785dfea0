//! File-backed model loader with BLAKE3 integrity check

use std::fs::File;
use std::io;
use std::path::Path;

use ai_core::{EngineError, ModelArtifact, ModelLoader};
use tracing::{debug, instrument, warn};

/// Loads model files from the local filesystem
///
/// Missing, empty and mismatching files fail with `ModelLoad`; permission and
/// other I/O failures fail with `Initialization`.
#[derive(Debug, Clone, Default)]
pub struct FileModelLoader {
    expected_digest: Option<String>,
}

impl FileModelLoader {
    /// Loader that accepts any non-empty file
    pub const fn new() -> Self {
        Self {
            expected_digest: None,
        }
    }

    /// Require the file's BLAKE3 hex digest to equal `digest`
    #[must_use]
    pub fn with_expected_digest(mut self, digest: impl Into<String>) -> Self {
        self.expected_digest = Some(digest.into().trim().to_ascii_lowercase());
        self
    }

    /// Hex BLAKE3 digest of the file at `path`
    pub fn digest_file(path: &Path) -> io::Result<String> {
        let mut file = File::open(path)?;
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(hasher.finalize().to_hex().to_string())
    }
}

fn io_failure(path: &Path, err: &io::Error) -> EngineError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            EngineError::ModelLoad(format!("model file not found: {}", path.display()))
        },
        io::ErrorKind::PermissionDenied => EngineError::Initialization(format!(
            "permission denied reading model file {}",
            path.display()
        )),
        _ => EngineError::Initialization(format!(
            "failed to read model file {}: {err}",
            path.display()
        )),
    }
}

impl ModelLoader for FileModelLoader {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn load(&self, path: &Path) -> Result<ModelArtifact, EngineError> {
        let metadata = std::fs::metadata(path).map_err(|e| io_failure(path, &e))?;
        if !metadata.is_file() {
            return Err(EngineError::ModelLoad(format!(
                "model path is not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(EngineError::ModelLoad(format!(
                "model file is empty: {}",
                path.display()
            )));
        }

        let digest = Self::digest_file(path).map_err(|e| io_failure(path, &e))?;
        if let Some(expected) = self.expected_digest.as_ref().filter(|e| **e != digest) {
            warn!(%expected, actual = %digest, "Model digest mismatch");
            return Err(EngineError::ModelLoad(format!(
                "model integrity check failed for {}: expected {expected}, got {digest}",
                path.display()
            )));
        }

        debug!(size_bytes = metadata.len(), %digest, "Model artifact verified");
        Ok(ModelArtifact {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn model_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_artifact_with_digest() {
        let file = model_file(b"tflite-model-bytes");
        let artifact = FileModelLoader::new().load(file.path()).unwrap();

        assert_eq!(artifact.size_bytes, 18);
        assert_eq!(
            artifact.digest,
            blake3::hash(b"tflite-model-bytes").to_hex().to_string()
        );
        assert_eq!(artifact.path, file.path());
    }

    #[test]
    fn missing_file_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileModelLoader::new()
            .load(&dir.path().join("absent.tflite"))
            .unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(msg) if msg.contains("not found")));
    }

    #[test]
    fn empty_file_is_model_load_error() {
        let file = model_file(b"");
        let err = FileModelLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(msg) if msg.contains("empty")));
    }

    #[test]
    fn directory_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileModelLoader::new().load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(_)));
    }

    #[test]
    fn expected_digest_is_case_insensitive() {
        let file = model_file(b"weights");
        let digest = blake3::hash(b"weights").to_hex().to_uppercase();
        let loader = FileModelLoader::new().with_expected_digest(digest);
        assert!(loader.load(file.path()).is_ok());
    }

    #[test]
    fn digest_mismatch_is_model_load_error() {
        let file = model_file(b"tampered weights");
        let loader = FileModelLoader::new()
            .with_expected_digest(blake3::hash(b"weights").to_hex().to_string());
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::ModelLoad(msg) if msg.contains("integrity")));
    }

    #[test]
    fn permission_denied_maps_to_initialization() {
        let err = io_failure(
            Path::new("/models/m.tflite"),
            &io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, EngineError::Initialization(_)));
        assert!(!matches!(
            io_failure(Path::new("x"), &io::Error::from(io::ErrorKind::NotFound)),
            EngineError::Initialization(_)
        ));
    }
}
