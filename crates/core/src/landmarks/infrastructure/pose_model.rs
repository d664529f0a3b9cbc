use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use ort::session::Session;

use crate::shared::error::MeasureError;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// A pose-estimation ONNX session that loads at most once.
///
/// The first call to [`PoseModel::ensure_loaded`] loads the session; every
/// concurrent caller blocks on that same initialization and sees its
/// result. A failed load is remembered, so a broken model is never retried.
/// Inference needs `&mut Session`, so the loaded session sits behind a mutex.
pub struct PoseModel {
    path: PathBuf,
    state: OnceLock<Result<LoadedModel, String>>,
}

pub struct LoadedModel {
    session: Mutex<Session>,
    pub input_size: u32,
}

impl LoadedModel {
    /// Exclusive access to the session for one inference.
    ///
    /// The session keeps no per-request state, so a lock poisoned by a
    /// panicking request is recovered rather than failing every later one.
    pub fn session(&self) -> MutexGuard<'_, Session> {
        lock_recovering(&self.session)
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide models, one per resolved path.
static SHARED_MODELS: OnceLock<Mutex<HashMap<PathBuf, Arc<PoseModel>>>> = OnceLock::new();

impl PoseModel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: OnceLock::new(),
        }
    }

    /// The process-wide model for `path`.
    ///
    /// Every caller asking for the same path gets the same instance, so the
    /// session loads once per process however many measurers are built.
    pub fn shared(path: impl Into<PathBuf>) -> Arc<PoseModel> {
        let path = path.into();
        let mut models = lock_recovering(SHARED_MODELS.get_or_init(Default::default));
        models
            .entry(path.clone())
            .or_insert_with(|| Arc::new(PoseModel::new(path)))
            .clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_loaded(&self) -> Result<&LoadedModel, MeasureError> {
        self.state
            .get_or_init(|| {
                log::info!("Loading pose model from {}", self.path.display());
                load(&self.path)
            })
            .as_ref()
            .map_err(|e| MeasureError::ModelUnavailable(e.clone()))
    }

    /// True once a load has completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(Ok(_)))
    }
}

fn load(path: &Path) -> Result<LoadedModel, String> {
    if !path.exists() {
        return Err(format!("model file not found: {}", path.display()));
    }
    let builder = Session::builder().map_err(|e| e.to_string())?;
    let mut builder = builder
        .with_execution_providers(preferred_execution_providers())
        .map_err(|e| e.to_string())?;
    let session = builder.commit_from_file(path).map_err(|e| e.to_string())?;

    // NCHW: [1, 3, H, W]; dynamic axes report as -1.
    let input_size = session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or(DEFAULT_INPUT_SIZE);

    Ok(LoadedModel {
        session: Mutex::new(session),
        input_size,
    })
}

/// Preferred ONNX execution providers for the current platform; ort falls
/// back to CPU when these are unavailable.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_not_ready_before_load() {
        let model = PoseModel::new("/nonexistent/pose.onnx");
        assert!(!model.is_ready());
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let model = PoseModel::new("/nonexistent/pose.onnx");
        assert!(matches!(
            model.ensure_loaded(),
            Err(MeasureError::ModelUnavailable(_))
        ));
        assert!(!model.is_ready());
    }

    #[test]
    fn test_corrupt_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();
        let model = PoseModel::new(&path);
        assert!(model.ensure_loaded().is_err());
    }

    #[test]
    fn test_shared_returns_one_instance_per_path() {
        let a = PoseModel::shared("/nonexistent/shared-a.onnx");
        let again = PoseModel::shared("/nonexistent/shared-a.onnx");
        let b = PoseModel::shared("/nonexistent/shared-b.onnx");
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_shared_model_remembers_its_load_outcome() {
        let first = PoseModel::shared("/nonexistent/shared-c.onnx");
        assert!(first.ensure_loaded().is_err());
        let second = PoseModel::shared("/nonexistent/shared-c.onnx");
        assert!(second.state.get().is_some());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let mutex = Arc::new(Mutex::new(41u32));
        let m = mutex.clone();
        let _ = thread::spawn(move || {
            let _guard = m.lock().unwrap();
            panic!("inference crashed");
        })
        .join();
        assert!(mutex.is_poisoned());

        let mut guard = lock_recovering(&mutex);
        *guard += 1;
        drop(guard);
        assert_eq!(*lock_recovering(&mutex), 42);
    }

    #[test]
    fn test_concurrent_first_use_sees_one_outcome() {
        let model = Arc::new(PoseModel::new("/nonexistent/pose.onnx"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = model.clone();
                thread::spawn(move || m.ensure_loaded().err().map(|e| e.to_string()))
            })
            .collect();
        let messages: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(messages.iter().all(|m| m.is_some()));
        assert!(messages.windows(2).all(|w| w[0] == w[1]));
    }
}
