use super::*;
use crate::fixtures::{self, ScriptedPredictor};
use crate::preprocess::{preprocess, INPUT_SHAPE};
use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

struct PanickingPredictor;

impl Predictor for PanickingPredictor {
    fn describe(&self) -> String {
        "panicking".to_string()
    }

    fn predict(&mut self, _spectrogram: &Spectrogram) -> Result<RawPrediction, ModelError> {
        panic!("backend crashed");
    }
}

fn silence_spectrogram() -> Spectrogram {
    preprocess(&fixtures::silence(6000, 3)).unwrap()
}

fn write_manifest(dir: &Path, custom_objects: &[&str]) {
    let manifest = serde_json::json!({
        "format": "onnx",
        "graph": "model.onnx",
        "custom_objects": custom_objects,
        "input_shape": INPUT_SHAPE,
        "outputs": ["event", "p_arrival", "s_arrival"],
    });
    fs::write(dir.join(MANIFEST_FILE), manifest.to_string()).unwrap();
}

#[test]
fn test_unavailable_handle_never_predicts() {
    let handle = PredictorHandle::unavailable("Model not found at /models/x");
    assert!(!handle.is_ready());
    assert_eq!(
        handle.ensure_ready(),
        Err(ModelError::Unavailable {
            reason: "Model not found at /models/x".to_string()
        })
    );
    let err = handle.predict(&silence_spectrogram()).unwrap_err();
    assert!(matches!(err, ModelError::Unavailable { .. }));
    assert_eq!(
        handle.status(),
        HandleStatus::Unavailable {
            reason: "Model not found at /models/x".to_string()
        }
    );
}

#[test]
fn test_ready_handle_delegates() {
    let predictor = ScriptedPredictor::new(RawPrediction::new(0.7, 0.1, 0.2));
    let calls = predictor.call_counter();
    let handle = PredictorHandle::ready(Box::new(predictor));

    assert!(handle.is_ready());
    assert!(handle.ensure_ready().is_ok());
    assert!(handle.status_label().starts_with("ready (scripted"));

    let output = handle.predict(&silence_spectrogram()).unwrap();
    assert_eq!(output, RawPrediction::new(0.7, 0.1, 0.2));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_status_serializes_with_state_tag() {
    let json = serde_json::to_value(PredictorHandle::unavailable("gone").status()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "state": "unavailable", "reason": "gone" })
    );
}

#[test]
fn test_try_load_missing_directory() {
    let err = PredictorHandle::try_load(Path::new("/nonexistent/model"), default_registry())
        .err()
        .unwrap();
    assert_eq!(
        err,
        ModelError::ModelLoad {
            reason: "Model not found at /nonexistent/model".to_string()
        }
    );
}

#[test]
fn test_load_failure_becomes_unavailable() {
    let handle = PredictorHandle::load(Path::new("/nonexistent/model"), default_registry());
    assert!(!handle.is_ready());
    assert_eq!(handle.status_label(), "Model not found at /nonexistent/model");
}

#[test]
fn test_directory_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let err = PredictorHandle::try_load(dir.path(), default_registry())
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::ModelLoad { .. }));
    assert!(err.reason().contains(MANIFEST_FILE));
}

#[test]
fn test_unknown_custom_object_is_named() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), &["masked_mse", "focal_loss"]);
    let err = PredictorHandle::try_load(dir.path(), default_registry())
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::ModelLoad { .. }));
    assert!(err.reason().contains("focal_loss"));
}

#[cfg(not(feature = "onnx"))]
#[test]
fn test_onnx_artifact_without_backend_feature() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), &["masked_mse"]);
    fs::write(dir.path().join("model.onnx"), b"not a graph").unwrap();

    let err = PredictorHandle::try_load(dir.path(), default_registry())
        .err()
        .unwrap();
    assert!(err.reason().contains("`onnx` feature"));
}

#[cfg(feature = "onnx")]
#[test]
fn test_corrupt_graph_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), &["masked_mse"]);
    fs::write(dir.path().join("model.onnx"), b"not a graph").unwrap();

    let err = PredictorHandle::try_load(dir.path(), default_registry())
        .err()
        .unwrap();
    assert!(matches!(err, ModelError::ModelLoad { .. }));
}

#[test]
fn test_panicking_backend_poisons_lock() {
    let handle = PredictorHandle::ready(Box::new(PanickingPredictor));
    let spectrogram = silence_spectrogram();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = handle.predict(&spectrogram);
    }));
    assert!(outcome.is_err());

    assert_eq!(
        handle.predict(&spectrogram),
        Err(ModelError::LockPoisoned {
            component: "predictor".to_string()
        })
    );
}

#[test]
fn test_concurrent_predictions_are_serialized() {
    let predictor = ScriptedPredictor::new(RawPrediction::new(0.9, 0.3, 0.4));
    let calls = predictor.call_counter();
    let handle = Arc::new(PredictorHandle::ready(Box::new(predictor)));
    let spectrogram = Arc::new(silence_spectrogram());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let spectrogram = Arc::clone(&spectrogram);
            thread::spawn(move || handle.predict(&spectrogram))
        })
        .collect();

    for worker in workers {
        let output = worker.join().unwrap().unwrap();
        assert_eq!(output, RawPrediction::new(0.9, 0.3, 0.4));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}
