// Named training-time objects an artifact may reference
//
// A saved graph can name scoring functions that only existed during
// training. The loader must be able to resolve every such name, but nothing
// here runs during inference.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::error::ModelError;
use crate::preprocess::EPSILON;

/// Scoring function over `(event, arrival)` labels and one prediction per row
pub type ScoringFn = fn(y_true: &[[f32; 2]], y_pred: &[f32]) -> f32;

/// A registered named object
#[derive(Debug, Clone, Copy)]
pub struct CustomObject {
    pub name: &'static str,
    pub scoring: ScoringFn,
}

/// Registry consulted by the artifact loader
#[derive(Debug, Clone, Default)]
pub struct CustomObjectRegistry {
    objects: BTreeMap<&'static str, CustomObject>,
}

static DEFAULT_REGISTRY: Lazy<CustomObjectRegistry> = Lazy::new(CustomObjectRegistry::with_defaults);

/// Registry containing every object the shipped artifacts reference
pub fn default_registry() -> &'static CustomObjectRegistry {
    &DEFAULT_REGISTRY
}

impl CustomObjectRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `masked_mse`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("masked_mse", masked_mse);
        registry
    }

    /// Register or replace a named scoring function
    pub fn register(&mut self, name: &'static str, scoring: ScoringFn) {
        self.objects.insert(name, CustomObject { name, scoring });
    }

    pub fn get(&self, name: &str) -> Option<&CustomObject> {
        self.objects.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.objects.keys().copied().collect()
    }

    /// Resolve every name an artifact references
    ///
    /// # Errors
    /// `ModelLoad` naming the first unregistered object.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<CustomObject>, ModelError> {
        names
            .iter()
            .map(|name| {
                self.get(name).copied().ok_or_else(|| ModelError::ModelLoad {
                    reason: format!(
                        "artifact references unknown custom object '{}' (registered: {:?})",
                        name,
                        self.names()
                    ),
                })
            })
            .collect()
    }
}

/// Squared arrival error averaged over rows that carry an event
///
/// Rows whose event label is not positive have no arrival pick and are
/// ignored. Returns 0 when no row carries an event.
pub fn masked_mse(y_true: &[[f32; 2]], y_pred: &[f32]) -> f32 {
    let (sum_sq, count) = y_true
        .iter()
        .zip(y_pred)
        .fold((0.0f32, 0.0f32), |(sum_sq, count), (&[event, arrival], &pred)| {
            let mask = if event > 0.0 { 1.0 } else { 0.0 };
            let err = arrival - pred;
            (sum_sq + err * err * mask, count + mask)
        });

    sum_sq / (count + EPSILON as f32)
}
