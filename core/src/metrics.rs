use serde::{Deserialize, Serialize};

/// Loss and accuracy aggregated over one whole split.
///
/// Accuracy is a fraction in [0, 1]; callers that want percentages multiply
/// at the formatting site.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub loss: f32,
    pub accuracy: f32,
}

/// Metrics recorded after one full pass over the training data: the running
/// training statistics plus the forward-only validation evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train: EvaluationMetrics,
    pub validation: EvaluationMetrics,
}
