//! Binary classifier capability and its ONNX Runtime implementation

use crate::feature_encoder::FeatureVector;
use anyhow::{anyhow, bail, Context, Result};
use ort::session::{Session, SessionOutputs};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// A trained classifier that maps one feature vector to a class label.
///
/// Implementations are immutable once constructed and shared across requests.
pub trait Classifier: Send + Sync {
    /// Classify a single feature vector (batch size 1).
    fn predict(&self, features: &FeatureVector) -> Result<i64>;

    /// Name used in logs
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Classifier backed by an ONNX Runtime session.
///
/// Expects a scikit-learn style export: one float input of shape
/// `[N, features]` and an int64 label output, with a probability tensor
/// accepted as a fallback.
pub struct OnnxClassifier {
    /// Model name
    name: String,
    /// ONNX Runtime session (run needs exclusive access)
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output carrying predicted labels, if the model exposes one
    label_output: Option<String>,
}

impl OnnxClassifier {
    pub fn new(name: &str, session: Session) -> Self {
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name,
            label_output,
        }
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn label_output(&self) -> Option<&str> {
        self.label_output.as_deref()
    }

    /// Pull the predicted class out of the session outputs
    fn extract_class(&self, outputs: &SessionOutputs) -> Result<i64> {
        let label: Option<Vec<i64>> = self
            .label_output
            .as_deref()
            .and_then(|name| outputs.get(name))
            .and_then(|output| output.try_extract_tensor::<i64>().ok())
            .map(|(_, data)| data.to_vec());

        // Fallback: first float tensor, [batch, classes] or [batch, 1]
        let mut probabilities: Option<(Vec<i64>, Vec<f32>)> = None;
        if label.is_none() {
            for (name, output) in outputs.iter() {
                if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                    debug!(model = %self.name, output = %name, "Using probability output");
                    probabilities = Some((shape.iter().copied().collect(), data.to_vec()));
                    break;
                }
            }
        }

        let class = select_class(
            label.as_deref(),
            probabilities
                .as_ref()
                .map(|(dims, data)| (dims.as_slice(), data.as_slice())),
        )?;
        debug!(model = %self.name, class = class, "Extracted class");

        Ok(class)
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        self.extract_class(&outputs)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Choose the predicted class from a model's outputs.
///
/// The label tensor wins when present; the probability tensor is only
/// consulted without one.
fn select_class(label: Option<&[i64]>, probabilities: Option<(&[i64], &[f32])>) -> Result<i64> {
    match (label, probabilities) {
        (Some(data), _) => data
            .first()
            .copied()
            .ok_or_else(|| anyhow!("empty label tensor")),
        (None, Some((dims, data))) => class_from_probabilities(dims, data),
        (None, None) => bail!("model produced no label or probability output"),
    }
}

/// Pick the class for the first row of a probability tensor.
fn class_from_probabilities(dims: &[i64], data: &[f32]) -> Result<i64> {
    let num_classes = match dims {
        [_, classes] => *classes as usize,
        [classes] => *classes as usize,
        _ => bail!("unsupported probability shape {:?}", dims),
    };

    let row = data
        .get(..num_classes)
        .ok_or_else(|| anyhow!("probability tensor shorter than its shape"))?;

    match row {
        [] => bail!("empty probability tensor"),
        [p] => Ok(if *p >= 0.5 { 1 } else { 0 }),
        _ => row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(class, _)| class as i64)
            .ok_or_else(|| anyhow!("empty probability tensor")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_output_preferred_over_probabilities() {
        // Probabilities disagree with the label on purpose
        let label: &[i64] = &[1];
        let probabilities: (&[i64], &[f32]) = (&[1, 2], &[0.9, 0.1]);
        assert_eq!(select_class(Some(label), Some(probabilities)).unwrap(), 1);

        let label: &[i64] = &[0];
        assert_eq!(select_class(Some(label), None).unwrap(), 0);
    }

    #[test]
    fn test_probability_fallback_uses_argmax() {
        let high: (&[i64], &[f32]) = (&[1, 2], &[0.35, 0.65]);
        assert_eq!(select_class(None, Some(high)).unwrap(), 1);

        let low: (&[i64], &[f32]) = (&[1, 2], &[0.7, 0.3]);
        assert_eq!(select_class(None, Some(low)).unwrap(), 0);
    }

    #[test]
    fn test_no_usable_output_fails() {
        let err = select_class(None, None).unwrap_err();
        assert!(err.to_string().contains("no label or probability output"));

        let empty: &[i64] = &[];
        assert!(select_class(Some(empty), None).is_err());
    }

    #[test]
    fn test_class_from_two_column_probabilities() {
        assert_eq!(class_from_probabilities(&[1, 2], &[0.8, 0.2]).unwrap(), 0);
        assert_eq!(class_from_probabilities(&[1, 2], &[0.3, 0.7]).unwrap(), 1);
    }

    #[test]
    fn test_class_from_single_probability() {
        assert_eq!(class_from_probabilities(&[1, 1], &[0.9]).unwrap(), 1);
        assert_eq!(class_from_probabilities(&[1], &[0.1]).unwrap(), 0);
    }

    #[test]
    fn test_class_from_bad_shape() {
        assert!(class_from_probabilities(&[1, 1, 2], &[0.5, 0.5]).is_err());
        assert!(class_from_probabilities(&[1, 3], &[0.5, 0.5]).is_err());
    }
}
