use crate::error::PredictError;

/// Element-wise mean of per-patch predictions.
pub fn mean_over_patches(predictions: &[Vec<f32>]) -> Result<Vec<f32>, PredictError> {
    let first = predictions.first().ok_or(PredictError::InvalidInput)?;
    let mut sum = vec![0.0f64; first.len()];
    for p in predictions {
        if p.len() != sum.len() {
            return Err(PredictError::InvalidInputSize {
                expected: sum.len(),
                got: p.len(),
            });
        }
        for (acc, &v) in sum.iter_mut().zip(p) {
            *acc += v as f64;
        }
    }
    let n = predictions.len() as f64;
    Ok(sum.into_iter().map(|s| (s / n) as f32).collect())
}
