//! Owned tensors passed in and out of a graph run.

use crate::error::InferError;

/// Dense row-major float32 tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TensorData {
    /// Creates a tensor, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, InferError> {
        if data.is_empty() {
            return Err(InferError::EmptyData);
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(InferError::Shape {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Splits the leading (batch) axis into one flat vector per item.
    ///
    /// Returns `None` when the tensor has no leading axis or its data does not
    /// divide evenly by `items`.
    pub fn split_batch(&self, items: usize) -> Option<Vec<Vec<f32>>> {
        if items == 0 || self.shape.is_empty() || self.data.len() % items != 0 {
            return None;
        }
        let stride = self.data.len() / items;
        Some(self.data.chunks(stride).map(<[f32]>::to_vec).collect())
    }
}

/// One named input for a graph run.
#[derive(Debug, Clone)]
pub enum Feed {
    /// Float tensor input.
    Float { name: String, tensor: TensorData },
    /// Boolean scalar input, e.g. a training-phase flag.
    Flag { name: String, value: bool },
}

impl Feed {
    pub fn name(&self) -> &str {
        match self {
            Self::Float { name, .. } | Self::Flag { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_shape_checked() {
        assert!(TensorData::new(vec![2, 3], vec![0.0; 6]).is_ok());
        assert!(matches!(
            TensorData::new(vec![2, 3], vec![0.0; 5]),
            Err(InferError::Shape { expected: 6, got: 5, .. })
        ));
        assert!(matches!(TensorData::new(vec![1], vec![]), Err(InferError::EmptyData)));
    }

    #[test]
    fn split_batch_chunks_leading_axis() {
        let t = TensorData::new(vec![3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let items = t.split_batch(3).unwrap();
        assert_eq!(items, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert!(t.split_batch(4).is_none());
        assert!(t.split_batch(0).is_none());
    }

    #[test]
    fn feed_name() {
        let flag = Feed::Flag {
            name: "model/is_training".into(),
            value: false,
        };
        assert_eq!(flag.name(), "model/is_training");
    }
}
