use anyhow::{ensure, Result};
use burn::{
    data::dataset::{vision::MnistDataset, Dataset},
    tensor::{backend::Backend, Int, Tensor, TensorData},
};

/// MNIST images are square grayscale bitmaps of this side length.
pub const IMAGE_SIDE: usize = 28;

/// A labeled image as loaded: raw 8-bit intensities, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    pub pixels: Vec<u8>,
    pub label: u8,
}

/// An example after preprocessing: intensities rescaled into [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledExample {
    pub pixels: Vec<f32>,
    pub label: u8,
}

/// Rescale 8-bit intensities into [0, 1]. The label passes through
/// unchanged. This is a fixed affine transform; no statistics are computed
/// from the data.
pub fn scale(example: &Example) -> ScaledExample {
    ScaledExample {
        pixels: example
            .pixels
            .iter()
            .map(|&pixel| f32::from(pixel) / 255.0)
            .collect(),
        label: example.label,
    }
}

/// Fetch the MNIST train and test splits as supervised (pixels, label)
/// pairs. Downloading and caching the corpus on first use is burn's
/// business, not ours.
pub fn load_mnist() -> (Vec<Example>, Vec<Example>) {
    (
        examples_from(&MnistDataset::train()),
        examples_from(&MnistDataset::test()),
    )
}

fn examples_from(dataset: &MnistDataset) -> Vec<Example> {
    (0..dataset.len())
        .filter_map(|index| dataset.get(index))
        .map(|item| {
            let mut pixels = Vec::with_capacity(IMAGE_SIDE * IMAGE_SIDE);
            for row in item.image.iter() {
                for &pixel in row.iter() {
                    pixels.push(pixel as u8);
                }
            }
            Example {
                pixels,
                label: item.label,
            }
        })
        .collect()
}

/// A group of examples bundled into parallel tensors: one row per image,
/// one integer label per row.
#[derive(Clone, Debug)]
pub struct ExampleBatch<B: Backend> {
    pub images: Tensor<B, 2>,
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> ExampleBatch<B> {
    /// Bundle scaled examples into one batch. Every example must have the
    /// same pixel count; images are flattened row-major.
    pub fn from_examples(device: &B::Device, examples: &[ScaledExample]) -> Result<Self> {
        ensure!(!examples.is_empty(), "cannot build a batch from zero examples");

        let input_dim = examples[0].pixels.len();
        let mut images = Vec::with_capacity(examples.len() * input_dim);
        let mut labels = Vec::with_capacity(examples.len());

        for example in examples {
            ensure!(
                example.pixels.len() == input_dim,
                "example has {} pixels, expected {}",
                example.pixels.len(),
                input_dim
            );
            images.extend_from_slice(&example.pixels);
            labels.push(i64::from(example.label));
        }

        let images = Tensor::<B, 2>::from_floats(
            TensorData::new(images, [examples.len(), input_dim]),
            device,
        );
        let labels =
            Tensor::<B, 1, Int>::from_ints(TensorData::new(labels, [examples.len()]), device);

        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group examples into fixed-size training batches, in order. Only the last
/// batch may be smaller than `batch_size`.
pub fn batches_of<B: Backend>(
    device: &B::Device,
    examples: &[ScaledExample],
    batch_size: usize,
) -> Result<Vec<ExampleBatch<B>>> {
    ensure!(batch_size > 0, "batch_size must be positive");
    examples
        .chunks(batch_size)
        .map(|chunk| ExampleBatch::from_examples(device, chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray<f32>;

    fn example(label: u8) -> Example {
        Example {
            pixels: vec![0, 63, 127, 255],
            label,
        }
    }

    #[test]
    fn scaling_maps_into_unit_interval_and_keeps_labels() {
        let scaled = scale(&example(7));
        assert_eq!(scaled.label, 7);
        assert!(scaled.pixels.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert_eq!(scaled.pixels[0], 0.0);
        assert_eq!(scaled.pixels[3], 1.0);
    }

    #[test]
    fn batch_shapes_match_the_examples() {
        let device = NdArrayDevice::Cpu;
        let examples: Vec<_> = (0..5).map(|i| scale(&example(i))).collect();

        let batch = ExampleBatch::<TestBackend>::from_examples(&device, &examples).unwrap();
        assert_eq!(batch.images.dims(), [5, 4]);
        assert_eq!(batch.labels.dims(), [5]);
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn batches_are_full_size_except_possibly_the_last() {
        let device = NdArrayDevice::Cpu;
        let examples: Vec<_> = (0..23).map(|i| scale(&example(i % 10))).collect();

        let batches = batches_of::<TestBackend>(&device, &examples, 10).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[1].len(), 10);
        assert_eq!(batches[2].len(), 3);
    }

    #[test]
    fn ragged_examples_are_rejected() {
        let device = NdArrayDevice::Cpu;
        let mut examples: Vec<_> = (0..2).map(|i| scale(&example(i))).collect();
        examples[1].pixels.pop();

        assert!(ExampleBatch::<TestBackend>::from_examples(&device, &examples).is_err());
    }

    #[test]
    fn empty_batches_are_rejected() {
        let device = NdArrayDevice::Cpu;
        assert!(ExampleBatch::<TestBackend>::from_examples(&device, &[]).is_err());
    }
}
