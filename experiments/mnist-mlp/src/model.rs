use burn::{
    module::Param,
    nn::Linear,
    tensor::{activation::relu, backend::Backend, Tensor, TensorData},
};
use rand::{rngs::StdRng, Rng};

use crate::config::PipelineConfig;

/// Fully connected feed-forward classifier.
///
/// Hidden layers apply ReLU; the final layer emits one logit per class.
/// The softmax normalization lives inside the cross-entropy loss, and
/// argmax over logits equals argmax over the softmax probabilities, so the
/// logits are what everything downstream consumes.
#[derive(burn::module::Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
}

impl<B: Backend> Mlp<B> {
    /// Build the network for `input_dim` features using the configured
    /// depth and width, drawing initial parameters from `rng`.
    pub fn init(
        device: &B::Device,
        rng: &mut StdRng,
        input_dim: usize,
        config: &PipelineConfig,
    ) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_layers);
        let mut fan_in = input_dim;
        for _ in 0..config.hidden_layers {
            hidden.push(linear_from_rng::<B>(rng, device, fan_in, config.hidden_dim));
            fan_in = config.hidden_dim;
        }
        let output = linear_from_rng::<B>(rng, device, fan_in, config.num_classes);

        Self { hidden, output }
    }

    /// Compute class logits for a batch of flattened images.
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = images;
        for layer in &self.hidden {
            x = relu(layer.forward(x));
        }
        self.output.forward(x)
    }
}

fn linear_from_rng<B: Backend>(
    rng: &mut StdRng,
    device: &B::Device,
    fan_in: usize,
    fan_out: usize,
) -> Linear<B> {
    let limit = (1.0f32 / fan_in as f32).sqrt();
    let weight = random_tensor::<B, 2>(rng, [fan_in, fan_out], limit, device);
    let bias = random_tensor::<B, 1>(rng, [fan_out], limit, device);

    Linear {
        weight: Param::from_tensor(weight),
        bias: Some(Param::from_tensor(bias)),
    }
}

fn random_tensor<B: Backend, const D: usize>(
    rng: &mut StdRng,
    shape: [usize; D],
    limit: f32,
    device: &B::Device,
) -> Tensor<B, D> {
    let total: usize = shape.iter().product();
    let mut values = Vec::with_capacity(total);

    for _ in 0..total {
        let sample = rng.gen::<f32>() * 2.0 * limit - limit;
        values.push(sample);
    }

    Tensor::<B, D>::from_floats(TensorData::new(values, shape), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};
    use perceptor_core::seeded_rng;

    type TestBackend = NdArray<f32>;

    fn tiny_config() -> PipelineConfig {
        PipelineConfig {
            hidden_layers: 2,
            hidden_dim: 8,
            num_classes: 10,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn forward_produces_one_logit_row_per_example() {
        let device = NdArrayDevice::Cpu;
        let mut rng = seeded_rng(42);
        let model = Mlp::<TestBackend>::init(&device, &mut rng, 4, &tiny_config());

        let images = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.5f32; 3 * 4], [3, 4]),
            &device,
        );
        let logits = model.forward(images);
        assert_eq!(logits.dims(), [3, 10]);
    }

    #[test]
    fn zero_hidden_layers_wires_input_straight_to_output() {
        let device = NdArrayDevice::Cpu;
        let mut rng = seeded_rng(42);
        let config = PipelineConfig {
            hidden_layers: 0,
            ..tiny_config()
        };
        let model = Mlp::<TestBackend>::init(&device, &mut rng, 6, &config);

        let images = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.1f32; 2 * 6], [2, 6]),
            &device,
        );
        assert_eq!(model.forward(images).dims(), [2, 10]);
    }

    #[test]
    fn initialization_is_deterministic_for_a_fixed_seed() {
        let device = NdArrayDevice::Cpu;
        let config = tiny_config();

        let a = Mlp::<TestBackend>::init(&device, &mut seeded_rng(7), 4, &config);
        let b = Mlp::<TestBackend>::init(&device, &mut seeded_rng(7), 4, &config);

        let images = Tensor::<TestBackend, 2>::from_floats(
            TensorData::new(vec![0.3f32; 4], [1, 4]),
            &device,
        );
        let out_a = a.forward(images.clone()).into_data();
        let out_b = b.forward(images).into_data();
        assert_eq!(out_a, out_b);
    }
}
