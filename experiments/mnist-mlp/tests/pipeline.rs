use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use perceptor_experiment_mnist::{
    data::{scale, Example, ExampleBatch},
    train::{evaluate, run_pipeline},
    PipelineConfig,
};

type TestBackend = Autodiff<NdArray<f32>>;

/// Deterministic tiny corpus of 2x2 "images" spread over 10 classes.
fn synthetic_examples(count: usize) -> Vec<Example> {
    (0..count)
        .map(|i| Example {
            pixels: vec![
                (i * 31 % 256) as u8,
                (i * 7 % 256) as u8,
                (i * 13 % 256) as u8,
                (i * 29 % 256) as u8,
            ],
            label: (i % 10) as u8,
        })
        .collect()
}

fn tiny_config() -> PipelineConfig {
    PipelineConfig {
        seed: 7,
        validation_fraction: 0.1,
        shuffle_buffer: 100,
        batch_size: 10,
        hidden_layers: 2,
        hidden_dim: 8,
        num_classes: 10,
        epochs: 1,
        learning_rate: 1e-3,
    }
}

#[test]
fn tiny_synthetic_run_completes_with_sane_metrics() {
    let device = NdArrayDevice::Cpu;
    let train = synthetic_examples(100);
    let test = synthetic_examples(20);

    let outcome =
        run_pipeline::<TestBackend>(&device, &tiny_config(), &train, &test).expect("pipeline run");

    assert_eq!(outcome.history.len(), 1);
    let epoch = &outcome.history[0];
    assert_eq!(epoch.epoch, 1);
    assert!((0.0..=1.0).contains(&epoch.train.accuracy));
    assert!((0.0..=1.0).contains(&epoch.validation.accuracy));
    assert!(epoch.train.loss.is_finite());
    assert!(epoch.validation.loss.is_finite());
    assert!((0.0..=1.0).contains(&outcome.test.accuracy));
    assert!(outcome.test.loss.is_finite());
}

#[test]
fn evaluation_is_idempotent() {
    let device = NdArrayDevice::Cpu;
    let train = synthetic_examples(100);
    let test = synthetic_examples(20);

    let outcome =
        run_pipeline::<TestBackend>(&device, &tiny_config(), &train, &test).expect("pipeline run");

    let scaled: Vec<_> = test.iter().map(scale).collect();
    let batch = ExampleBatch::<TestBackend>::from_examples(&device, &scaled).unwrap();

    let first = evaluate(&device, &outcome.model, &batch);
    let second = evaluate(&device, &outcome.model, &batch);
    assert_eq!(first, second);
}

#[test]
fn degenerate_inputs_are_rejected() {
    let device = NdArrayDevice::Cpu;
    let train = synthetic_examples(100);
    let test = synthetic_examples(20);

    assert!(run_pipeline::<TestBackend>(&device, &tiny_config(), &[], &test).is_err());
    assert!(run_pipeline::<TestBackend>(&device, &tiny_config(), &train, &[]).is_err());

    // Too few examples to carve out a validation split.
    let few = synthetic_examples(5);
    assert!(run_pipeline::<TestBackend>(&device, &tiny_config(), &few, &test).is_err());
}
