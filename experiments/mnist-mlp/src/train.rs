use anyhow::{ensure, Result};
use burn::{
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion, Int, Tensor,
    },
};
use perceptor_core::{seeded_rng, EpochMetrics, EvaluationMetrics};

use crate::{
    config::PipelineConfig,
    data::{batches_of, scale, Example, ExampleBatch},
    model::Mlp,
    shuffle::shuffle_split,
};

/// Everything a finished run leaves behind: the trained parameters, the
/// per-epoch history, and the one test evaluation.
pub struct PipelineOutcome<B: AutodiffBackend> {
    pub model: Mlp<B>,
    pub history: Vec<EpochMetrics>,
    pub test: EvaluationMetrics,
}

/// Run the whole pipeline: scale, shuffle, split, batch, fit, evaluate.
///
/// Stages execute strictly in sequence, each consuming the previous stage's
/// output before the next begins. The test batch is evaluated exactly once,
/// after training concludes. Any failure aborts the run; there is no retry
/// or partial-failure handling.
pub fn run_pipeline<B: AutodiffBackend>(
    device: &B::Device,
    config: &PipelineConfig,
    train_examples: &[Example],
    test_examples: &[Example],
) -> Result<PipelineOutcome<B>> {
    config.validate()?;
    ensure!(!train_examples.is_empty(), "training split is empty");
    ensure!(!test_examples.is_empty(), "test split is empty");

    let scaled_train: Vec<_> = train_examples.iter().map(scale).collect();
    let scaled_test: Vec<_> = test_examples.iter().map(scale).collect();
    let input_dim = scaled_train[0].pixels.len();

    let mut rng = seeded_rng(config.seed);
    let model = Mlp::init(device, &mut rng, input_dim, config);

    let validation_count = config.validation_count(scaled_train.len());
    let (train_split, validation_split) =
        shuffle_split(scaled_train, config.shuffle_buffer, validation_count, rng);
    ensure!(
        !train_split.is_empty(),
        "no training examples left after the validation split"
    );
    ensure!(
        !validation_split.is_empty(),
        "validation split is empty; not enough examples for validation_fraction {}",
        config.validation_fraction
    );

    let train_batches = batches_of::<B>(device, &train_split, config.batch_size)?;
    let validation_batch = ExampleBatch::from_examples(device, &validation_split)?;
    let test_batch = ExampleBatch::from_examples(device, &scaled_test)?;

    let (model, history) = fit(device, config, model, &train_batches, &validation_batch)?;
    let test = evaluate(device, &model, &test_batch);

    Ok(PipelineOutcome {
        model,
        history,
        test,
    })
}

/// Train for the configured number of epochs.
///
/// Per batch, in order: forward, sparse categorical cross-entropy against
/// the integer labels, backward, Adam step. Training loss and accuracy
/// accumulate per epoch (example-weighted); the validation batch gets one
/// forward-only evaluation at the end of each epoch. There is no early
/// stopping, and a non-finite loss is left to blow up on its own.
pub fn fit<B: AutodiffBackend>(
    device: &B::Device,
    config: &PipelineConfig,
    mut model: Mlp<B>,
    train_batches: &[ExampleBatch<B>],
    validation: &ExampleBatch<B>,
) -> Result<(Mlp<B>, Vec<EpochMetrics>)> {
    ensure!(!train_batches.is_empty(), "no training batches");

    let mut optimizer = AdamConfig::new().init();
    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        let mut total_loss = 0.0f32;
        let mut total_correct = 0usize;
        let mut total_examples = 0usize;

        for batch in train_batches {
            let logits = model.forward(batch.images.clone());
            let loss = loss_fn.forward(logits.clone(), batch.labels.clone());
            let (correct, count) = accuracy_counts(logits, batch.labels.clone());

            total_loss += loss.clone().into_scalar().elem::<f32>() * count as f32;
            total_correct += correct;
            total_examples += count;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        let train = EvaluationMetrics {
            loss: total_loss / total_examples as f32,
            accuracy: total_correct as f32 / total_examples as f32,
        };
        let validation = evaluate(device, &model, validation);

        println!(
            "epoch {:02}: train loss {:.4}, train accuracy {:.2}%, validation loss {:.4}, validation accuracy {:.2}%",
            epoch,
            train.loss,
            train.accuracy * 100.0,
            validation.loss,
            validation.accuracy * 100.0
        );

        history.push(EpochMetrics {
            epoch,
            train,
            validation,
        });
    }

    Ok((model, history))
}

/// One forward pass over a whole batch. No parameter is touched, so
/// repeated calls yield identical metrics.
pub fn evaluate<B: Backend>(
    device: &B::Device,
    model: &Mlp<B>,
    batch: &ExampleBatch<B>,
) -> EvaluationMetrics {
    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let logits = model.forward(batch.images.clone());
    let loss = loss_fn.forward(logits.clone(), batch.labels.clone());
    let (correct, count) = accuracy_counts(logits, batch.labels.clone());

    EvaluationMetrics {
        loss: loss.into_scalar().elem::<f32>(),
        accuracy: correct as f32 / count as f32,
    }
}

fn accuracy_counts<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> (usize, usize) {
    let predictions = logits.argmax(1).squeeze(1);
    let correct = predictions
        .equal(targets.clone())
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize;

    (correct, targets.dims()[0])
}
