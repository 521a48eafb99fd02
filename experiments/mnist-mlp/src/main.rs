use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use perceptor_core::{
    encode_luma_png_data_url, ensure_report_file, load_optional, load_or_init, save_pretty,
    update_sections, EpochMetrics, EvaluationMetrics, ExperimentMode, ExperimentModeArgs,
    ReportSection, DEFAULT_REPORT_TEMPLATE,
};
use perceptor_experiment_mnist::{
    data::{load_mnist, scale, Example, ExampleBatch, IMAGE_SIDE},
    model::Mlp,
    train::{run_pipeline, PipelineOutcome},
    PipelineConfig,
};
use serde::{Deserialize, Serialize};

type PipelineBackend = Autodiff<NdArray<f32>>;

const SAMPLE_COUNT: usize = 3;
const BENCHMARK_TOLERANCE: f32 = 5e-3;

struct ExperimentPaths {
    config: PathBuf,
    report: PathBuf,
    benchmark: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BenchmarkSnapshot {
    final_epoch: EpochMetrics,
    test: EvaluationMetrics,
}

struct SamplePrediction {
    index: usize,
    label: u8,
    prediction: i64,
    image_data_url: String,
}

fn main() -> Result<()> {
    let args = ExperimentModeArgs::parse_from_env()?;
    if args.help_requested() {
        print_usage();
        return Ok(());
    }
    let mode = args.mode();

    let paths = initialize_paths()?;
    let configured: PipelineConfig = load_or_init(&paths.config, PipelineConfig::default)?;
    let config = mode.select(configured, benchmark_config());
    ensure_report_file(&paths.report, DEFAULT_REPORT_TEMPLATE)?;

    println!(
        "running the MNIST dense-network pipeline in {} mode",
        mode.label()
    );

    let device = NdArrayDevice::Cpu;
    let (train_examples, test_examples) = load_mnist();
    println!(
        "loaded {} training and {} test examples",
        train_examples.len(),
        test_examples.len()
    );

    let outcome =
        run_pipeline::<PipelineBackend>(&device, &config, &train_examples, &test_examples)?;

    println!(
        "Test loss: {:.2}. Test accuracy: {:.2}%",
        outcome.test.loss,
        outcome.test.accuracy * 100.0
    );

    let samples = sample_predictions(&device, &outcome.model, &test_examples, SAMPLE_COUNT)?;
    write_report(&paths.report, mode, &config, &outcome, &samples)?;

    if mode == ExperimentMode::Test {
        check_benchmark(&paths.benchmark, &outcome)?;
    }

    Ok(())
}

fn print_usage() {
    println!("Usage: cargo run -p perceptor-experiment-mnist -- [--mode full|test]");
}

/// Reduced deterministic configuration for `test` mode, small enough to
/// finish quickly and stable enough to compare against a saved snapshot.
fn benchmark_config() -> PipelineConfig {
    PipelineConfig {
        epochs: 1,
        hidden_layers: 2,
        hidden_dim: 64,
        ..PipelineConfig::default()
    }
}

fn initialize_paths() -> Result<ExperimentPaths> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("runs");
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create run directory {}", dir.display()))?;

    Ok(ExperimentPaths {
        config: dir.join("config.json"),
        report: dir.join("report.md"),
        benchmark: dir.join("benchmark.json"),
    })
}

fn sample_predictions(
    device: &NdArrayDevice,
    model: &Mlp<PipelineBackend>,
    examples: &[Example],
    count: usize,
) -> Result<Vec<SamplePrediction>> {
    let scaled: Vec<_> = examples.iter().take(count).map(scale).collect();
    if scaled.is_empty() {
        return Ok(Vec::new());
    }

    let batch = ExampleBatch::<PipelineBackend>::from_examples(device, &scaled)?;
    let predictions = model
        .forward(batch.images.clone())
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|err| anyhow!("failed to decode predictions: {err:?}"))?;

    let mut samples = Vec::with_capacity(scaled.len());
    for (index, (example, prediction)) in scaled.iter().zip(predictions).enumerate() {
        let image_data_url =
            encode_luma_png_data_url(IMAGE_SIDE as u32, IMAGE_SIDE as u32, &example.pixels)?;
        samples.push(SamplePrediction {
            index,
            label: example.label,
            prediction,
            image_data_url,
        });
    }

    Ok(samples)
}

fn write_report(
    path: &Path,
    mode: ExperimentMode,
    config: &PipelineConfig,
    outcome: &PipelineOutcome<PipelineBackend>,
    samples: &[SamplePrediction],
) -> Result<()> {
    let sections = [
        ReportSection::new(
            "overview",
            format!(
                "Dense-network MNIST baseline, last run in {} mode.",
                mode.label()
            ),
        ),
        ReportSection::new("configuration", render_configuration(config)),
        ReportSection::new("metrics", render_metrics(&outcome.history, &outcome.test)),
        ReportSection::new("samples", render_samples(samples)),
    ];

    update_sections(path, &sections)
}

fn render_configuration(config: &PipelineConfig) -> String {
    format!(
        "- Seed: {}\n- Validation fraction: {}\n- Shuffle buffer: {}\n- Batch size: {}\n- Hidden layers: {} x {} units\n- Classes: {}\n- Epochs: {}\n- Learning rate: {}\n- Optimizer: adam\n- Loss: sparse categorical cross-entropy\n",
        config.seed,
        config.validation_fraction,
        config.shuffle_buffer,
        config.batch_size,
        config.hidden_layers,
        config.hidden_dim,
        config.num_classes,
        config.epochs,
        config.learning_rate
    )
}

fn render_metrics(history: &[EpochMetrics], test: &EvaluationMetrics) -> String {
    let mut output = String::new();

    let _ = writeln!(
        &mut output,
        "- Test loss: {:.2}\n- Test accuracy: {:.2}%",
        test.loss,
        test.accuracy * 100.0
    );

    if !history.is_empty() {
        let _ = writeln!(&mut output);
        let _ = writeln!(
            &mut output,
            "| Epoch | Train Loss | Train Accuracy (%) | Validation Loss | Validation Accuracy (%) |"
        );
        let _ = writeln!(&mut output, "| --- | --- | --- | --- | --- |");

        for metrics in history {
            let _ = writeln!(
                &mut output,
                "| {} | {:.4} | {:.2} | {:.4} | {:.2} |",
                metrics.epoch,
                metrics.train.loss,
                metrics.train.accuracy * 100.0,
                metrics.validation.loss,
                metrics.validation.accuracy * 100.0
            );
        }
    }

    output
}

fn render_samples(samples: &[SamplePrediction]) -> String {
    if samples.is_empty() {
        return "No samples available.".into();
    }

    let mut output = String::new();
    for sample in samples {
        let _ = writeln!(
            &mut output,
            "#### Test example {}\n- True label: {}\n- Predicted: {}\n\n![Sample image]({})\n",
            sample.index, sample.label, sample.prediction, sample.image_data_url
        );
    }

    output
}

fn check_benchmark(path: &Path, outcome: &PipelineOutcome<PipelineBackend>) -> Result<()> {
    let final_epoch = outcome
        .history
        .last()
        .copied()
        .ok_or_else(|| anyhow!("training history is empty"))?;
    let snapshot = BenchmarkSnapshot {
        final_epoch,
        test: outcome.test,
    };

    match load_optional::<BenchmarkSnapshot>(path)? {
        Some(reference) => {
            validate_benchmark(&snapshot, &reference)?;
            println!("benchmark check passed (tolerance {:.1e})", BENCHMARK_TOLERANCE);
        }
        None => {
            save_pretty(path, &snapshot)?;
            println!("saved new benchmark snapshot to {}", path.display());
        }
    }

    Ok(())
}

fn validate_benchmark(actual: &BenchmarkSnapshot, reference: &BenchmarkSnapshot) -> Result<()> {
    ensure_close(
        actual.final_epoch.train.loss,
        reference.final_epoch.train.loss,
        "final train loss",
    )?;
    ensure_close(
        actual.final_epoch.train.accuracy,
        reference.final_epoch.train.accuracy,
        "final train accuracy",
    )?;
    ensure_close(
        actual.final_epoch.validation.loss,
        reference.final_epoch.validation.loss,
        "final validation loss",
    )?;
    ensure_close(
        actual.final_epoch.validation.accuracy,
        reference.final_epoch.validation.accuracy,
        "final validation accuracy",
    )?;
    ensure_close(actual.test.loss, reference.test.loss, "test loss")?;
    ensure_close(actual.test.accuracy, reference.test.accuracy, "test accuracy")?;

    Ok(())
}

fn ensure_close(actual: f32, expected: f32, label: &str) -> Result<()> {
    if (actual - expected).abs() > BENCHMARK_TOLERANCE {
        Err(anyhow!(
            "{} deviated from benchmark (actual {:.4} vs expected {:.4}, tol {:.4})",
            label,
            actual,
            expected,
            BENCHMARK_TOLERANCE
        ))
    } else {
        Ok(())
    }
}
