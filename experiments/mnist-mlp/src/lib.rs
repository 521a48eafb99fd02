pub mod config;
pub mod data;
pub mod model;
pub mod shuffle;
pub mod train;

pub use config::PipelineConfig;
pub use data::{batches_of, load_mnist, scale, Example, ExampleBatch, ScaledExample, IMAGE_SIDE};
pub use model::Mlp;
pub use shuffle::{shuffle_split, ReservoirShuffle};
pub use train::{evaluate, fit, run_pipeline, PipelineOutcome};
