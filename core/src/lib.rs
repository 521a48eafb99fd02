pub mod config;
pub mod experiment;
pub mod metrics;
pub mod report;
pub mod rng;
pub mod visualization;

pub use config::{load_optional, load_or_init, save_pretty};
pub use experiment::{ExperimentMode, ExperimentModeArgs};
pub use metrics::{EpochMetrics, EvaluationMetrics};
pub use report::{ensure_report_file, update_sections, ReportSection, DEFAULT_REPORT_TEMPLATE};
pub use rng::seeded_rng;
pub use visualization::encode_luma_png_data_url;
