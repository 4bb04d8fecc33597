//! Benchmark pipeline components.
//!
//! - **discovery**: Find corpus images in the input directory
//! - **ground_truth**: Expected tags per image
//! - **rate_limit**: Backoff after live vendor calls
//! - **output_image**: Copy or resize images into the output directory
//! - **orchestrator**: The image × vendor loop

pub mod discovery;
pub mod ground_truth;
pub mod orchestrator;
pub mod output_image;
pub mod rate_limit;

pub use discovery::{DiscoveredFile, FileDiscovery};
pub use ground_truth::GroundTruth;
pub use orchestrator::{BenchmarkRun, Orchestrator};
pub use output_image::OutputImages;
pub use rate_limit::{FixedDelay, RateLimiter};
