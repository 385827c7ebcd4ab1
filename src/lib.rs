pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::HarvestConfig;

pub use adapters::{
    accepted_papers::AcceptedPapersPage, dblp::DblpClient, sink::DirectorySink,
    storage::LocalStorage,
};
pub use core::{
    engine::{HarvestEngine, HarvestSummary},
    pipeline::ResolutionPipeline,
};
pub use utils::error::{HarvestError, Result};
