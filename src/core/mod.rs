pub mod engine;
pub mod executor;
pub mod extract;
pub mod filter;
pub mod identifier;
pub mod pipeline;
pub mod router;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
