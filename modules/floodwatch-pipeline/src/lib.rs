pub mod assembler;
pub mod controller;
pub mod deps;
pub mod dispatch;
pub mod evidence;
pub mod gatekeeper;
pub mod images;
pub mod infra;
pub mod location;
pub mod scoring;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use controller::{FloodPipeline, PipelineState};
pub use deps::ServiceContext;
pub use dispatch::{dispatch, DispatchSummary};
