pub mod run;
pub mod orchestrator;

pub use run::{Run, RunStatus};
pub use orchestrator::RunOrchestrator;
