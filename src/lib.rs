pub mod error;
pub mod parser;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use error::StepError;
pub use report::generate_report;
pub use runner::run_workflow;
pub use utils::config::Config;
