pub mod types;
pub mod yaml;

pub use types::{StepDefinition, Workflow};
pub use yaml::{load_workflow, parse_workflow_content, parse_workflow_file};
