use super::types::Workflow;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Workflow used when no `--workflow` file is given
pub const DEFAULT_WORKFLOW: &str = include_str!("../../workflows/scheduling.yaml");

/// Load the workflow at `path`, or the built-in one
pub fn load_workflow(path: Option<&Path>) -> Result<Workflow> {
    match path {
        Some(p) => parse_workflow_file(p),
        None => parse_workflow_content(DEFAULT_WORKFLOW).context("Built-in workflow is invalid"),
    }
}

/// Parse a YAML workflow file
pub fn parse_workflow_file(path: &Path) -> Result<Workflow> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_workflow_content(&content)
        .with_context(|| format!("Invalid workflow file: {}", path.display()))
}

/// Parse YAML content into a Workflow
pub fn parse_workflow_content(content: &str) -> Result<Workflow> {
    let workflow: Workflow = serde_yaml::from_str(content)?;
    validate(&workflow)?;
    Ok(workflow)
}

fn validate(workflow: &Workflow) -> Result<()> {
    if workflow.steps.is_empty() {
        anyhow::bail!("Workflow '{}' has no steps", workflow.name);
    }

    let mut seen = HashSet::new();
    for step in &workflow.steps {
        if !seen.insert(step.name.as_str()) {
            anyhow::bail!("Duplicate step name: {}", step.name);
        }
        step.method
            .parse::<reqwest::Method>()
            .map_err(|_| anyhow::anyhow!("Step '{}': invalid HTTP method {}", step.name, step.method))?;
    }

    Ok(())
}
