use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root URL of the scheduling API
    pub base_url: String,

    pub tenant_id: String,

    /// Login credentials
    pub email: String,
    pub password: String,

    /// Workflow file; the built-in workflow is used when unset
    pub workflow: Option<PathBuf>,

    /// HTML report location, overwritten on every run
    pub report_path: PathBuf,

    /// JSON results location, overwritten on every run
    pub results_path: PathBuf,

    pub junit_path: Option<PathBuf>,

    /// Lowest success rate (percent) that still counts as a passing run
    pub min_success_rate: u32,

    /// Identifiers the run must have captured to count as passing
    pub required_identifiers: Vec<String>,

    /// Steps whose failure is recorded without aborting the run
    pub soft_fail_steps: Vec<String>,

    /// Characters of a failing response shown in the console report
    pub preview_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            tenant_id: "demo-clinic".to_string(),
            email: "admin@demo-clinic.test".to_string(),
            password: "ChangeMe123!".to_string(),
            workflow: None,
            report_path: PathBuf::from("test-report.html"),
            results_path: PathBuf::from("test-results.json"),
            junit_path: None,
            min_success_rate: 80,
            required_identifiers: vec![
                "accessToken".to_string(),
                "providerId".to_string(),
                "patientId".to_string(),
            ],
            soft_fail_steps: vec![
                "Get Availability (Recheck)".to_string(),
                "Book Appointment".to_string(),
            ],
            preview_len: 150,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when no path is given.
    /// Keys missing from the file keep their default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        if config.min_success_rate > 100 {
            anyhow::bail!(
                "minSuccessRate must be between 0 and 100, got {}",
                config.min_success_rate
            );
        }
        Ok(config)
    }

    pub fn is_soft_fail(&self, step_name: &str) -> bool {
        self.soft_fail_steps
            .iter()
            .any(|name| name.eq_ignore_ascii_case(step_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "baseUrl: https://staging.example.com\nminSuccessRate: 90\nsoftFailSteps: []"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.min_success_rate, 90);
        assert!(config.soft_fail_steps.is_empty());
        assert_eq!(config.tenant_id, "demo-clinic");
        assert_eq!(config.report_path, PathBuf::from("test-report.html"));
    }

    #[test]
    fn test_rejects_out_of_range_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "minSuccessRate: 150").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_soft_fail_lookup_is_case_insensitive() {
        let config = Config::default();
        assert!(config.is_soft_fail("book appointment"));
        assert!(!config.is_soft_fail("Login"));
    }
}
