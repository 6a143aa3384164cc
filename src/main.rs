use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use clinic_flow_tester::{parser, report, runner, utils::config::Config};

#[derive(Parser)]
#[command(name = "clinic-flow-tester")]
#[command(version)]
#[command(about = "End-to-end workflow tester for the clinic scheduling API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduling workflow against a live API
    Run {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root URL of the API
        #[arg(long, env = "CLINIC_API_BASE_URL")]
        base_url: Option<String>,

        /// Tenant the run logs into
        #[arg(long, env = "CLINIC_TENANT_ID")]
        tenant_id: Option<String>,

        /// Login email
        #[arg(long, env = "CLINIC_API_EMAIL")]
        email: Option<String>,

        /// Login password
        #[arg(long, env = "CLINIC_API_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Workflow file (built-in scheduling workflow when omitted)
        #[arg(short, long)]
        workflow: Option<PathBuf>,

        /// HTML report path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON results path
        #[arg(long)]
        results: Option<PathBuf>,

        /// Also write a JUnit XML report
        #[arg(long)]
        junit: Option<PathBuf>,

        /// Lowest success rate (percent) that passes the run
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        min_success_rate: Option<u32>,
    },

    /// Generate report from saved results
    Report {
        /// Path to test results JSON
        results: PathBuf,

        /// Output format (html, json, junit, console)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List workflow steps and whether a failure aborts the run
    Steps {
        /// Workflow file (built-in scheduling workflow when omitted)
        #[arg(short, long)]
        workflow: Option<PathBuf>,

        /// YAML configuration file, for its soft-fail list
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            base_url,
            tenant_id,
            email,
            password,
            workflow,
            output,
            results,
            junit,
            min_success_rate,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(v) = base_url {
                config.base_url = v;
            }
            if let Some(v) = tenant_id {
                config.tenant_id = v;
            }
            if let Some(v) = email {
                config.email = v;
            }
            if let Some(v) = password {
                config.password = v;
            }
            if workflow.is_some() {
                config.workflow = workflow;
            }
            if let Some(v) = output {
                config.report_path = v;
            }
            if let Some(v) = results {
                config.results_path = v;
            }
            if junit.is_some() {
                config.junit_path = junit;
            }
            if let Some(v) = min_success_rate {
                config.min_success_rate = v;
            }

            println!(
                "{} Running workflow against: {}",
                "▶".green().bold(),
                config.base_url.cyan()
            );
            println!("  Tenant: {}", config.tenant_id.cyan());
            println!("  Report: {}", config.report_path.display().to_string().cyan());
            log::debug!("Soft-fail steps: {:?}", config.soft_fail_steps);

            runner::run_workflow(&config).await?;
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            let preview_len = Config::default().preview_len;
            report::generate_report(&results, &format, output.as_deref(), preview_len).await?;
        }

        Commands::Steps { workflow, config } => {
            let config = Config::load(config.as_deref())?;
            let workflow = parser::load_workflow(workflow.as_deref().or(config.workflow.as_deref()))?;

            println!("{} {}", "📋".to_string().blue(), workflow.name.bold());
            for (index, step) in workflow.steps.iter().enumerate() {
                let kind = if step.soft_fail || config.is_soft_fail(&step.name) {
                    "soft".yellow()
                } else {
                    "hard".red()
                };
                println!(
                    "  [{}] {:<28} {:<6} {} {}",
                    index + 1,
                    step.name,
                    step.method,
                    step.path.dimmed(),
                    kind
                );
            }
        }
    }

    Ok(())
}
