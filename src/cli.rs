//! CLI interface for clinical-panel

use anyhow::{Result, Context, bail};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{self, Config};
use crate::orchestrator::prompts::{PanelDefaults, DEFAULT_SCENARIO};
use crate::orchestrator::{run_consultation, ConsultationOutcome, ConsultationRequest};
use crate::server::{self, TlsFiles};

#[derive(Parser)]
#[command(name = "clinical-panel")]
#[command(about = "Multi-agent clinical case consultation with a browser UI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI (default when no command given)
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,
        /// Enable HTTPS
        #[arg(long)]
        https: bool,
        /// Path to SSL certificate
        #[arg(long)]
        cert: Option<String>,
        /// Path to SSL private key
        #[arg(long)]
        key: Option<String>,
    },
    /// Run one consultation in the terminal with the default panel
    Consult {
        /// Model provider API key
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Maximum conversation rounds (2-10)
        #[arg(short, long)]
        rounds: Option<i64>,
        /// Read the case from a file ("-" for stdin); defaults to the sample case
        #[arg(short, long)]
        scenario_file: Option<PathBuf>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the default panel and sample case
    Defaults,
    /// Configure the model provider and server
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Print the config file path
        #[arg(long)]
        path: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
        /// Set the model id used by every agent
        #[arg(long)]
        set_model: Option<String>,
        /// Set the provider (gemini, openrouter, custom)
        #[arg(long)]
        set_provider: Option<String>,
    },
}

/// Parse arguments and dispatch; the exit code reflects whether a
/// `consult` run produced a discussion
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = Config::load()?;
            let (host, port) = (config.server.host.clone(), config.server.port);
            server::start(config, &host, port, None).await?;
        }
        Some(Commands::Serve { port, host, https, cert, key }) => {
            let config = Config::load()?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let tls = if https {
                match (cert, key) {
                    (Some(cert), Some(key)) => Some(TlsFiles { cert, key }),
                    _ => bail!("--https requires both --cert and --key"),
                }
            } else {
                None
            };

            server::start(config, &host, port, tls).await?;
        }
        Some(Commands::Consult { api_key, rounds, scenario_file, json }) => {
            let config = Config::load()?;
            let scenario = match scenario_file {
                Some(path) => read_scenario(&path)?,
                None => DEFAULT_SCENARIO.to_string(),
            };
            let rounds = rounds.unwrap_or(i64::from(config.panel.default_max_rounds));
            let request = ConsultationRequest::with_defaults(api_key.unwrap_or_default(), rounds, scenario);

            if !json {
                println!("Running consultation with {} ({} rounds max)...\n", config.llm.model, rounds);
            }
            let outcome = run_consultation(&config.llm, &reqwest::Client::new(), &request).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
            if !consultation_succeeded(&outcome) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Defaults) => {
            let config = Config::load()?;
            let defaults = PanelDefaults::new(config.panel.default_max_rounds);
            let specs = defaults.specialists.iter().chain(std::iter::once(&defaults.moderator));
            for (i, (title, spec)) in defaults.agent_titles.iter().zip(specs).enumerate() {
                println!("{}. {}: {}", i + 1, title, spec.name);
                for line in spec.prompt.lines() {
                    println!("   {}", line);
                }
                println!();
            }
            println!("Sample case:\n{}", defaults.patient_scenario);
            println!("\nRounds: default {}, allowed {}-{}", defaults.default_rounds, defaults.min_rounds, defaults.max_rounds);
        }
        Some(Commands::Config { show, path, reset, set_model, set_provider }) => {
            if let Some(model) = set_model {
                config::set_model(&model)?;
            } else if let Some(provider) = set_provider {
                config::set_provider(&provider)?;
            } else if reset {
                config::reset_config()?;
            } else if path {
                println!("{}", config::config_path()?.display());
            } else if show {
                config::show_config()?;
            } else {
                config::show_config()?;
                println!("\nUse 'clinical-panel config --set-model <id>' or '--set-provider <name>' to change settings.");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Failed runs carry their message in the plan slot with no transcript
fn consultation_succeeded(outcome: &ConsultationOutcome) -> bool {
    !outcome.transcript.is_empty()
}

fn read_scenario(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)
            .context("Failed to read case from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read case file {}", path.display()))
    }
}

fn print_outcome(outcome: &ConsultationOutcome) {
    if outcome.transcript.is_empty() {
        eprintln!("{}", outcome.final_plan);
        return;
    }

    println!("━━━━━━━━━━━━━━━━ Discussion ━━━━━━━━━━━━━━━━");
    for entry in &outcome.transcript {
        println!("\n{}", entry.markdown_label());
        println!("{}", entry.content);
    }
    println!("\n━━━━━━━━━━━━━━━━ Final Plan ━━━━━━━━━━━━━━━━\n");
    println!("{}", outcome.final_plan);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_consult_args() {
        let cli = Cli::try_parse_from([
            "clinical-panel", "consult", "--api-key", "k", "--rounds", "3", "--json",
        ]).unwrap();
        match cli.command {
            Some(Commands::Consult { api_key, rounds, scenario_file, json }) => {
                assert_eq!(api_key.as_deref(), Some("k"));
                assert_eq!(rounds, Some(3));
                assert!(scenario_file.is_none());
                assert!(json);
            }
            _ => panic!("expected consult command"),
        }
    }

    #[tokio::test]
    async fn test_failed_consultation_is_not_success() {
        let request = ConsultationRequest::with_defaults("", 5, DEFAULT_SCENARIO);
        let outcome = run_consultation(
            &config::LlmSettings::default(),
            &reqwest::Client::new(),
            &request,
        )
        .await;
        assert!(!consultation_succeeded(&outcome));
    }

    #[test]
    fn test_read_scenario_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.md");
        std::fs::write(&path, "**Patient:** 60-year-old").unwrap();
        assert_eq!(read_scenario(&path).unwrap(), "**Patient:** 60-year-old");
        assert!(read_scenario(&dir.path().join("missing.md")).is_err());
    }
}
