//! iamval CLI binary entry point.
//! Delegates to library modules for validation, serving, and the interactive shell.

use clap::Parser;
use iamval::analyzer::aws::{AwsAnalyzer, AwsConnector};
use iamval::analyzer::{ActiveAnalyzer, PolicyAnalyzer};
use iamval::cli::{Cli, Commands};
use iamval::config::{self, Overrides};
use iamval::examples::{example_policies, example_text};
use iamval::models::Outcome;
use iamval::output;
use iamval::profiles::list_profiles;
use iamval::server::{self, AppState};
use iamval::shell;
use iamval::source::PolicySource;
use iamval::utils::{error_prefix, info_prefix, note_prefix, use_colors};
use iamval::validate::{self, Input, PlanError, EXIT_USAGE};
use std::path::PathBuf;
use std::sync::Arc;

fn flag(set: bool) -> Option<bool> {
    if set {
        Some(true)
    } else {
        None
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate {
            repo_root,
            file,
            policy,
            policy_type,
            template,
            profile,
            region,
            fail_on_findings,
            fail_on_error,
            output,
            remediation_prompt,
        } => {
            iamval::logging::init_tracing("warn");
            let eff = config::resolve_effective(&Overrides {
                repo_root: repo_root.as_deref(),
                profile: profile.as_deref(),
                region: region.as_deref(),
                output: output.as_deref(),
                policy_type,
                fail_on_findings: flag(fail_on_findings),
                fail_on_error: flag(fail_on_error),
                bind: None,
            });

            let file = file.filter(|f| !f.is_empty());
            let policy = policy.filter(|p| !p.is_empty());
            let input = match (file, policy) {
                (Some(f), _) if template => Input::Template(PathBuf::from(f)),
                (Some(f), _) => Input::Policy(PolicySource::File(PathBuf::from(f))),
                (None, Some(p)) => {
                    if template {
                        eprintln!("{} --template only applies to --file; validating --policy as a single document", note_prefix());
                    }
                    Input::Policy(PolicySource::Literal(p))
                }
                (None, None) => {
                    eprintln!("{} Either --file or --policy must be specified", error_prefix());
                    std::process::exit(EXIT_USAGE);
                }
            };

            let plan = match validate::plan(&input, eff.policy_type) {
                Ok(p) => p,
                Err(err) => {
                    match &err {
                        PlanError::Template(_) => {
                            output::print_failure(&err.to_string(), &eff.output);
                            output::print_failure("No IAM policies found in template", &eff.output);
                        }
                        _ => output::print_failure(&err.to_string(), &eff.output),
                    }
                    std::process::exit(err.exit_code(eff.fail_on_error));
                }
            };
            tracing::info!(count = plan.policies.len(), template = plan.template, "planned validation");

            let analyzer = AwsAnalyzer::connect(&eff.connection()).await;
            let run = validate::run_plan(&analyzer as &dyn PolicyAnalyzer, &plan).await;
            output::print_run(&run, &eff.output, plan.template);

            if remediation_prompt && eff.output != "json" {
                if run.summary.findings == 0 {
                    eprintln!("{} No findings; no remediation prompt needed", info_prefix());
                }
                for (p, report) in plan.policies.iter().zip(run.reports.iter()) {
                    if let Outcome::Findings(findings) = &report.outcome {
                        if !findings.is_empty() {
                            println!("\n🔧 Remediation prompt for {}:\n", report.name);
                            println!("{}", output::remediation_prompt(&p.document, findings));
                        }
                    }
                }
            }
            std::process::exit(validate::exit_code(
                &run,
                eff.fail_on_findings,
                eff.fail_on_error,
            ));
        }
        Commands::Identity {
            repo_root,
            profile,
            region,
        } => {
            iamval::logging::init_tracing("warn");
            let eff = config::resolve_effective(&Overrides {
                repo_root: repo_root.as_deref(),
                profile: profile.as_deref(),
                region: region.as_deref(),
                ..Default::default()
            });
            let analyzer = AwsAnalyzer::connect(&eff.connection()).await;
            match analyzer.caller_identity().await {
                Ok(id) => println!("Connected as: {}", id.describe()),
                Err(e) => output::print_failure(&e.to_string(), &eff.output),
            }
        }
        Commands::Profiles => {
            for p in list_profiles() {
                println!("{}", p);
            }
        }
        Commands::Examples { name } => match name {
            None => println!(
                "{}",
                serde_json::to_string_pretty(&example_policies()).unwrap_or_default()
            ),
            Some(n) => match example_text(&n) {
                Some(text) => println!("{}", text),
                None => {
                    let names: Vec<String> = example_policies().keys().cloned().collect();
                    eprintln!(
                        "{} Unknown example '{}'. Available: {}",
                        error_prefix(),
                        n,
                        names.join(", ")
                    );
                    std::process::exit(EXIT_USAGE);
                }
            },
        },
        Commands::Serve {
            repo_root,
            bind,
            profile,
            region,
        } => {
            iamval::logging::init_tracing("info");
            let eff = config::resolve_effective(&Overrides {
                repo_root: repo_root.as_deref(),
                profile: profile.as_deref(),
                region: region.as_deref(),
                bind: bind.as_deref(),
                ..Default::default()
            });
            let active = ActiveAnalyzer::connect(Arc::new(AwsConnector), eff.connection()).await;
            server::serve(&eff.bind, AppState::new(Arc::new(active))).await?;
        }
        Commands::Shell {
            repo_root,
            profile,
            region,
            policy_type,
        } => {
            iamval::logging::init_tracing("warn");
            let eff = config::resolve_effective(&Overrides {
                repo_root: repo_root.as_deref(),
                profile: profile.as_deref(),
                region: region.as_deref(),
                policy_type,
                ..Default::default()
            });
            let active = ActiveAnalyzer::connect(Arc::new(AwsConnector), eff.connection()).await;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run_session(
                stdin,
                &mut stdout,
                Arc::new(active),
                eff.policy_type,
                use_colors(&eff.output),
            )
            .await?;
        }
    }
    Ok(())
}
