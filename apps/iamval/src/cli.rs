//! CLI argument parsing via `clap`.

use crate::models::PolicyType;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "iamval",
    version,
    about = "IAM policy validator (AWS IAM Access Analyzer)",
    long_about = "iamval — validate IAM policy documents and CloudFormation templates with AWS IAM Access Analyzer.\n\nConfiguration precedence: CLI > iamval.toml > defaults.",
    after_help = "Examples:\n  iamval validate --file policy.json\n  iamval validate --policy '{\"Version\":\"2012-10-17\",\"Statement\":[]}' --type resource\n  iamval validate --file stack.yaml --template --fail-on-findings\n  iamval serve --bind 127.0.0.1:8000\n  iamval shell --profile spoke",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current iamval version.")]
    Version,
    /// Validate a policy document or template
    #[command(
        about = "Validate policies",
        long_about = "Validate one policy document (from --file or --policy) or every IAM policy embedded in a CloudFormation template (--template). Findings exit 0 unless --fail-on-findings is set.",
        after_help = "Examples:\n  iamval validate --file policy.json\n  iamval validate --file bucket-policy.json --type resource\n  iamval validate --file stack.json --template --output json"
    )]
    Validate {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, short = 'f', help = "Path to a policy JSON file or template")]
        file: Option<String>,
        #[arg(long, short = 'p', help = "Policy JSON as a string")]
        policy: Option<String>,
        #[arg(
            long = "type",
            short = 't',
            help = "Policy type: IDENTITY_POLICY|RESOURCE_POLICY (default: IDENTITY_POLICY)"
        )]
        policy_type: Option<PolicyType>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Treat --file as a CloudFormation template (JSON or YAML)")]
        template: bool,
        #[arg(long, help = "AWS profile to use (default: ambient credentials)")]
        profile: Option<String>,
        #[arg(long, help = "AWS region (default: us-east-1)")]
        region: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit 1 when any finding is reported")]
        fail_on_findings: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit 3 when input or remote errors occur")]
        fail_on_error: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print a remediation prompt when findings exist")]
        remediation_prompt: bool,
    },
    /// Show the caller identity
    #[command(
        about = "Show caller identity",
        long_about = "Resolve credentials for the selected profile and print the caller identity."
    )]
    Identity {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "AWS profile to use (default: ambient credentials)")]
        profile: Option<String>,
        #[arg(long, help = "AWS region (default: us-east-1)")]
        region: Option<String>,
    },
    /// List configured AWS profiles
    #[command(
        about = "List AWS profiles",
        long_about = "List profile names found in the shared AWS config and credentials files."
    )]
    Profiles,
    /// Print built-in example policies
    #[command(
        about = "Print example policies",
        long_about = "Print all built-in example policies, or one by name.",
        after_help = "Examples:\n  iamval examples\n  iamval examples overpermissive"
    )]
    Examples {
        #[arg(help = "Example name: overpermissive|well_scoped_s3|resource_policy")]
        name: Option<String>,
    },
    /// Run the web interface
    #[command(
        about = "Serve the web interface",
        long_about = "Serve a single-page validator and its JSON API. Profile switches apply to every later request."
    )]
    Serve {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Listen address (default: 127.0.0.1:8000)")]
        bind: Option<String>,
        #[arg(long, help = "AWS profile to start with (default: ambient credentials)")]
        profile: Option<String>,
        #[arg(long, help = "AWS region (default: us-east-1)")]
        region: Option<String>,
    },
    /// Interactive terminal session
    #[command(
        about = "Interactive session",
        long_about = "Paste or load a policy and validate it interactively. Type :help inside the session for commands."
    )]
    Shell {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "AWS profile to start with (default: ambient credentials)")]
        profile: Option<String>,
        #[arg(long, help = "AWS region (default: us-east-1)")]
        region: Option<String>,
        #[arg(long = "type", short = 't', help = "Initial policy type (default: IDENTITY_POLICY)")]
        policy_type: Option<PolicyType>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_flags_parse() {
        let cli = Cli::try_parse_from([
            "iamval",
            "validate",
            "-f",
            "stack.yaml",
            "--template",
            "--type",
            "resource",
            "--fail-on-findings",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Validate {
                file,
                template,
                policy_type,
                fail_on_findings,
                fail_on_error,
                ..
            } => {
                assert_eq!(file.as_deref(), Some("stack.yaml"));
                assert!(template);
                assert_eq!(policy_type, Some(PolicyType::ResourcePolicy));
                assert!(fail_on_findings);
                assert!(!fail_on_error);
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn test_bad_type_is_rejected() {
        assert!(Cli::try_parse_from(["iamval", "validate", "-p", "{}", "-t", "group"]).is_err());
    }
}
