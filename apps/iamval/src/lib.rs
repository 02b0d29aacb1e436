//! iamval core library.
//!
//! This crate validates IAM policy documents with AWS IAM Access Analyzer,
//! either one document at a time or every policy embedded in a
//! CloudFormation template, and presents the findings through a CLI, a small
//! web interface, or an interactive terminal session.
//!
//! High-level modules:
//! - `analyzer`: The remote validation seam (AWS and in-process analyzers).
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `examples`: Built-in example policies.
//! - `logging`: Tracing subscriber setup.
//! - `models`: Policy documents, findings, and run reports.
//! - `output`: Human/JSON/HTML renderers for findings and runs.
//! - `profiles`: AWS profile discovery from the shared config files.
//! - `server`: Web interface and JSON API.
//! - `shell`: Interactive terminal session.
//! - `source`: Reading policy text from strings and files.
//! - `template`: Policy extraction from CloudFormation templates.
//! - `utils`: Terminal helpers.
//! - `validate`: The CLI validation runner and exit codes.
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod examples;
pub mod logging;
pub mod models;
pub mod output;
pub mod profiles;
pub mod server;
pub mod shell;
pub mod source;
pub mod template;
pub mod utils;
pub mod validate;
