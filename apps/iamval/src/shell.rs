//! Interactive validation session.
//!
//! Lines that are not commands accumulate into a policy buffer. `:validate`
//! spawns the remote call on a worker task and returns to the input loop at
//! once; the worker hands its result back over a oneshot channel and only the
//! loop writes to the display. While a call is in flight the trigger is
//! disabled, so at most one validation runs at a time.

use crate::analyzer::{ActiveAnalyzer, AnalyzerError};
use crate::examples::{example_policies, example_text};
use crate::models::{Finding, PolicyDocument, PolicyType};
use crate::output::render_findings_text;
use crate::source::read_file;
use crate::validate::SINGLE_POLICY_NAME;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot;

type Pending = oneshot::Receiver<Result<Vec<Finding>, AnalyzerError>>;

const HELP: &str = "\
Paste policy JSON, then use:
  :validate            validate the buffer (alias :v)
  :type identity|resource
  :profile [NAME]      switch AWS profile (no name = default credentials)
  :load FILE           replace the buffer with a file
  :example NAME        replace the buffer with a built-in example
  :show                print the buffer
  :clear               empty the buffer
  :help                this text
  :quit                leave (alias :q)";

enum Step {
    Continue,
    Quit,
}

struct Session<'a, W: Write> {
    out: &'a mut W,
    active: Arc<ActiveAnalyzer>,
    policy_type: PolicyType,
    buffer: String,
    pending: Option<Pending>,
    color: bool,
}

/// Drive a session until `:quit` or end of input, then wait for any
/// in-flight validation before returning.
pub async fn run_session<R, W>(
    input: R,
    out: &mut W,
    active: Arc<ActiveAnalyzer>,
    policy_type: PolicyType,
    color: bool,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session {
        out,
        active,
        policy_type,
        buffer: String::new(),
        pending: None,
        color,
    };
    session.banner().await?;

    let mut lines = input.lines();
    let mut reading = true;
    loop {
        if !reading && session.pending.is_none() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if reading => {
                match line? {
                    None => reading = false,
                    Some(l) => {
                        if let Step::Quit = session.handle_line(&l).await? {
                            reading = false;
                        }
                    }
                }
            }
            Some(result) = recv(&mut session.pending) => {
                session.pending = None;
                session.show_result(result)?;
            }
        }
    }
    Ok(())
}

async fn recv(pending: &mut Option<Pending>) -> Option<Result<Vec<Finding>, AnalyzerError>> {
    match pending {
        Some(rx) => Some(rx.await.unwrap_or_else(|_| {
            Err(AnalyzerError::Transport("validation worker stopped".to_string()))
        })),
        None => std::future::pending().await,
    }
}

impl<W: Write> Session<'_, W> {
    async fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "🔍 IAM Policy Validator (type :help for commands)")?;
        self.show_identity().await
    }

    async fn show_identity(&mut self) -> io::Result<()> {
        let (settings, analyzer) = self.active.snapshot().await;
        match analyzer.caller_identity().await {
            Ok(id) => writeln!(self.out, "🔐 Connected as: {}", id.describe()),
            Err(e) => writeln!(
                self.out,
                "❌ AWS Error (profile {}): {}",
                settings.profile_label(),
                e
            ),
        }
    }

    async fn handle_line(&mut self, line: &str) -> io::Result<Step> {
        let trimmed = line.trim();
        let Some(cmd) = trimmed.strip_prefix(':') else {
            self.buffer.push_str(line);
            self.buffer.push('\n');
            return Ok(Step::Continue);
        };
        let (name, arg) = match cmd.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (cmd, ""),
        };
        match name {
            "validate" | "v" => self.start_validation().await?,
            "type" => match arg.parse::<PolicyType>() {
                Ok(t) => {
                    self.policy_type = t;
                    writeln!(self.out, "Policy type: {}", t)?;
                }
                Err(e) => writeln!(self.out, "❌ {}", e)?,
            },
            "profile" => {
                let profile = if arg.is_empty() {
                    None
                } else {
                    Some(arg.to_string())
                };
                self.active.switch_profile(profile).await;
                self.show_identity().await?;
            }
            "load" => self.load_file(arg)?,
            "example" => match example_text(arg) {
                Some(text) => {
                    self.buffer = text;
                    writeln!(self.out, "Loaded example '{}'", arg)?;
                }
                None => {
                    let names: Vec<String> = example_policies().keys().cloned().collect();
                    writeln!(self.out, "❌ Unknown example '{}'. Available: {}", arg, names.join(", "))?;
                }
            },
            "show" => writeln!(self.out, "{}", self.buffer.trim_end())?,
            "clear" => {
                self.buffer.clear();
                writeln!(self.out, "Buffer cleared")?;
            }
            "help" => writeln!(self.out, "{}", HELP)?,
            "quit" | "q" => return Ok(Step::Quit),
            other => writeln!(self.out, "❌ Unknown command ':{}' (try :help)", other)?,
        }
        Ok(Step::Continue)
    }

    async fn start_validation(&mut self) -> io::Result<()> {
        if self.pending.is_some() {
            return writeln!(self.out, "⏳ Validation already in progress");
        }
        let document = match PolicyDocument::parse(self.buffer.clone()) {
            Ok(d) => d,
            Err(e) => return writeln!(self.out, "❌ {}", e),
        };
        let (_, analyzer) = self.active.snapshot().await;
        let policy_type = self.policy_type;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = analyzer.validate_policy(&document, policy_type).await;
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
        writeln!(self.out, "Validating policy...")
    }

    fn show_result(&mut self, result: Result<Vec<Finding>, AnalyzerError>) -> io::Result<()> {
        match result {
            Ok(findings) => {
                writeln!(self.out, "{}", render_findings_text(SINGLE_POLICY_NAME, &findings, self.color))?;
                let status = if findings.is_empty() {
                    "Validation complete - No issues found".to_string()
                } else {
                    format!("Validation complete - {} issues found", findings.len())
                };
                writeln!(self.out, "{}", status)
            }
            Err(e) => writeln!(self.out, "❌ {}", e),
        }
    }

    /// Replace the buffer with a file, pretty-printing it when it is JSON.
    fn load_file(&mut self, arg: &str) -> io::Result<()> {
        if arg.is_empty() {
            return writeln!(self.out, "❌ Usage: :load FILE");
        }
        let text = match read_file(Path::new(arg)) {
            Ok(t) => t,
            Err(e) => return writeln!(self.out, "❌ {}", e),
        };
        self.buffer = match PolicyDocument::parse(text.clone()) {
            Ok(doc) => doc.to_pretty(),
            Err(_) => text,
        };
        writeln!(self.out, "Loaded {}", arg)
    }
}
