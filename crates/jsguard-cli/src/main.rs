#![warn(missing_docs)]

//! jsguard: statically gate untrusted JavaScript, then run it under node.
//!
//! ```text
//! jsguard [--check] [--version] [CODE | -]
//! ```
//!
//! Exit status is 0 when the snippet is clean (and ran), 2 when it was
//! rejected, and 1 for any other failure.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use jsguard_analyzer::{Analyzer, AnalyzerOptions, DenyList};
use jsguard_config::JsguardConfig;
use jsguard_sandbox::audit::TracingAuditLogger;
use jsguard_sandbox::validator::validate_code;
use jsguard_sandbox::{Gatekeeper, SandboxConfig, SandboxError};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: jsguard [--check] [--version] [CODE | -]";

/// Exit status for a snippet refused by the gate.
const EXIT_REJECTED: u8 = 2;

#[derive(Debug, PartialEq, Eq)]
enum Source {
    Inline(String),
    Stdin,
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Version,
    Help,
    Run { check_only: bool, source: Source },
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut check_only = false;
    let mut source = None;
    let mut positional_only = false;

    for arg in args {
        match arg.as_str() {
            "--version" | "-V" if !positional_only => return Ok(Invocation::Version),
            "--help" | "-h" if !positional_only => return Ok(Invocation::Help),
            "--check" if !positional_only => check_only = true,
            "--" if !positional_only => positional_only = true,
            flag if flag.starts_with("--") && !positional_only => {
                anyhow::bail!("unknown option '{flag}'")
            }
            value => {
                if source.is_some() {
                    anyhow::bail!("expected a single CODE argument");
                }
                source = Some(match value {
                    "-" => Source::Stdin,
                    code => Source::Inline(code.to_string()),
                });
            }
        }
    }

    Ok(Invocation::Run {
        check_only,
        source: source.unwrap_or(Source::Stdin),
    })
}

/// Locate the config file.
///
/// Search order:
/// 1. `JSGUARD_CONFIG` environment variable
/// 2. `./jsguard.toml` in the current directory
/// 3. None (no config file found, not an error)
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("JSGUARD_CONFIG") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }

    let cwd = PathBuf::from("jsguard.toml");
    if cwd.exists() {
        return Some(cwd);
    }

    None
}

fn load_config() -> Result<JsguardConfig> {
    match find_config_file() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            JsguardConfig::from_file_with_env(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            Ok(JsguardConfig::default())
        }
    }
}

/// Build the analyzer from config overrides.
fn build_analyzer(overrides: &jsguard_config::AnalyzerOverrides) -> Analyzer {
    let mut options = AnalyzerOptions {
        deny_list: DenyList::default().with_extra(overrides.extra_denied_modules.iter().cloned()),
        ..AnalyzerOptions::default()
    };
    if let Some(depth) = overrides.max_eval_depth {
        options.max_eval_depth = depth;
    }
    Analyzer::new(options)
}

/// Build SandboxConfig from config overrides.
fn build_sandbox_config(config: &JsguardConfig) -> SandboxConfig {
    let mut sandbox = SandboxConfig::default();
    if let Some(size) = config.analyzer.max_code_size {
        sandbox.max_code_size = size;
    }
    let executor = &config.executor;
    if let Some(timeout) = executor.timeout_secs {
        sandbox.timeout = Duration::from_secs(timeout);
    }
    if let Some(heap) = executor.max_heap_mb {
        sandbox.max_heap_mb = heap;
    }
    if let Some(kb) = executor.max_output_size_kb {
        sandbox.max_output_size = kb * 1024;
    }
    sandbox.node_binary = executor.node_binary.clone();
    sandbox
}

fn read_source(source: Source) -> Result<String> {
    match source {
        Source::Inline(code) => Ok(code),
        Source::Stdin => {
            let mut code = String::new();
            std::io::stdin()
                .read_to_string(&mut code)
                .context("failed to read code from stdin")?;
            Ok(code)
        }
    }
}

fn rejected(err: &SandboxError) -> ExitCode {
    eprintln!("{err}");
    ExitCode::from(EXIT_REJECTED)
}

async fn run(check_only: bool, source: Source) -> Result<ExitCode> {
    let config = load_config()?;
    let analyzer = build_analyzer(&config.analyzer);
    let sandbox_config = build_sandbox_config(&config);
    let code = read_source(source)?;

    if check_only {
        let verdict = validate_code(&code, sandbox_config.max_code_size)
            .and_then(|()| analyzer.analyze(&code).map_err(SandboxError::from));
        return match verdict {
            Ok(verdict) => {
                println!("{verdict}");
                Ok(if verdict.is_clean() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(EXIT_REJECTED)
                })
            }
            Err(e) if e.is_rejection() => Ok(rejected(&e)),
            Err(e) => Err(e.into()),
        };
    }

    let gate = Gatekeeper::with_node(analyzer, &sandbox_config)
        .context("failed to set up the node executor")?
        .with_audit_logger(Arc::new(TracingAuditLogger));

    match gate.run(&code).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_rejection() => Ok(rejected(&e)),
        Err(e) => Err(e.into()),
    }
}

// Single-threaded: `EnvScope` mutates the process environment.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (check_only, source) = match parse_args(&args) {
        Ok(Invocation::Version) => {
            println!("jsguard {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Run { check_only, source }) => (check_only, source),
        Err(e) => {
            eprintln!("error: {e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(check_only, source).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "jsguard failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_inline_code() {
        assert_eq!(
            parse_args(&args(&["1 + 1"])).unwrap(),
            Invocation::Run {
                check_only: false,
                source: Source::Inline("1 + 1".into())
            }
        );
    }

    #[test]
    fn parse_args_defaults_to_stdin() {
        for list in [&[][..], &["-"][..], &["--check", "-"][..]] {
            let Invocation::Run { source, .. } = parse_args(&args(list)).unwrap() else {
                panic!("expected a run for {list:?}");
            };
            assert_eq!(source, Source::Stdin);
        }
    }

    #[test]
    fn parse_args_flags() {
        assert_eq!(parse_args(&args(&["--version"])).unwrap(), Invocation::Version);
        assert_eq!(parse_args(&args(&["-V", "x"])).unwrap(), Invocation::Version);
        assert_eq!(parse_args(&args(&["--help"])).unwrap(), Invocation::Help);
        assert!(matches!(
            parse_args(&args(&["--check", "x"])).unwrap(),
            Invocation::Run { check_only: true, .. }
        ));
    }

    #[test]
    fn parse_args_double_dash_allows_flag_like_code() {
        assert_eq!(
            parse_args(&args(&["--", "--x"])).unwrap(),
            Invocation::Run {
                check_only: false,
                source: Source::Inline("--x".into())
            }
        );
    }

    #[test]
    fn parse_args_rejects_unknown_and_extra() {
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
        assert!(parse_args(&args(&["a", "b"])).is_err());
    }

    #[test]
    fn analyzer_from_overrides() {
        let overrides = jsguard_config::AnalyzerOverrides {
            max_eval_depth: Some(3),
            max_code_size: None,
            extra_denied_modules: vec!["worker_threads".into()],
        };
        let analyzer = build_analyzer(&overrides);
        assert_eq!(analyzer.options().max_eval_depth, 3);
        assert!(analyzer.options().deny_list.is_denied("worker_threads"));
        assert!(analyzer.options().deny_list.is_denied("fs"));
    }

    #[test]
    fn sandbox_config_from_overrides() {
        let config = JsguardConfig::from_toml(
            r#"
            [analyzer]
            max_code_size = 1000

            [executor]
            node_binary = "/usr/local/bin/node"
            timeout_secs = 2
            max_heap_mb = 32
            max_output_size_kb = 8
        "#,
        )
        .unwrap();
        let sandbox = build_sandbox_config(&config);
        assert_eq!(sandbox.max_code_size, 1000);
        assert_eq!(sandbox.timeout, Duration::from_secs(2));
        assert_eq!(sandbox.max_heap_mb, 32);
        assert_eq!(sandbox.max_output_size, 8 * 1024);
        assert_eq!(sandbox.node_binary, Some(PathBuf::from("/usr/local/bin/node")));
    }

    #[test]
    fn sandbox_config_defaults() {
        let sandbox = build_sandbox_config(&JsguardConfig::default());
        let defaults = SandboxConfig::default();
        assert_eq!(sandbox.timeout, defaults.timeout);
        assert_eq!(sandbox.max_code_size, defaults.max_code_size);
        assert!(sandbox.node_binary.is_none());
    }

    #[test]
    #[serial]
    fn config_file_from_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[executor]\ntimeout_secs = 9\n").unwrap();

        std::env::set_var("JSGUARD_CONFIG", &path);
        let found = find_config_file();
        let config = load_config().unwrap();
        std::env::remove_var("JSGUARD_CONFIG");

        assert_eq!(found, Some(path));
        assert_eq!(config.executor.timeout_secs, Some(9));
    }
}
