#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::prelude::*;

use awsresq::app::client::{AwsresqClient, ServiceRegistry};
use awsresq::app::config::{ClientConfig, Overrides, Settings};
use awsresq::app::query::{FailurePolicy, QueryError};
use awsresq::{trace_debug, trace_error, trace_info};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT"), ")");

const DEPENDENCY_FILTER: &str =
    "aws_config=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn";

/// Query one kind of AWS resource across many regions and print it as JSON
#[derive(Debug, Parser)]
#[command(name = "awsresq", version = VERSION)]
struct Args {
    /// Comma separated regions, or "all" (default: every known region)
    #[arg(long)]
    region: Option<String>,

    /// AWS service to query, e.g. ecs, iam, lambda
    #[arg(long, required_unless_present = "list")]
    service: Option<String>,

    /// Resource type within the service, e.g. cluster, role, function
    #[arg(long, required_unless_present = "list")]
    resource: Option<String>,

    /// Per-query deadline in seconds, replacing the service default
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// What to do when one region fails
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// Settings file (default: the per-user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the supported services and resources, then exit
    #[arg(long)]
    list: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn crate_level(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_logging(verbose: u8, configured: Option<&str>) -> anyhow::Result<()> {
    // RUST_LOG replaces the whole directive set
    let directives = match std::env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => format!("awsresq={},{}", crate_level(verbose, configured), DEPENDENCY_FILTER),
    };

    let filter = tracing_subscriber::EnvFilter::builder()
        .parse(&directives)
        .with_context(|| format!("invalid log filter '{}'", directives))?;

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    // Bridge log crate events from dependencies to tracing
    tracing_log::LogTracer::init().context("failed to initialize log-to-tracing bridge")?;

    Ok(())
}

/// Process status for a rejected command line: 0 for help and version, 1 otherwise
fn usage_exit_status(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn print_supported() {
    for entry in ServiceRegistry::new().entries() {
        println!("{}: {}", entry.name, entry.resources.join(", "));
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = Settings::load(args.config.as_deref())?;
    init_logging(args.verbose, settings.log_level.as_deref())?;
    match args.config.as_deref() {
        Some(path) => trace_debug!("settings from {}: {:?}", path.display(), settings),
        None => trace_debug!("settings: {:?}", settings),
    }

    if args.list {
        print_supported();
        return Ok(());
    }

    let service = args.service.context("--service is required")?;
    let resource = args.resource.context("--resource is required")?;

    let overrides = Overrides {
        region: args.region,
        timeout_secs: args.timeout,
        failure_policy: args.failure_policy,
    };
    let config = ClientConfig::resolve(service.as_str(), &overrides, &settings);

    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;

    let client = AwsresqClient::new(&config, &sdk_config)?;

    if !client.validate(&resource) {
        return Err(QueryError::UnsupportedResource {
            service: client.service().to_string(),
            resource,
        }
        .into());
    }

    trace_info!(
        "querying {} {} in {} region(s)",
        service,
        resource,
        client.regions().len()
    );
    let json = client.search(&service, &resource).await?;
    println!("{}", json);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(&e));
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            trace_error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(crate_level(0, None), "warn");
        assert_eq!(crate_level(0, Some("debug")), "debug");
        assert_eq!(crate_level(1, Some("error")), "info");
        assert_eq!(crate_level(2, None), "debug");
        assert_eq!(crate_level(5, None), "trace");
    }

    #[test]
    fn test_list_needs_no_service() {
        let args = Args::try_parse_from(["awsresq", "--list"]).unwrap();
        assert!(args.list);
        assert!(args.service.is_none());
    }

    #[test]
    fn test_service_required_without_list() {
        let err = Args::try_parse_from(["awsresq", "--resource", "cluster"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(usage_exit_status(&err), 1);
    }

    #[test]
    fn test_bad_flag_values_exit_one() {
        for argv in [
            vec!["awsresq", "--service", "ecs", "--resource", "cluster", "--failure-policy", "retry"],
            vec!["awsresq", "--service", "ecs", "--resource", "cluster", "--timeout", "soon"],
            vec!["awsresq", "--list", "--color"],
        ] {
            let err = Args::try_parse_from(argv.clone()).unwrap_err();
            assert_eq!(usage_exit_status(&err), 1, "{argv:?}");
        }
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        for flag in ["--help", "--version"] {
            let err = Args::try_parse_from(["awsresq", flag]).unwrap_err();
            assert_eq!(usage_exit_status(&err), 0, "{flag}");
        }
    }

    #[test]
    fn test_full_argument_set() {
        let args = Args::try_parse_from([
            "awsresq",
            "--region",
            "us-east-1,eu-west-1",
            "--service",
            "ecs",
            "--resource",
            "cluster",
            "--timeout",
            "7",
            "--failure-policy",
            "wait-for-deadline",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.region.as_deref(), Some("us-east-1,eu-west-1"));
        assert_eq!(args.timeout, Some(7));
        assert_eq!(args.failure_policy, Some(FailurePolicy::WaitForDeadline));
        assert_eq!(args.verbose, 2);
    }
}
