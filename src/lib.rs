//! awsresq - multi-region AWS resource query engine
//!
//! Lists one kind of AWS resource (ECS clusters, IAM roles, Lambda functions
//! and so on) across many regions at once and returns a single JSON document.
//!
//! # Architecture Overview
//!
//! - **Facade** ([`app::client`]): binds a service name to its engine and renders JSON
//! - **Engine** ([`app::query`]): per-region fan-out, client caching, deadline-bounded collection
//! - **Services** ([`app::aws_services`]): one adapter per AWS service, SDK records to JSON
//! - **Regions** ([`app::regions`], [`app::global_services`]): region specifiers and global-service collapsing
//! - **Configuration** ([`app::config`]): command-line flags layered over an optional TOML file
//!
//! A query looks like this:
//!
//! ```no_run
//! use awsresq::app::client::AwsresqClient;
//! use awsresq::app::config::ClientConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//! let client = AwsresqClient::new(&ClientConfig::new("ecs", "us-east-1,eu-west-1"), &sdk_config)?;
//! let json = client.search("ecs", "cluster").await?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;
