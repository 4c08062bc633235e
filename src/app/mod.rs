//! Core modules for awsresq.
//!
//! # Module Organization
//!
//! ## Query Engine
//! - [`query`] - fan-out engine, region client cache, aggregated results, errors
//! - [`client`] - service registry and the caller-facing facade
//!
//! ## AWS Integration
//! - [`aws_services`] - per-service adapters over the AWS SDK
//! - [`regions`] - region specifier parsing and the built-in region list
//! - [`global_services`] - services answered from a single region
//! - [`sdk_errors`] - classification of AWS SDK failures for logs
//!
//! ## Configuration
//! - [`config`] - client configuration and the optional settings file

pub mod aws_services;
pub mod client;
pub mod config;
pub mod global_services;
pub mod query;
pub mod regions;
pub mod sdk_errors;
