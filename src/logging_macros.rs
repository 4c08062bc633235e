#![warn(clippy::all, rust_2018_idioms)]

/// Tracing macros with `[file:module:line]` context
///
/// Every message written by the query engine goes to standard error through
/// the `tracing` subscriber installed in `main`, so standard output only ever
/// carries the JSON document.
#[macro_export]
macro_rules! trace_trace {
    ($($arg:tt)*) => {
        tracing::trace!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_info {
    ($($arg:tt)*) => {
        tracing::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_warn {
    ($($arg:tt)*) => {
        tracing::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_error {
    ($($arg:tt)*) => {
        tracing::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/*
Log level guidelines for the query engine:

TRACE: individual records converted from SDK types, describe calls per identifier
DEBUG: client cache hits/misses, region task start/finish, settings resolution
INFO:  query start and completion summaries (service, resource, region count, record count)
WARN:  fallbacks (missing default settings file is NOT a warning, it is normal)
ERROR: failed AWS calls for a region, unsupported resources, deadline expiry

Per-region failures always carry service, resource and region so a partial
outage can be traced back from the single line on stderr.

Example output:
  [src/app/query/engine.rs:awsresq::app::query::engine:212] ecs/task-definition failed in eu-west-1 (throttled): ...
*/
