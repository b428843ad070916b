use std::{
    io::{self, Write},
    process,
    sync::{Arc, Mutex, PoisonError},
};

use pagepurge::{
    cache::{
        CacheStore, DrainReport, FlushConfig, FlushEngine, StoreError, StoreRegistry,
        VariantExpander,
    },
    config::{self, Command},
    infra::{error::InfraError, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "pagepurge failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "pagepurge failed");
    });
}

fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    if let Command::Variants = cli_args.command {
        return print_variants(&settings.flush);
    }

    let store = Arc::new(DryRunStore::default());
    let engine = FlushEngine::new(settings.flush, StoreRegistry::new(store.clone()));
    let mut session = engine.begin();

    match cli_args.command {
        Command::Url(args) => {
            for url in &args.urls {
                match args.group.as_ref() {
                    Some(group) => session.enqueue_flush_url_in_group(url, Some(group.clone())),
                    None => session.enqueue_flush_url(url),
                };
            }
        }
        Command::Group(args) => {
            for group in args.groups {
                session.enqueue_flush_group(group);
            }
        }
        Command::All => session.enqueue_flush_all(),
        Command::Variants => {}
    }

    let report = session.drain();
    info!(count = report.count, calls = store.len(), "Dry run complete");
    print_json(&DryRunOutput::new(&report, store.take()))?;

    if report.partial_failure {
        return Err(InfraError::PartialFailure {
            failures: report.failures.len(),
        });
    }
    Ok(())
}

fn print_variants(flush: &FlushConfig) -> Result<(), InfraError> {
    let expander = VariantExpander::from_config(flush);
    let dimensions = expander
        .dimensions()
        .iter()
        .map(|dimension| DimensionOutput {
            name: dimension.dimension().name(),
            values: dimension.values().to_vec(),
        })
        .collect();
    let variants = expander.expand().iter().map(ToString::to_string).collect();

    print_json(&VariantsOutput {
        cardinality: expander.cardinality(),
        dimensions,
        variants,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InfraError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// A backend call the dry-run store would have made.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BackendCall {
    Delete { group: String, key: String },
    Flush { group: String },
}

/// Store that records calls instead of evicting anything.
#[derive(Debug, Default)]
struct DryRunStore {
    calls: Mutex<Vec<BackendCall>>,
}

impl DryRunStore {
    fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn len(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn take(&self) -> Vec<BackendCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CacheStore for DryRunStore {
    fn delete(&self, key: &str, group: &str) -> Result<bool, StoreError> {
        self.record(BackendCall::Delete {
            group: group.to_string(),
            key: key.to_string(),
        });
        Ok(false)
    }

    fn flush(&self, group: &str) -> Result<bool, StoreError> {
        self.record(BackendCall::Flush {
            group: group.to_string(),
        });
        Ok(false)
    }
}

#[derive(Debug, Serialize)]
struct DryRunOutput {
    count: usize,
    partial_failure: bool,
    keys_deleted: usize,
    groups_flushed: usize,
    calls: Vec<BackendCall>,
}

impl DryRunOutput {
    fn new(report: &DrainReport, calls: Vec<BackendCall>) -> Self {
        Self {
            count: report.count,
            partial_failure: report.partial_failure,
            keys_deleted: report.keys_deleted,
            groups_flushed: report.groups_flushed,
            calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct DimensionOutput {
    name: &'static str,
    values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VariantsOutput {
    cardinality: usize,
    dimensions: Vec<DimensionOutput>,
    variants: Vec<String>,
}
