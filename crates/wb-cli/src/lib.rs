use std::ffi::OsString;
use std::fs;

use clap::Parser;
use tracing::{info, warn};
use wb_core::BindError;
use wb_resolver::{
    resolve_location, DepthLimitPolicy, ExportPolicy, LocalFetcher, ResolvedService,
    ResolverSettings, UnresolvedPolicy,
};

mod cli_args;
mod error_map;
mod logging;
mod source_scan;

pub(crate) use cli_args::{Cli, Mode, ResolveArgs, ScanArgs, SettingsArgs};
pub(crate) use error_map::{
    emit_error, map_config_read, map_output_write, map_source_path, map_source_scan,
};
pub(crate) use logging::init_logging;
pub(crate) use source_scan::{collect_documents, resolve_source_dir};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return error.exit_code(),
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, BindError> {
    match cli.command {
        Mode::Resolve(args) => run_resolve(args),
        Mode::Scan(args) => run_scan(args),
    }
}

fn build_settings(args: &SettingsArgs) -> Result<ResolverSettings, BindError> {
    let mut settings = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|error| map_config_read(path, error))?;
            ResolverSettings::from_json_str(&raw)?
        }
        None => ResolverSettings::default(),
    };

    if let Some(package_base) = &args.package_base {
        settings.package_base = package_base.clone();
    }
    if args.insecure {
        settings.transport.insecure_skip_verify = true;
    }
    if let Some(timeout) = args.dial_timeout_secs {
        settings.transport.dial_timeout_secs = timeout;
    }
    if args.preserve_case {
        settings.export_policy = ExportPolicy::PreserveCase;
    }
    if let Some(max_depth) = args.max_depth {
        settings.max_depth = max_depth;
    }
    if args.truncate_depth {
        settings.depth_limit_policy = DepthLimitPolicy::Truncate;
    }
    if args.strict {
        settings.unresolved_policy = UnresolvedPolicy::Error;
    }

    settings.validate()?;
    Ok(settings)
}

fn run_resolve(args: ResolveArgs) -> Result<i32, BindError> {
    let settings = build_settings(&args.settings)?;
    let fetcher = LocalFetcher::new(settings.transport.clone());
    let summary = resolve_location(&args.location, &fetcher, &settings)?.summary()?;

    if let Some(out) = &args.out {
        let payload = serde_json::to_string_pretty(&summary)
            .map_err(|error| map_output_write(out, error))?;
        fs::write(out, payload).map_err(|error| map_output_write(out, error))?;
        info!(out = %out, "summary written");
    }

    emit_summary(&summary, args.out.as_deref());
    Ok(0)
}

fn run_scan(args: ScanArgs) -> Result<i32, BindError> {
    let settings = build_settings(&args.settings)?;
    let root = resolve_source_dir(&args.dir)?;
    let documents = collect_documents(&root)?;
    let fetcher = LocalFetcher::new(settings.transport.clone());

    let mut failures = 0;
    for document in &documents {
        let location = root.join(document);
        let result = resolve_location(&location.to_string_lossy(), &fetcher, &settings)
            .and_then(|resolution| resolution.summary());
        match result {
            Ok(summary) => println!(
                "DOCUMENT_OK:{}|{}|{}|{}",
                document,
                summary.namespaces.len(),
                summary.messages.bound.len(),
                summary.messages.skipped.len()
            ),
            Err(error) => {
                failures += 1;
                warn!(document = %document, code = error.code(), "document failed");
                println!(
                    "DOCUMENT_ERROR:{}|{}|{}",
                    document,
                    error.code(),
                    serde_json::to_string(&error.to_string()).expect("string json")
                );
            }
        }
    }

    println!("DOCUMENTS:{}", documents.len());
    if failures > 0 {
        println!("FAILURES:{}", failures);
        println!("RESULT:ERROR");
        return Ok(1);
    }
    println!("RESULT:OK");
    Ok(0)
}

fn emit_summary(summary: &ResolvedService, out: Option<&str>) {
    println!("RESULT:OK");
    println!("ROOT:{}", summary.root);
    println!("SCHEMAS:{}", summary.schemas.len());
    for namespace in &summary.namespaces {
        println!(
            "NAMESPACE:{}|{}|{}",
            namespace.namespace, namespace.package, namespace.package_path
        );
    }
    for message in &summary.messages.bound {
        println!("MESSAGE:{}|{}", message.name, message.type_name);
    }
    for skipped in &summary.messages.skipped {
        println!("SKIPPED:{}|{}", skipped.name, skipped.code);
    }
    for operation in &summary.operations {
        println!(
            "OPERATION:{}|{}|{}",
            operation.method_name,
            operation.input.as_deref().unwrap_or("NONE"),
            operation.output.as_deref().unwrap_or("NONE")
        );
    }
    match out {
        Some(out) => println!("OUT:{}", out),
        None => println!(
            "SUMMARY_JSON:{}",
            serde_json::to_string(summary).expect("summary json")
        ),
    }
}
