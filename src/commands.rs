//! CLI command implementations

use crate::OracleArgs;
use crate::discover;
use serde::Serialize;
use specsniff_ai::{BatchOutcome, SpecDetector};
use specsniff_core::config::ENV_PROVIDER;
use specsniff_core::{ClassificationRequest, ClassificationResult, DetectorConfig};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct ReportEntry<'a> {
    path: &'a str,
    result: &'a ClassificationResult,
}

pub async fn scan(root: PathBuf, args: OracleArgs) -> anyhow::Result<()> {
    tracing::info!("Scanning: {}", root.display());
    let requests = discover::discover(&root)?;
    classify_and_report(requests, &args).await
}

pub async fn check(files: Vec<PathBuf>, args: OracleArgs) -> anyhow::Result<()> {
    let requests = discover::load_files(&files)?;
    classify_and_report(requests, &args).await
}

/// Environment configuration with command-line overrides applied
fn load_config(args: &OracleArgs) -> anyhow::Result<DetectorConfig> {
    let mut config = DetectorConfig::from_env()?;

    // Re-resolve so the credential matches the overridden provider
    if let Some(provider) = &args.provider {
        config = DetectorConfig::from_lookup(|key| {
            if key == ENV_PROVIDER {
                Some(provider.clone())
            } else {
                std::env::var(key).ok()
            }
        })?;
    }
    if let Some(budget) = args.budget {
        config.daily_budget_usd = budget;
    }
    if let Some(group_size) = args.group_size {
        config.group_size = group_size;
    }

    config.validate()?;
    Ok(config)
}

async fn classify_and_report(
    requests: Vec<ClassificationRequest>,
    args: &OracleArgs,
) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let detector = SpecDetector::from_config(&config)?;

    // Ctrl-C stops new oracle calls; finished work is still reported
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight classifications");
            signal_cancel.cancel();
        }
    });

    let outcome = detector.run_batch(&requests, &cancel).await;

    if args.json {
        print_json(&requests, &outcome)?;
    } else {
        print_text(&requests, &outcome, config.spec_threshold);
    }

    let budget = detector.budget().snapshot();
    tracing::info!(
        "Oracle spend ${:.4} of ${:.2} daily budget ({:?})",
        budget.spent_today_usd,
        budget.daily_ceiling_usd,
        budget.warning_level
    );
    Ok(())
}

fn print_json(requests: &[ClassificationRequest], outcome: &BatchOutcome) -> anyhow::Result<()> {
    let entries: Vec<ReportEntry<'_>> = requests
        .iter()
        .zip(&outcome.results)
        .map(|(request, result)| ReportEntry {
            path: &request.path,
            result,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_text(requests: &[ClassificationRequest], outcome: &BatchOutcome, threshold: u8) {
    for (request, result) in requests.iter().zip(&outcome.results) {
        let marker = if result.is_likely_spec(threshold) { "*" } else { " " };
        let endpoints = result
            .estimated_endpoint_count
            .map(|n| format!(", ~{n} endpoints"))
            .unwrap_or_default();
        println!(
            "{} {} [{} {}/10{}] {}",
            marker, request.path, result.spec_type, result.confidence, endpoints, result.reasoning
        );
    }

    let summary = &outcome.summary;
    println!();
    println!(
        "{} files: {} likely specs, {} cache hits, {} oracle calls, {} failures, {} skipped (budget), {} cancelled",
        summary.total,
        summary.likely_specs,
        summary.cache_hits,
        summary.oracle_calls,
        summary.failures,
        summary.budget_skipped,
        summary.cancelled
    );
}
