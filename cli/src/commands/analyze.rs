// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot analysis command
//!
//! Runs a synthetic insight through the configured analysis path and prints
//! the result as JSON. With `--heal` the recommendations are executed too.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use selfheal_core::application::HealingRuntime;
use selfheal_core::domain::config::ServiceConfigManifest;
use selfheal_core::domain::insight::{ErrorInsight, Severity};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Error type of the synthetic insight (e.g. VALIDATION_ERROR)
    #[arg(long)]
    pub error_type: String,

    /// Error message of the synthetic insight
    #[arg(long)]
    pub message: String,

    /// Severity (LOW, MEDIUM, HIGH, CRITICAL)
    #[arg(long, default_value = "MEDIUM")]
    pub severity: String,

    /// Execute the automated recommendations after analysis
    #[arg(long)]
    pub heal: bool,
}

pub async fn run(args: AnalyzeArgs, config: ServiceConfigManifest) -> Result<()> {
    let severity: Severity = args
        .severity
        .parse()
        .with_context(|| format!("Invalid --severity '{}'", args.severity))?;

    let runtime = HealingRuntime::from_config(&config);
    let insight = ErrorInsight::synthetic(&args.error_type, &args.message, severity);

    let cancel = CancellationToken::new();
    let guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling analysis");
            guard.cancel();
        }
    });

    let analysis = runtime
        .analysis
        .analyze_with_cancellation(vec![insight], runtime.system_context(), &cancel)
        .await;

    let summary = format!(
        "✓ Analysis {} ({} recommendations, confidence {:.2})",
        analysis.source.as_str(),
        analysis.recommendations.len(),
        analysis.confidence
    );

    let output = if args.heal {
        let executions = runtime
            .healing
            .execute_with_cancellation(&analysis.recommendations, &cancel)
            .await;
        serde_json::json!({ "analysis": analysis, "executions": executions })
    } else {
        serde_json::to_value(&analysis).context("Failed to serialize analysis")?
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to render analysis")?
    );
    eprintln!("{}", summary.green());

    Ok(())
}
