//! CLI `doctor` command: check seed data and configuration, print a report.

use anyhow::Result;
use std::path::Path;

use sift::config::SiftConfig;

/// Inspect seed files and configuration and print a health report.
pub fn doctor(config: &SiftConfig) -> Result<()> {
    println!("Sift Health Report");
    println!("==================");
    println!();

    let docs_path = config.resolved_docs_path();
    let graph_path = config.resolved_graph_path();

    println!("Document seed:     {}", describe_seed(&docs_path));
    println!("Graph seed:        {}", describe_seed(&graph_path));
    println!(
        "Fallback dataset:  {}",
        if config.retrieval.fallback_enabled {
            "enabled (missing seeds degrade, not fail)"
        } else {
            "disabled (missing seeds fail retrieval)"
        }
    );
    println!();
    println!(
        "Generation:        {}",
        if config.synthesis.gemini_api_key.is_empty() {
            "extractive only (no API key configured)"
        } else {
            "Gemini enabled"
        }
    );
    println!(
        "Thresholds:        refine<{:.2}  high>={:.2}  medium>={:.2}",
        config.scoring.confidence_threshold,
        config.scoring.high_threshold,
        config.scoring.medium_threshold
    );
    println!(
        "Retrieval limits:  initial={} cap={} merged<={} branch_timeout={}ms",
        config.retrieval.initial_limit,
        config.retrieval.limit_cap,
        config.retrieval.max_merged_results,
        config.retrieval.branch_timeout_ms
    );

    Ok(())
}

/// `<path>: 12 entries` / `not found` / `INVALID (...)`.
fn describe_seed(path: &Path) -> String {
    if !path.exists() {
        return format!("{} (not found)", path.display());
    }
    match std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|contents| {
            serde_json::from_str::<Vec<serde_json::Value>>(&contents).map_err(|e| e.to_string())
        }) {
        Ok(entries) => format!("{} ({} entries)", path.display(), entries.len()),
        Err(e) => format!("{} INVALID ({e})", path.display()),
    }
}
