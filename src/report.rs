//! Output formatting for scan results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;

use crate::analyzer::ScanReport;

/// Write the full report as JSON to stdout.
pub fn write_json(report: &ScanReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Write a human-readable summary to stdout.
pub fn write_pretty(path: &str, report: &ScanReport) {
    let summary = &report.summary;
    let context = &report.context;

    println!();
    println!("{} {}", "Scanned".bold(), path.cyan());
    println!();

    println!(
        "  {} files in {} ms ({} unsupported, {} failed)",
        summary.scanned.to_string().bold(),
        summary.duration_ms,
        summary.unsupported,
        summary.failed
    );
    if summary.cancelled {
        println!("  {}", "scan cancelled before completion".yellow());
    }
    if summary.truncated {
        println!("  {}", "file cap reached, results are partial".yellow());
    }
    println!();

    if !context.files_per_language.is_empty() {
        println!("{}", "Languages".bold());
        for (language, count) in &context.files_per_language {
            println!("  {:<12} {}", language, count);
        }
        println!();
    }

    println!("{}", "Symbols".bold());
    println!("  {:<12} {}", "imports", context.total_imports);
    println!("  {:<12} {}", "exports", context.total_exports);
    println!("  {:<12} {}", "functions", context.total_functions);
    println!();

    if !context.frameworks.is_empty() {
        println!("{}", "Frameworks".bold());
        for framework in &context.frameworks {
            let confidence = format!("{:.0}%", framework.confidence * 100.0);
            let confidence = if framework.confidence >= 0.8 {
                confidence.green()
            } else {
                confidence.yellow()
            };
            println!(
                "  {:<16} {} ({} signals)",
                framework.name,
                confidence,
                framework.evidence.len()
            );
        }
        println!();
    }

    if !context.dependencies.is_empty() {
        println!(
            "{} {} declared",
            "Dependencies".bold(),
            context.dependencies.len()
        );
        println!();
    }

    let total_lookups = summary.cache_hits + summary.cache_misses;
    if total_lookups > 0 {
        println!(
            "{} {}/{} hits",
            "Cache".bold(),
            summary.cache_hits,
            total_lookups
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;
    use crate::analyzer::ScanSummary;

    #[test]
    fn test_json_serializes_summary_and_files() {
        let report = ScanReport {
            context: Aggregator::new().finish(&[]),
            summary: ScanSummary::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"scanned\":0"));
        assert!(json.contains("\"files\":[]"));
    }
}
