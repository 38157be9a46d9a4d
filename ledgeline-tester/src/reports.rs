use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::checks::SeedReport;

pub fn generate_console_report(
    out: &mut dyn Write,
    reports: &[SeedReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Generation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total = reports.len();
    let passed = reports.iter().filter(|r| r.passed).count();
    writeln!(out, "Seeds: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for report in reports {
        let status = if report.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} seed {}", status, report.seed.to_string().bold())?;
        writeln!(
            out,
            "   Width: {}/{} ({} chunks{})",
            report.width,
            report.target_width,
            report.chunks,
            if report.done { ", done" } else { "" }
        )?;
        writeln!(
            out,
            "   Platforms: {}  Spawned: {}  Karma good/bad: {}/{}",
            report.platforms, report.spawned, report.good_karma, report.bad_karma
        )?;
        writeln!(out, "   Fingerprint: {}", report.fingerprint)?;
        writeln!(
            out,
            "   RNG draws layout/karma: {}/{}",
            report.layout_draws, report.karma_draws
        )?;
        let mix: Vec<String> = report
            .customizers
            .iter()
            .map(|(name, count)| format!("{name}×{count}"))
            .collect();
        writeln!(out, "   Customizers: {}", mix.join(", "))?;
        writeln!(out, "   Time: {:?}", report.duration)?;
        if !report.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &report.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, reports: &[SeedReport]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, reports: &[SeedReport]) -> Result<()> {
    writeln!(out, "# Ledgeline Generation Results\n")?;
    let passed = reports.iter().filter(|r| r.passed).count();
    writeln!(out, "- **Seeds**: {}", reports.len())?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}\n", reports.len() - passed)?;

    writeln!(
        out,
        "| Seed | Status | Width | Chunks | Platforms | Spawned | Fingerprint |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for report in reports {
        let status = if report.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | `{}` |",
            report.seed,
            status,
            report.width,
            report.chunks,
            report.platforms,
            report.spawned,
            report.fingerprint
        )?;
    }
    for report in reports.iter().filter(|r| !r.failures.is_empty()) {
        writeln!(out, "\n### Seed {} failures\n", report.seed)?;
        for failure in &report.failures {
            writeln!(out, "- {failure}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample(passed: bool) -> SeedReport {
        SeedReport {
            seed: 42,
            passed,
            target_width: 100,
            width: 104,
            done: false,
            chunks: 12,
            platforms: 3,
            spawned: 9,
            good_karma: 4,
            bad_karma: 80,
            fingerprint: "00000000deadbeef".into(),
            layout_draws: 120,
            karma_draws: 35,
            deterministic: passed,
            customizers: BTreeMap::from([("Extrude".to_string(), 7), ("Fork".to_string(), 5)]),
            failures: if passed {
                Vec::new()
            } else {
                vec!["replay with the same seed diverged".into()]
            },
            duration: Duration::from_millis(3),
        }
    }

    #[test]
    fn json_report_round_trips_fields() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &[sample(true)]).expect("json");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("parse");
        assert_eq!(value[0]["seed"], 42);
        assert_eq!(value[0]["customizers"]["Fork"], 5);
        assert!(value[0].get("duration").is_none());
    }

    #[test]
    fn markdown_lists_failures() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &[sample(true), sample(false)]).expect("markdown");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("### Seed 42 failures"));
        assert!(text.contains("`00000000deadbeef`"));
    }

    #[test]
    fn console_report_mentions_each_seed() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &[sample(false)], Duration::from_secs(1))
            .expect("console");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("FAIL seed 42"));
        assert!(text.contains("Extrude×7, Fork×5"));
        assert!(text.contains("RNG draws layout/karma: 120/35"));
    }
}
