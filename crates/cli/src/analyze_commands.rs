//! `plugcheck analyze`: run the engine over plugin directories and report.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    process::ExitCode,
};

use {
    clap::Args,
    plugcheck_compat::{
        CompatibilityResult, FsBundleLoader, Result as CompatResult, Target, Verdict, analyze_dirs,
    },
    plugcheck_config::{OutputFormat, PlugcheckConfig},
    serde::Serialize,
    tracing::warn,
};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Plugin root directories.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Output as JSON (overrides the configured format).
    #[arg(long)]
    json: bool,

    /// Exit non-zero when a plugin reaches this verdict (needs-review, incompatible).
    #[arg(long, value_name = "VERDICT")]
    fail_on: Option<Verdict>,

    /// Only consider these targets (repeatable). Defaults to all.
    #[arg(long = "target", value_name = "TARGET")]
    targets: Vec<Target>,
}

/// One row of the JSON report.
#[derive(Serialize)]
#[serde(untagged)]
enum ReportEntry<'a> {
    Analyzed {
        path: &'a Path,
        #[serde(flatten)]
        result: &'a CompatibilityResult,
    },
    Failed {
        path: &'a Path,
        error: String,
    },
}

pub async fn handle_analyze(args: AnalyzeArgs, config: &PlugcheckConfig) -> anyhow::Result<ExitCode> {
    let loader = FsBundleLoader::new(config.scan.clone());
    let results = analyze_dirs(&loader, &args.paths, config.scan.effective_concurrency()).await;

    for (path, result) in &results {
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "plugin analysis failed");
        }
    }

    let targets = if args.targets.is_empty() {
        Target::ALL.to_vec()
    } else {
        args.targets.clone()
    };

    if args.json || config.output.format == OutputFormat::Json {
        let entries = json_entries(&results);
        let out = if config.output.pretty {
            serde_json::to_string_pretty(&entries)?
        } else {
            serde_json::to_string(&entries)?
        };
        println!("{out}");
    } else {
        print!("{}", render_text(&results, &targets));
    }

    let failed = args
        .fail_on
        .is_some_and(|threshold| should_fail(&results, threshold, &targets));
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn json_entries(results: &[(PathBuf, CompatResult<CompatibilityResult>)]) -> Vec<ReportEntry<'_>> {
    results
        .iter()
        .map(|(path, result)| match result {
            Ok(result) => ReportEntry::Analyzed { path, result },
            Err(e) => ReportEntry::Failed {
                path,
                error: e.to_string(),
            },
        })
        .collect()
}

/// Whether any plugin meets `threshold` on any of `targets`. A plugin that
/// could not be analyzed always counts.
fn should_fail(
    results: &[(PathBuf, CompatResult<CompatibilityResult>)],
    threshold: Verdict,
    targets: &[Target],
) -> bool {
    results.iter().any(|(_, result)| match result {
        Ok(result) => result.worst_for(targets) >= threshold,
        Err(_) => true,
    })
}

fn render_text(
    results: &[(PathBuf, CompatResult<CompatibilityResult>)],
    targets: &[Target],
) -> String {
    let mut out = String::new();
    for (path, result) in results {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                let _ = writeln!(out, "{}: error: {e}\n", path.display());
                continue;
            },
        };

        let version = result
            .version
            .as_deref()
            .map(|v| format!(" {v}"))
            .unwrap_or_default();
        let _ = writeln!(out, "{}{version} ({})", result.plugin, path.display());
        for target in targets {
            let _ = writeln!(out, "  {:<8} {}", target.as_str(), result.verdict(*target));
        }

        let s = &result.summary;
        let _ = writeln!(
            out,
            "  files: {} total, {} skills, {} scripts, {} hook configs, {} mcp configs",
            s.total_files, s.skill_files, s.script_files, s.hook_files, s.mcp_configs
        );

        if result.evidence.is_empty() {
            let _ = writeln!(out, "  no evidence\n");
            continue;
        }
        let _ = writeln!(out, "  evidence:");
        for ev in &result.evidence {
            let _ = writeln!(
                out,
                "    [{}] {} {}: {} ({})",
                ev.source,
                ev.location(),
                ev.signal,
                ev.detail,
                ev.impact
            );
        }
        out.push('\n');
    }
    out
}
