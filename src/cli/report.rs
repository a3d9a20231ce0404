use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::catalog::store::CatalogHeader;
use crate::cli::OutputFormat;
use crate::core::entry::TRANSLATION_TAG;
use crate::core::outcome::{ResolutionOutcome, RunReport};
use crate::matching::search::ScoredEntry;

/// Run metadata for the JSON report
pub struct RunSummary<'a> {
    pub set_id: &'a str,
    pub header: &'a CatalogHeader,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Files and URL involved in one entry, as far as the run determined them
pub struct EntryPaths {
    pub patch_file: PathBuf,
    /// Set when the patch was not on disk before the run
    pub patch_url: Option<String>,
    /// `None` in download-only runs
    pub out_file: Option<PathBuf>,
}

impl EntryPaths {
    /// Output actually written, falling back to the computed one
    fn out_file<'a>(&'a self, outcome: &'a ResolutionOutcome) -> Option<&'a PathBuf> {
        match outcome {
            ResolutionOutcome::PatchedOk { output } => Some(output),
            _ => self.out_file.as_ref(),
        }
    }
}

fn field(key: &str, value: impl std::fmt::Display) -> String {
    format!(" {key:20} : {value}")
}

/// Catalog header fields in display order
fn header_fields(header: &CatalogHeader) -> Vec<(String, String)> {
    let mut fields = vec![("name".to_string(), header.name.clone())];
    if let Some(ext) = &header.file_extension {
        fields.push(("fileextension".to_string(), ext.clone()));
    }
    for (key, value) in &header.extra {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        fields.push((key.clone(), text));
    }
    fields
}

fn header_lines(header: &CatalogHeader) -> Vec<String> {
    let mut lines = vec!["[=== ROM Set ===]".to_string()];
    lines.extend(
        header_fields(header)
            .iter()
            .map(|(key, value)| field(key, value)),
    );
    lines
}

fn entry_lines(
    scored: &ScoredEntry<'_>,
    outcome: &ResolutionOutcome,
    paths: &EntryPaths,
    search_active: bool,
) -> Vec<String> {
    let entry = scored.entry;
    let mut lines = vec![format!("[--- {} ---]", entry.name)];
    if search_active {
        lines.push(field("search_confidence", format!("{}%", scored.score)));
    }
    lines.push(field("patch_version", &entry.version));
    lines.push(field("patch_author", &entry.author));
    lines.push(field("patch_genre", TRANSLATION_TAG));
    lines.push(field("patch_type", &entry.patch_format));
    if let Some(url) = &paths.patch_url {
        lines.push(field("patch_url", url));
    }
    lines.push(field("patch_file", paths.patch_file.display()));
    if let Some(out_file) = paths.out_file(outcome) {
        lines.push(field("out_file", out_file.display()));
    }
    lines.push(field("result", outcome.describe()));
    lines
}

fn error_lines(report: &RunReport) -> Vec<String> {
    if !report.has_failures() {
        return Vec::new();
    }
    let mut lines = vec!["[=== Errors ===]".to_string()];
    for failure in &report.failures {
        lines.push(format!(" {}:", failure.name));
        lines.push(format!("  {}", failure.error));
    }
    lines
}

pub fn print_header(header: &CatalogHeader) {
    for line in header_lines(header) {
        println!("{line}");
    }
}

pub fn print_entry(
    scored: &ScoredEntry<'_>,
    outcome: &ResolutionOutcome,
    paths: &EntryPaths,
    search_active: bool,
) {
    for line in entry_lines(scored, outcome, paths, search_active) {
        println!("{line}");
    }
}

pub fn print_errors(report: &RunReport) {
    for line in error_lines(report) {
        println!("{line}");
    }
}

/// Tell the user how to narrow a search that matched nothing well
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_suggestions(
    query: &str,
    best_score: u8,
    suggestions: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!();
            println!("please be more specific with --search. here are some suggestions:");
            for name in suggestions {
                println!(" - {name}");
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "search": {
                    "query": query,
                    "best_score": best_score,
                    "too_vague": true,
                    "suggestions": suggestions,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// JSON object describing one processed entry
pub fn entry_json(
    scored: &ScoredEntry<'_>,
    outcome: &ResolutionOutcome,
    paths: &EntryPaths,
) -> serde_json::Value {
    let entry = scored.entry;
    let mut json = serde_json::json!({
        "name": entry.name,
        "search_confidence": scored.score,
        "patch_version": entry.version,
        "patch_author": entry.author,
        "patch_genre": TRANSLATION_TAG,
        "patch_type": entry.patch_format,
        "patch_file": paths.patch_file.display().to_string(),
        "result": outcome.describe(),
    });
    if let Some(url) = &paths.patch_url {
        json["patch_url"] = url.as_str().into();
    }
    if let Some(out_file) = paths.out_file(outcome) {
        json["out_file"] = out_file.display().to_string().into();
    }

    match outcome {
        ResolutionOutcome::PatchedOk { .. } => {
            json["status"] = "patched".into();
        }
        ResolutionOutcome::DownloadedOk { .. } => {
            json["status"] = "downloaded".into();
        }
        ResolutionOutcome::Failed(error) => {
            json["status"] = "failed".into();
            json["error_kind"] = serde_json::json!(error.kind());
        }
    }

    json
}

/// Print the whole run as one JSON document
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_json_report(
    summary: &RunSummary<'_>,
    entries: Vec<serde_json::Value>,
    report: &RunReport,
) -> anyhow::Result<()> {
    let output = run_json(summary, entries, report);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_json(
    summary: &RunSummary<'_>,
    entries: Vec<serde_json::Value>,
    report: &RunReport,
) -> serde_json::Value {
    let errors: Vec<serde_json::Value> = report
        .failures
        .iter()
        .map(|failure| {
            serde_json::json!({
                "name": failure.name,
                "kind": failure.error.kind(),
                "message": failure.error.to_string(),
            })
        })
        .collect();

    serde_json::json!({
        "set": {
            "id": summary.set_id,
            "header": summary.header,
        },
        "started_at": summary.started_at.to_rfc3339(),
        "finished_at": summary.finished_at.to_rfc3339(),
        "entries": entries,
        "summary": {
            "attempted": report.attempted,
            "patched": report.patched,
            "downloaded": report.downloaded,
            "failed": report.failures.len(),
            "halted": report.halted,
        },
        "errors": errors,
    })
}
