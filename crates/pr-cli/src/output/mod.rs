//! Output formatting for the terminal
//!
//! Tables are rendered with `tabled`, structured output with `serde_json`
//! and `serde_yaml`. Status lines are coloured with `crossterm`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;
use tabled::settings::object::Columns;
use tabled::settings::{Disable, Style};
use tabled::{Table, Tabled};

use pr_core::{Group, PolicyReportResult, Scope, Target};

/// Message printed when a query finds nothing
pub const NO_RESULTS: &str = "No results found";

/// Message printed when no targets are configured
pub const NO_TARGETS: &str = "No targets are configured";

/// Output format selected with `-o`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Wide,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Wide => "wide",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "table" => Ok(OutputFormat::Table),
            "wide" => Ok(OutputFormat::Wide),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!(
                "unknown output format '{}' (expected table, wide, json or yaml)",
                other
            )),
        }
    }
}

/// Serialize a value as JSON or YAML
pub fn format_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to encode YAML"),
        _ => serde_json::to_string_pretty(value).context("Failed to encode JSON"),
    }
}

/// Format the configured targets
pub fn format_targets(targets: &[Target], format: OutputFormat) -> Result<String> {
    if targets.is_empty() {
        return Ok(NO_TARGETS.to_string());
    }
    if format.is_structured() {
        return format_structured(targets, format);
    }

    #[derive(Tabled)]
    struct TargetRow {
        #[tabled(rename = "TARGET")]
        name: String,
        #[tabled(rename = "MINIMUM PRIORITY")]
        minimum_priority: String,
        #[tabled(rename = "SKIP EXISTING ON STARTUP")]
        skip_existing: bool,
        #[tabled(rename = "SOURCES")]
        sources: String,
    }

    let rows: Vec<TargetRow> = targets
        .iter()
        .map(|t| TargetRow {
            name: t.name.clone(),
            minimum_priority: or_dash(&t.minimum_priority),
            skip_existing: t.skip_existing_on_startup,
            sources: if t.sources.is_empty() {
                "-".to_string()
            } else {
                t.sources.join(", ")
            },
        })
        .collect();

    Ok(Table::new(rows).with(Style::rounded()).to_string())
}

/// Format grouped results
///
/// Group labels are only printed when there is more than one group.
pub fn format_groups(groups: &[Group], scope: Scope, format: OutputFormat) -> Result<String> {
    if groups.iter().all(|g| g.results.is_empty()) {
        return Ok(NO_RESULTS.to_string());
    }
    if format.is_structured() {
        return format_structured(groups, format);
    }

    let wide = format == OutputFormat::Wide;
    let mut output = String::new();

    for group in groups {
        if !group.label.is_empty() && groups.len() > 1 {
            output.push('\n');
            output.push_str(&bold(&group.label));
            output.push_str("\n\n");
        }
        output.push_str(&format_results(&group.results, scope, wide));
        output.push('\n');
    }

    Ok(output.trim_end().to_string())
}

/// Table of results, without the namespace column for cluster results
pub fn format_results(results: &[PolicyReportResult], scope: Scope, wide: bool) -> String {
    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "NAMESPACE")]
        namespace: String,
        #[tabled(rename = "KIND")]
        kind: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "POLICY")]
        policy: String,
        #[tabled(rename = "RULE")]
        rule: String,
        #[tabled(rename = "SEVERITY")]
        severity: String,
        #[tabled(rename = "RESULT")]
        status: String,
    }

    let rows: Vec<ResultRow> = results
        .iter()
        .map(|r| ResultRow {
            namespace: r.namespace.clone(),
            kind: r.kind.clone(),
            name: r.name.clone(),
            policy: r.policy.clone(),
            rule: r.rule.clone(),
            severity: or_dash(&r.severity),
            status: r.status.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    // Columns: NAMESPACE, KIND, NAME, POLICY, RULE, SEVERITY, RESULT
    if !wide {
        table.with(Disable::column(Columns::single(5)));
    }
    if scope == Scope::Cluster {
        table.with(Disable::column(Columns::single(0)));
    }

    table.to_string()
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn bold(text: &str) -> String {
    use crossterm::style::Stylize;

    text.bold().to_string()
}

/// Print an error message in red with an X prefix to stderr
pub fn print_error(msg: &str) {
    print_styled(true, crossterm::style::Color::Red, "✗ ", msg);
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    print_styled(true, crossterm::style::Color::Yellow, "⚠ ", msg);
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    print_styled(false, crossterm::style::Color::Cyan, "ℹ ", msg);
}

fn print_styled(to_stderr: bool, color: crossterm::style::Color, prefix: &str, msg: &str) {
    use crossterm::style::{Print, ResetColor, SetForegroundColor};
    use std::io::Write;

    let mut out: Box<dyn Write> = if to_stderr {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };

    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(prefix),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
