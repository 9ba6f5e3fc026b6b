//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use shopkeep_core::{FeedbackMessage, Severity};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ───────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Format a feedback banner for stderr: green check for info, red cross
/// for errors.
pub fn feedback_line(message: &FeedbackMessage, color: bool) -> String {
    let text = message.text.as_str();
    let mark = if message.is_error() { "✗" } else { "✓" };
    if !color {
        return format!("{mark} {text}");
    }
    match message.severity {
        Severity::Info => format!("{} {text}", mark.green().bold()),
        Severity::Error => format!("{} {}", mark.red().bold(), text.red()),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: maps each item through `to_row`, or prints `empty` when
///   there is nothing to show
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    empty: &str,
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table if data.is_empty() => empty.to_owned(),
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. Table mode uses `detail_fn` for a key/value view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: String,
        name: String,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: "a1".into(),
                name: "Hammer".into(),
            },
            Item {
                id: "b2".into(),
                name: "Nail".into(),
            },
        ]
    }

    fn render(format: &OutputFormat, data: &[Item]) -> String {
        render_list(
            format,
            data,
            "nothing here",
            |i| ItemRow {
                name: i.name.clone(),
            },
            |i| i.id.clone(),
        )
    }

    #[test]
    fn table_lists_rows_in_order() {
        let out = render(&OutputFormat::Table, &items());
        let hammer = out.find("Hammer");
        let nail = out.find("Nail");
        assert!(hammer.is_some() && nail.is_some());
        assert!(hammer < nail);
    }

    #[test]
    fn empty_table_prints_placeholder() {
        assert_eq!(render(&OutputFormat::Table, &[]), "nothing here");
        assert_eq!(render(&OutputFormat::Json, &[]), "[]");
    }

    #[test]
    fn plain_emits_ids() {
        assert_eq!(render(&OutputFormat::Plain, &items()), "a1\nb2");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render(&OutputFormat::JsonCompact, &items());
        assert!(!out.contains('\n'));
        assert!(out.contains("\"Hammer\""));
    }
}
