//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Placeholder for a value the router did not provide.
pub fn unavailable(color: bool) -> String {
    if color {
        "unavailable".dimmed().to_string()
    } else {
        "unavailable".into()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: `to_row` builds one `Tabled` row per item
/// - `json` / `json-compact` / `yaml`: serializes the items as-is
/// - `plain`: `line_fn` emits one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(line_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single item. Table and plain both use `text_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    text_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(text_fn(data)),
        structured => render_structured(structured, data),
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

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?.trim_end().to_owned(),
        _ => serde_json::to_string_pretty(data)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        key: &'static str,
        value: u32,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Key")]
        key: &'static str,
    }

    fn items() -> Vec<Item> {
        vec![Item { key: "rsrp", value: 1 }, Item { key: "sinr", value: 2 }]
    }

    #[test]
    fn plain_emits_one_line_per_item() {
        let out = render_list(
            OutputFormat::Plain,
            &items(),
            |i| Row { key: i.key },
            |i| format!("{}={}", i.key, i.value),
        )
        .unwrap();
        assert_eq!(out, "rsrp=1\nsinr=2");
    }

    #[test]
    fn table_has_header_and_rows() {
        let out = render_list(OutputFormat::Table, &items(), |i| Row { key: i.key }, |_| String::new())
            .unwrap();
        assert!(out.contains("Key"));
        assert!(out.contains("sinr"));
    }

    #[test]
    fn structured_formats_serialize_the_data() {
        let compact = render_single(OutputFormat::JsonCompact, &items()[0], |_| String::new()).unwrap();
        assert_eq!(compact, r#"{"key":"rsrp","value":1}"#);

        let yaml = render_single(OutputFormat::Yaml, &items()[0], |_| String::new()).unwrap();
        assert_eq!(yaml, "key: rsrp\nvalue: 1");
    }
}
