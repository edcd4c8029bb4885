//! Readings command handler and the shared reading views.

use serde::Serialize;
use tabled::Tabled;

use miwifi_core::{Reading, Router};

use crate::cli::{GlobalOpts, ReadingsArgs};
use crate::error::CliError;
use crate::output;

// ── Views ────────────────────────────────────────────────────────────

/// A reading as rendered by `readings` and `watch`.
#[derive(Debug, Serialize)]
pub struct ReadingView {
    #[serde(flatten)]
    pub reading: Reading,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Reading")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct ReadingRowWithId {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Reading")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn display_value(reading: &Reading, color: bool) -> String {
    match (&reading.value, reading.unit) {
        (Some(value), Some(unit)) => format!("{value} {unit}"),
        (Some(value), None) => value.to_string(),
        (None, _) => output::unavailable(color),
    }
}

fn plain_line(view: &ReadingView) -> String {
    let value = view
        .reading
        .value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    format!("{}\t{value}", view.id.as_deref().unwrap_or(view.reading.key))
}

/// Evaluate the requested readings, all of them when `keys` is empty.
pub async fn evaluate(
    router: &Router,
    keys: &[String],
    with_ids: bool,
) -> Result<Vec<ReadingView>, CliError> {
    let readings = if keys.is_empty() {
        router.readings().await
    } else {
        router.readings_for(keys).await?
    };

    Ok(readings
        .into_iter()
        .map(|reading| ReadingView {
            id: with_ids.then(|| router.unique_id(reading.key)),
            reading,
        })
        .collect())
}

/// Render reading views in the selected format.
pub fn render(views: &[ReadingView], global: &GlobalOpts) -> Result<String, CliError> {
    let color = output::should_color(global.color);
    if views.iter().any(|v| v.id.is_some()) {
        output::render_list(
            global.output,
            views,
            |v| ReadingRowWithId {
                id: v.id.clone().unwrap_or_default(),
                label: v.reading.label,
                value: display_value(&v.reading, color),
            },
            plain_line,
        )
    } else {
        output::render_list(
            global.output,
            views,
            |v| ReadingRow {
                key: v.reading.key,
                label: v.reading.label,
                value: display_value(&v.reading, color),
            },
            plain_line,
        )
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    router: &Router,
    args: ReadingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Reject unknown keys before touching the network.
    if let Some(key) = args
        .keys
        .iter()
        .find(|key| miwifi_core::readings::find(key).is_none())
    {
        return Err(CliError::UnknownReading { key: key.clone() });
    }

    router.try_login().await?;
    let views = evaluate(router, &args.keys, args.ids).await?;

    let out = render(&views, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use miwifi_core::ReadingValue;

    use super::*;

    fn reading(value: Option<ReadingValue>, unit: Option<&'static str>) -> Reading {
        Reading {
            key: "wan_download_speed",
            label: "WAN download speed",
            unit,
            value,
        }
    }

    #[test]
    fn values_carry_their_unit() {
        let r = reading(Some(ReadingValue::Number(2.5)), Some("KiB/s"));
        assert_eq!(display_value(&r, false), "2.5 KiB/s");
        assert_eq!(display_value(&reading(None, Some("KiB/s")), false), "unavailable");
    }

    #[test]
    fn plain_lines_prefer_the_unique_id() {
        let view = ReadingView {
            reading: reading(Some(ReadingValue::Flag(true)), None),
            id: Some("001122aabbcc_wan_download_speed".into()),
        };
        assert_eq!(plain_line(&view), "001122aabbcc_wan_download_speed\ton");

        let view = ReadingView {
            reading: reading(None, None),
            id: None,
        };
        assert_eq!(plain_line(&view), "wan_download_speed\t");
    }
}
