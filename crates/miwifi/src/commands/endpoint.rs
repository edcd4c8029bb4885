//! Endpoint command handlers: catalogue, raw responses, single values.

use std::str::FromStr;

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use miwifi_core::{DataPath, Endpoint, Router, reader};

use crate::cli::{GetArgs, GlobalOpts, OutputFormat, ReadArgs};
use crate::error::CliError;
use crate::output;

fn parse_endpoint(name: &str) -> Result<Endpoint, CliError> {
    Endpoint::from_str(name).map_err(|_| CliError::UnknownEndpoint { name: name.into() })
}

// ── Catalogue ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EndpointEntry {
    name: &'static str,
    path: &'static str,
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Path")]
    path: &'static str,
}

pub fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let entries: Vec<EndpointEntry> = Endpoint::iter()
        .map(|ep| EndpointEntry {
            name: ep.name(),
            path: ep.path(),
        })
        .collect();

    let out = output::render_list(
        global.output,
        &entries,
        |e| EndpointRow {
            name: e.name,
            path: e.path,
        },
        |e| e.name.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Raw response ─────────────────────────────────────────────────────

pub async fn get(router: &Router, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    router.try_login().await?;

    let payload = router.payload(endpoint).await.ok_or_else(|| CliError::NoData {
        endpoint: endpoint.name().into(),
    })?;

    let out = match global.output {
        // Raw JSON has no table form.
        OutputFormat::Table | OutputFormat::Plain => serde_json::to_string_pretty(&*payload)?,
        format => output::render_single(format, &*payload, |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Single value ─────────────────────────────────────────────────────

pub async fn read(router: &Router, args: ReadArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoint = parse_endpoint(&args.endpoint)?;
    let data_path = match (args.key.as_deref(), args.index) {
        (Some(key), _) => Some(DataPath::Key(key)),
        (None, Some(index)) => Some(DataPath::Index(index)),
        (None, None) => None,
    };
    router.try_login().await?;

    let payload = router.payload(endpoint).await.ok_or_else(|| CliError::NoData {
        endpoint: endpoint.name().into(),
    })?;
    let value = reader::extract(&payload, &args.key_path, data_path).ok_or_else(|| {
        let key_path = match data_path {
            Some(dp @ DataPath::Key(_)) => format!("{}.{dp}", args.key_path),
            Some(dp @ DataPath::Index(_)) => format!("{}{dp}", args.key_path),
            None => args.key_path.clone(),
        };
        CliError::NoValue {
            endpoint: endpoint.name().into(),
            key_path,
        }
    })?;

    let out = output::render_single(global.output, &value, ToString::to_string)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
