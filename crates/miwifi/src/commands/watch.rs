//! Watch command: poll readings on a fixed cadence.
//!
//! Each tick evaluates through the router cache, so a cadence shorter than
//! an endpoint's refresh window re-renders cached values without a request.

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use miwifi_core::Router;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::readings::{self, ReadingView};

#[derive(Serialize)]
struct Snapshot<'a> {
    timestamp: String,
    readings: &'a [ReadingView],
}

fn render_tick(
    at: DateTime<Local>,
    views: &[ReadingView],
    global: &GlobalOpts,
) -> Result<String, CliError> {
    let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, false);
    match global.output {
        OutputFormat::Table => Ok(format!("{timestamp}\n{}", readings::render(views, global)?)),
        OutputFormat::Plain => Ok(readings::render(views, global)?
            .lines()
            .map(|line| format!("{timestamp}\t{line}"))
            .collect::<Vec<_>>()
            .join("\n")),
        format => output::render_single(
            format,
            &Snapshot {
                timestamp,
                readings: views,
            },
            |_| String::new(),
        ),
    }
}

pub async fn handle(router: &Router, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(key) = args
        .keys
        .iter()
        .find(|key| miwifi_core::readings::find(key).is_none())
    {
        return Err(CliError::UnknownReading { key: key.clone() });
    }

    let every = args
        .every
        .unwrap_or(router.config().refresh.default_interval);
    if every.is_zero() {
        return Err(CliError::Validation {
            field: "every".into(),
            reason: "must be greater than zero".into(),
        });
    }

    router.try_login().await?;

    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut polls = 0_u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                debug!(polls, "watch interrupted");
                return Ok(());
            }
        }

        let views = readings::evaluate(router, &args.keys, false).await?;
        let out = render_tick(Local::now(), &views, global)?;
        output::print_output(&out, global.quiet);

        polls += 1;
        if args.count.is_some_and(|count| polls >= count) {
            return Ok(());
        }
    }
}
