//! Login command handler.

use serde::Serialize;

use miwifi_core::Router;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Session<'a> {
    host: &'a str,
    device_id: String,
    mac_address: Option<String>,
    firmware_version: Option<String>,
}

fn detail(session: &Session<'_>) -> String {
    let unknown = || "-".to_owned();
    [
        format!("Host:      {}", session.host),
        format!("Device ID: {}", session.device_id),
        format!(
            "MAC:       {}",
            session.mac_address.clone().unwrap_or_else(unknown)
        ),
        format!(
            "Firmware:  {}",
            session.firmware_version.clone().unwrap_or_else(unknown)
        ),
    ]
    .join("\n")
}

pub async fn handle(router: &Router, global: &GlobalOpts) -> Result<(), CliError> {
    router.try_login().await?;

    let identity = router.identity();
    let session = Session {
        host: router.host(),
        device_id: router.device_id(),
        mac_address: identity.mac_address,
        firmware_version: identity.firmware_version,
    };

    let out = output::render_single(global.output, &session, detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
