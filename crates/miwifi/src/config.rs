//! Profile selection and translation of CLI flags into a `RouterConfig`.
//!
//! File-level concerns (TOML, env merging, keyring) live in `miwifi-config`;
//! this module only layers the global flags on top.

use std::io::IsTerminal;

use miwifi_config::{Config, ConfigError, DurationSetting, Profile};
use miwifi_core::RouterConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Name used for a profile assembled from `--host` alone.
const AD_HOC_PROFILE: &str = "default";

/// Resolve the active profile name: `--profile`, then the configured default.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> Option<String> {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile_name().map(str::to_owned))
}

fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the `RouterConfig` for a command from config file, profile, and
/// CLI overrides.
pub fn build_router_config(global: &GlobalOpts) -> Result<RouterConfig, CliError> {
    let cfg = miwifi_config::load_config()?;

    let (name, mut profile) = match active_profile_name(global, &cfg) {
        Some(name) => match cfg.profiles.get(&name) {
            Some(profile) => (name, profile.clone()),
            None if global.profile.is_some() => {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            None => (name, ad_hoc_profile(global)?),
        },
        None => (AD_HOC_PROFILE.to_owned(), ad_hoc_profile(global)?),
    };

    apply_overrides(&mut profile, global);

    match miwifi_config::profile_to_router_config(&profile, &name, &cfg.defaults) {
        Err(ConfigError::NoCredentials { profile: missing }) => {
            let Some(password) = prompt_password(&profile.host)? else {
                return Err(CliError::NoCredentials { profile: missing });
            };
            profile.password = Some(password);
            Ok(miwifi_config::profile_to_router_config(
                &profile,
                &name,
                &cfg.defaults,
            )?)
        }
        other => Ok(other?),
    }
}

/// A profile built from flags and env only. `--host` is required.
fn ad_hoc_profile(global: &GlobalOpts) -> Result<Profile, CliError> {
    let host = global.host.as_deref().ok_or_else(|| CliError::NoConfig {
        path: miwifi_config::config_path().display().to_string(),
    })?;
    let mut profile = Profile::for_host(host);
    profile.use_keyring = Some(false);
    Ok(profile)
}

/// Flags and env (`MIWIFI_HOST`, ...) beat profile values.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if global.insecure {
        profile.ca_cert = None;
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(DurationSetting::from(timeout));
    }
}

/// Ask for the password when attached to a terminal.
fn prompt_password(host: &str) -> Result<Option<String>, CliError> {
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }
    let password = rpassword::prompt_password(format!("Password for {host}: "))?;
    Ok((!password.is_empty()).then_some(password))
}
