//! Config subcommand handlers.

use miwifi_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

fn prompt_new_password(profile_name: &str) -> Result<String, CliError> {
    let password = rpassword::prompt_password(format!("Router password for '{profile_name}': "))?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(password)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init) => handle_init(init, global),

        ConfigCommand::Show => {
            let mut cfg = miwifi_config::load_config()?;
            for profile in cfg.profiles.values_mut() {
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
            }

            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                format => output::render_single(format, &cfg, |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(
                &miwifi_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::SetPassword { name } => {
            let cfg = miwifi_config::load_config()?;
            let name = name
                .or_else(|| config::active_profile_name(global, &cfg))
                .ok_or_else(|| CliError::NoConfig {
                    path: miwifi_config::config_path().display().to_string(),
                })?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
                    name,
                });
            }

            let password = prompt_new_password(&name)?;
            miwifi_config::store_password(&name, &password)?;
            if !global.quiet {
                eprintln!("Password for '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

fn handle_init(args: ConfigInitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg: Config = miwifi_config::load_config()?;
    if cfg.profiles.contains_key(&args.name) && !args.force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("profile '{}' already exists (use --force to replace it)", args.name),
        });
    }

    let mut profile = Profile::for_host(
        global
            .host
            .clone()
            .unwrap_or_else(|| miwifi_core::RouterConfig::default().host),
    );
    profile.username.clone_from(&global.username);
    profile.password_env.clone_from(&args.password_env);
    if global.insecure {
        profile.insecure = Some(true);
    }

    if args.store_password {
        let password = prompt_new_password(&args.name)?;
        miwifi_config::store_password(&args.name, &password)?;
        profile.use_keyring = Some(true);
    } else if args.password_env.is_some() {
        profile.use_keyring = Some(false);
    }

    let is_default = cfg
        .default_profile
        .as_ref()
        .is_none_or(|name| !cfg.profiles.contains_key(name) || *name == args.name);
    if is_default {
        cfg.default_profile = Some(args.name.clone());
    }
    cfg.profiles.insert(args.name.clone(), profile);

    let path = miwifi_config::save_config(&cfg)?;
    if !global.quiet {
        eprintln!("Profile '{}' written to {}", args.name, path.display());
    }
    Ok(())
}
