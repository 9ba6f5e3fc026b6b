//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);
    let _ = writeln!(out, "search_debounce_ms = {}", cfg.defaults.search_debounce_ms);
    let _ = writeln!(out, "feedback_secs = {}", cfg.defaults.feedback_secs);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "project_id = \"{}\"", p.project_id);
        let _ = writeln!(out, "tenant = \"{}\"", p.tenant);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref host) = p.auth_emulator {
            let _ = writeln!(out, "auth_emulator = \"{host}\"");
        }
        if let Some(ref host) = p.documents_emulator {
            let _ = writeln!(out, "documents_emulator = \"{host}\"");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {interval}");
        }
    }

    out
}

/// Redacted clone for structured output.
fn redacted(cfg: &Config) -> Config {
    let mask = |s: &Option<String>| s.as_ref().map(|_| "****".to_owned());
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            output: cfg.defaults.output.clone(),
            color: cfg.defaults.color.clone(),
            ..cfg.defaults
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, p)| {
                (
                    name.clone(),
                    Profile {
                        project_id: p.project_id.clone(),
                        tenant: p.tenant.clone(),
                        api_key: mask(&p.api_key),
                        api_key_env: p.api_key_env.clone(),
                        email: p.email.clone(),
                        password: mask(&p.password),
                        auth_emulator: p.auth_emulator.clone(),
                        documents_emulator: p.documents_emulator.clone(),
                        timeout: p.timeout,
                        poll_interval: p.poll_interval,
                    },
                )
            })
            .collect(),
    }
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn require_non_empty(field: &str, value: String) -> Result<String, CliError> {
    if value.trim().is_empty() {
        return Err(CliError::InvalidValue {
            field: field.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(value)
}

/// Offer to store a secret in the system keyring or return it for
/// plaintext config. `None` means it went to the keyring.
fn prompt_keyring_storage(
    secret: String,
    prompt: &str,
    label: &str,
    store: impl FnOnce(&SecretString) -> Result<(), shopkeep_config::ConfigError>,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(prompt)
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store(&SecretString::from(secret))?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("shopkeep configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let project_id: String = Input::new()
                .with_prompt("Project id")
                .interact_text()
                .map_err(prompt_err)?;
            let project_id = require_non_empty("project_id", project_id)?;

            let tenant: String = Input::new()
                .with_prompt("Company (tenant) id")
                .interact_text()
                .map_err(prompt_err)?;
            let tenant = require_non_empty("tenant", tenant)?;

            let key = rpassword::prompt_password("Web API key: ").map_err(prompt_err)?;
            let key = require_non_empty("api_key", key)?;
            let api_key = prompt_keyring_storage(
                key,
                "Where to store the API key?",
                "API key",
                |secret| shopkeep_config::store_api_key(&profile_name, secret),
            )?;

            let email: String = Input::new()
                .with_prompt("Account email")
                .interact_text()
                .map_err(prompt_err)?;
            let email = require_non_empty("email", email)?;

            let password = if Confirm::new()
                .with_prompt("Save the account password now?")
                .default(true)
                .interact()
                .map_err(prompt_err)?
            {
                let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
                let pass = require_non_empty("password", pass)?;
                prompt_keyring_storage(pass, "Where to store the password?", "Password", |secret| {
                    shopkeep_config::store_password(&profile_name, secret)
                })?
            } else {
                None
            };

            let profile = Profile {
                project_id,
                tenant,
                api_key,
                email: Some(email),
                password,
                ..Profile::default()
            };
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: shopkeep auth login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &redacted(&cfg),
                format_config_redacted,
                |_| "config".into(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            let number = |field: &str, value: &str| -> Result<u64, CliError> {
                value.parse().map_err(|_| CliError::InvalidValue {
                    field: field.into(),
                    reason: "must be a number (seconds)".into(),
                })
            };

            match key.as_str() {
                "project_id" | "project-id" => profile.project_id = value,
                "tenant" => profile.tenant = value,
                "api_key" | "api-key" => profile.api_key = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "email" => profile.email = Some(value),
                "auth_emulator" | "auth-emulator" => profile.auth_emulator = Some(value),
                "documents_emulator" | "documents-emulator" => {
                    profile.documents_emulator = Some(value);
                }
                "timeout" => profile.timeout = Some(number("timeout", &value)?),
                "poll_interval" | "poll-interval" => {
                    profile.poll_interval = Some(number("poll_interval", &value)?);
                }
                other => {
                    return Err(CliError::InvalidValue {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: project_id, tenant, \
                             api_key, api_key_env, email, auth_emulator, documents_emulator, \
                             timeout, poll_interval"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: shopkeep config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile, api_key } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let label = if api_key { "API key: " } else { "Password: " };
            let secret = rpassword::prompt_password(label).map_err(prompt_err)?;
            let secret = SecretString::from(require_non_empty("secret", secret)?);
            if api_key {
                shopkeep_config::store_api_key(&profile_name, &secret)?;
            } else {
                shopkeep_config::store_password(&profile_name, &secret)?;
            }

            eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample() -> Config {
        let mut profiles = HashMap::new();
        profiles.insert(
            "shop".to_owned(),
            Profile {
                project_id: "demo".into(),
                tenant: "acme".into(),
                api_key: Some("AIza-secret".into()),
                email: Some("owner@acme.test".into()),
                password: Some("hunter22".into()),
                ..Profile::default()
            },
        );
        Config {
            default_profile: Some("shop".into()),
            defaults: Defaults::default(),
            profiles,
        }
    }

    #[test]
    fn show_masks_secrets() {
        let text = format_config_redacted(&sample());
        assert!(text.contains("[profiles.shop]"));
        assert!(text.contains("tenant = \"acme\""));
        assert!(!text.contains("AIza-secret"));
        assert!(!text.contains("hunter22"));
    }

    #[test]
    fn structured_show_masks_secrets() {
        let json = serde_json::to_string(&redacted(&sample())).unwrap_or_default();
        assert!(json.contains("owner@acme.test"));
        assert!(!json.contains("AIza-secret"));
        assert!(!json.contains("hunter22"));
    }
}
