//! Account command handlers.

use secrecy::SecretString;

use shopkeep_core::Identity;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config::ActiveProfile;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(identity: &Identity) -> String {
    [
        format!("UID:    {}", identity.uid),
        format!("Email:  {}", identity.email.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn require_email(active: &ActiveProfile, email: Option<&str>) -> Result<String, CliError> {
    active.email(email).ok_or_else(|| CliError::NoCredentials {
        profile: active.name.clone(),
    })
}

pub async fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let active = ActiveProfile::load(global)?;
    let storefront = active.storefront()?;
    let _feedback = util::echo_feedback(&storefront, global);

    let result = match args.command {
        AuthCommand::Login { email } => {
            let spinner = util::spinner("Signing in...", global);
            let scope = util::sign_in(&storefront, &active, email.as_deref()).await;
            spinner.finish_and_clear();

            scope.map(|scope| {
                let out = output::render_single(&global.output, &scope.identity, detail, |i| {
                    i.uid.clone()
                });
                output::print_output(&out, global.quiet);
            })
        }

        AuthCommand::Signup { email } => {
            let email = require_email(&active, email.as_deref())?;
            let password = rpassword::prompt_password("Password: ").map_err(util::prompt_err)?;
            let confirm =
                rpassword::prompt_password("Confirm password: ").map_err(util::prompt_err)?;

            storefront.init();
            storefront
                .session()
                .sign_up(
                    &email,
                    &SecretString::from(password),
                    &SecretString::from(confirm),
                )
                .await
                .map(|identity| {
                    let out = output::render_single(&global.output, &identity, detail, |i| {
                        i.uid.clone()
                    });
                    output::print_output(&out, global.quiet);
                })
                .map_err(|e| CliError::from(e).for_profile(&active.name))
        }

        AuthCommand::ResetPassword { email } => {
            let email = require_email(&active, email.as_deref())?;
            storefront
                .session()
                .send_password_reset(&email)
                .await
                .map_err(|e| CliError::from(e).for_profile(&active.name))
        }
    };

    storefront.teardown();
    result
}
