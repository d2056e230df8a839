//! Interactive `.env` creation.

use anyhow::{bail, Context, Result};
use inquire::validator::ValueRequiredValidator;
use inquire::{Confirm, Password, Text};
use resource_forge::config::EnvFile;
use std::path::PathBuf;

fn non_empty() -> ValueRequiredValidator {
    inquire::required!("A value is required")
}

fn prompt_env() -> Result<EnvFile> {
    let db_host = Text::new("Database host:").with_default("127.0.0.1").prompt()?;

    let db_port = loop {
        let raw = Text::new("Database port:")
            .with_default("5432")
            .with_help_message("1-65535")
            .prompt()?;
        match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => break port,
            _ => println!("'{}' is not a valid port", raw),
        }
    };

    let db_name = Text::new("Database name:").with_validator(non_empty()).prompt()?;
    let db_user = Text::new("Database user:")
        .with_default("postgres")
        .with_validator(non_empty())
        .prompt()?;
    let db_password = Password::new("Database password:")
        .without_confirmation()
        .with_validator(non_empty())
        .prompt()?;

    let display_error_details = Confirm::new("Display error details in responses?")
        .with_default(false)
        .with_help_message("Leave off in production")
        .prompt()?;
    let cors = Confirm::new("Answer CORS preflight requests?")
        .with_default(false)
        .prompt()?;

    Ok(EnvFile {
        db_host,
        db_port,
        db_name,
        db_user,
        db_password,
        display_error_details,
        cors,
    })
}

pub fn run_init(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let env = loop {
        let env = prompt_env()?;
        println!();
        println!("{}", env.preview());
        if Confirm::new("Write these settings?").with_default(true).prompt()? {
            break env;
        }
    };

    env.write_to(&output, force)
        .with_context(|| format!("unable to create: {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}
