use anyhow::{Result, bail};
use std::process;

use crate::client::ApiClient;
use crate::config::{Config, Session};
use fourm_core::models::validate_user_token;

use super::helpers::{json_error, print_json};

/// Sign in with an email. The session is saved only after the server accepts the token.
pub(crate) async fn cmd_login(config: &Config, email: &str, json: bool) -> Result<()> {
    let Some(user) = validate_user_token(email) else {
        bail!("Invalid email '{email}'");
    };

    let client = ApiClient::new(&config.api_url, &user.email)?;
    client.get_user_settings().await?;

    let session = Session {
        email: user.email,
        token: user.id,
        name: user.name,
    };
    config.save_session(&session)?;

    if json {
        print_json(&session)?;
    } else {
        let name = &session.name;
        let email = &session.email;
        println!("Logged in as {name} <{email}>");
    }
    Ok(())
}

pub(crate) fn cmd_logout(config: &Config, json: bool) -> Result<()> {
    let cleared = config.clear_session()?;
    if json {
        println!("{}", serde_json::json!({ "success": cleared }));
    } else if cleared {
        println!("Logged out");
    } else {
        eprintln!("Not logged in");
    }
    Ok(())
}

pub(crate) fn cmd_whoami(config: &Config, json: bool) -> Result<()> {
    let Some(session) = config.load_session()? else {
        if json {
            println!("{}", json_error("Not logged in"));
        } else {
            eprintln!("Not logged in");
        }
        process::exit(2);
    };

    if json {
        print_json(&session)?;
    } else {
        let name = &session.name;
        let email = &session.email;
        let url = &config.api_url;
        println!("{name} <{email}> on {url}");
    }
    Ok(())
}
