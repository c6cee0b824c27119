use clap::Subcommand;
use serde_json::json;

use crate::auth::Authenticator;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token for a user id")]
    Issue {
        #[arg(help = "User id to put in the token")]
        user_id: i64,
    },

    #[command(about = "Verify a token and show its claims")]
    Inspect {
        #[arg(help = "Compact token string")]
        token: String,
    },
}

pub fn handle(cmd: TokenCommands, config: AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let authenticator = Authenticator::from_config(&config.security)?;

    match cmd {
        TokenCommands::Issue { user_id } => {
            let issued = authenticator.issue(user_id)?;
            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({
                        "user_id": user_id,
                        "token": issued.token,
                        "expires_at": issued.expires_at,
                    })),
                ),
                OutputFormat::Text => {
                    println!("{}", issued.token);
                    Ok(())
                }
            }
        }
        TokenCommands::Inspect { token } => match authenticator.verify_token(token.trim()) {
            Ok(claims) => output_success(
                &output_format,
                &format!("Token valid for user {}", claims.user_id),
                Some(json!({ "claims": claims })),
            ),
            Err(e) => {
                output_error(&output_format, &e.to_string(), Some("TOKEN_REJECTED"))?;
                anyhow::bail!("token rejected: {}", e)
            }
        },
    }
}
