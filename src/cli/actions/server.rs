use crate::cli::actions::Action;
use crate::snipbin::new;
use anyhow::{Context, Result};
use chrono::Duration;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            session_ttl_seconds,
        } => {
            let dsn = Url::parse(&dsn).context("invalid database DSN")?;

            new(
                port,
                dsn.to_string(),
                Duration::seconds(i64::from(session_ttl_seconds)),
            )
            .await?;
        }
    }

    Ok(())
}
