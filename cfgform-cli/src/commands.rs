//! Subcommand handlers.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use cfgform::{
    data::{FieldBinding, assemble},
    web::{self, FieldsResponse},
};
use colored::Colorize;

use crate::{
    ctx::AppContext,
    render::{Change, change_listing, diff, projection_listing},
};

/// Handler for the `cfgform` subcommands.
pub struct CommandHandler;

impl CommandHandler {
    /// Prints every field of the config, as a listing or as JSON.
    pub async fn fields(ctx: &AppContext, json: bool) -> Result<()> {
        let session = ctx.open_session().await?;
        if json {
            let response = FieldsResponse {
                sections: session.projection().sections.clone(),
                bindings: session.bindings()?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", projection_listing(session.projection()));
        }
        Ok(())
    }

    /// Applies the edits in `edits` (a JSON array of bindings) and saves.
    pub async fn apply(ctx: &AppContext, edits: &Path) -> Result<()> {
        let content = tokio::fs::read_to_string(edits)
            .await
            .with_context(|| format!("failed to read {}", edits.display()))?;
        let edits: Vec<FieldBinding> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of field bindings", edits.display()))?;

        let mut session = ctx.open_session().await?;
        let before = session.document().clone();
        session.submit(&edits).await?;

        let changes = diff(&before, session.document());
        println!(
            "{} {} edits to {} ({} changes)",
            "Applied".green().bold(),
            edits.len(),
            ctx.config.display(),
            changes.len()
        );
        print!("{}", change_listing(&changes));
        Ok(())
    }

    /// Verifies that projecting and reassembling the config loses nothing.
    ///
    /// Added paths are defaults that a save would backfill; removed paths
    /// are not covered by the schema and would be dropped.
    pub async fn check(ctx: &AppContext) -> Result<()> {
        let session = ctx.open_session().await?;
        let rebuilt = assemble(&session.bindings()?)?;
        let changes = diff(session.document(), &rebuilt);

        if changes.is_empty() {
            println!("{} {}", "OK".green().bold(), ctx.config.display());
            return Ok(());
        }

        print!("{}", change_listing(&changes));
        let lossy = changes
            .iter()
            .filter(|c| !matches!(c, Change::Added(_)))
            .count();
        if lossy > 0 {
            bail!("{lossy} values would not survive a save");
        }
        println!(
            "{} {} defaults would be added on save",
            "OK".green().bold(),
            changes.len()
        );
        Ok(())
    }

    /// Prints the JSON schema of the binding list accepted by `apply`.
    pub fn schema() -> Result<()> {
        let schema = schemars::schema_for!(Vec<FieldBinding>);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    /// Serves the HTTP API until interrupted.
    pub async fn serve(ctx: &AppContext, addr: SocketAddr, static_dir: Option<PathBuf>) -> Result<()> {
        if let Some(dir) = &static_dir
            && !dir.is_dir()
        {
            bail!("static directory {} does not exist", dir.display());
        }
        let session = ctx.open_session().await?;
        info!("editing {}", ctx.config.display());
        web::serve(addr, web::router(session, static_dir)).await
    }
}
