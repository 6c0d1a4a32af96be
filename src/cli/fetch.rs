//! `fetch`: retrieve a URL and copy it to the output.

use anyhow::Result;
use clap::Args;
use std::io::Write;

use crate::config::FetchConfig;
use crate::fetch::fetch_url;

/// Fetch a URL (http, https or file) and write its content to stdout.
#[derive(Args)]
pub struct FetchCommand {
    /// URL or local path
    url: String,
}

impl FetchCommand {
    pub async fn execute(&self, out: &mut dyn Write) -> Result<()> {
        let content = fetch_url(&self.url, &FetchConfig::from_env()).await?;
        out.write_all(&content)?;
        out.flush()?;
        Ok(())
    }
}
