//! Command-line client for integral-lens.
//!
//! Usage:
//!   lens levels board games
//!   lens quadrants --server http://127.0.0.1:8788 remote work
//!   lens states --raw morning coffee

use anyhow::{Context, Result};
use clap::Parser;
use integral_lens::{
    LensPipeline, LensResult, LensTable, bootstrap,
    panels::{read_panels, render_text},
};
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "lens")]
#[command(about = "Reframe input through an integral lens", long_about = None)]
struct Cli {
    /// Lens to query
    #[arg(value_parser = ["quadrants", "levels", "states"])]
    lens: String,
    /// Free-text input; multiple words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    input: Vec<String>,
    /// Base URL of a running integral-lens server; runs in-process when omitted
    #[arg(long)]
    server: Option<String>,
    /// Print the payload exactly as returned instead of panels
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let input = cli.input.join(" ");

    let config = bootstrap("integral_lens=warn")?;
    let table = LensTable::from_config(&config);
    let lens = table
        .get(&cli.lens)
        .with_context(|| format!("Unknown lens: {}", cli.lens))?;

    let outcome = match &cli.server {
        Some(base) => query_server(base, &lens.name, &input).await,
        None => {
            let pipeline = LensPipeline::from_config(&config)?;
            pipeline.query(lens, &input).await.map_err(anyhow::Error::from)
        }
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("An error occurred while querying the {} lens.", lens.name);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    if cli.raw {
        println!("{}", result);
        return Ok(());
    }

    match read_panels(&result, &lens.expected_keys) {
        Ok(panels) => print!("{}", render_text(&panels)),
        Err(e) => {
            eprintln!("An error occurred while querying the {} lens.", lens.name);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn query_server(base: &str, lens: &str, input: &str) -> Result<LensResult> {
    let url = format!("{}/lens/{}", base.trim_end_matches('/'), lens);
    let resp = reqwest::Client::new()
        .post(&url)
        .json(&json!({ "input": input }))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = resp.status();
    let text = resp.text().await.context("Failed to read server response")?;
    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("error").cloned())
            .unwrap_or(Value::String(text));
        anyhow::bail!("server returned {}: {}", status, detail);
    }
    Ok(LensResult::from(text))
}
