//! roomcouncil command-line entry point.
//!
//! `roomcouncil serve` starts the HTTP server; `roomcouncil ask "<query>"` runs one pipeline and
//! prints it, either in-process or against a running server with `--server`.

use clap::{Parser, Subcommand};
use roomcouncil::clients::common::get_shared_http_client;
use roomcouncil::server;
use roomcouncil::{ClaudeClient, Pipeline, PipelineResult, RoomCouncilConfig};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "roomcouncil - multi-agent insight, critique and synthesis")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start the HTTP server (default)
    Serve {
        /// Interface to bind, overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the pipeline once and print the result
    Ask {
        /// The query to put to the council
        query: String,
        /// Base URL of a running roomcouncil server; runs in-process when omitted
        #[arg(long = "server")]
        remote: Option<String>,
    },
}

fn build_pipeline(config: &RoomCouncilConfig) -> Arc<Pipeline> {
    let client = Arc::new(ClaudeClient::new_with_base_url(
        &config.api_key,
        &config.base_url,
    ));
    Arc::new(Pipeline::new(client).with_config(config.pipeline.clone()))
}

fn preview(content: &str) -> String {
    let mut short: String = content.chars().take(100).collect();
    if short.len() < content.len() {
        short.push_str("...");
    }
    short
}

fn print_result(result: &PipelineResult) {
    println!("\n--- Insights ---");
    for insight in &result.insights {
        println!("\n[Agent {}]: {}", insight.role, preview(&insight.content));
    }

    println!("\n--- Critiques ---");
    for critique in &result.critiques {
        println!("\n[Agent {}]: {}", critique.role, preview(&critique.content));
    }

    println!("\n--- Final Output ---");
    println!("{}", result.final_output);

    if result.degraded {
        println!("\n(some agents failed; placeholder text was used)");
    }
}

async fn ask_remote(
    base_url: &str,
    query: &str,
) -> Result<PipelineResult, Box<dyn Error + Send + Sync>> {
    let url = format!("{}/api/multi-agent", base_url.trim_end_matches('/'));
    let response = get_shared_http_client()
        .post(url)
        .json(&serde_json::json!({ "query": query }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["error"].as_str().unwrap_or("unknown error");
        return Err(format!("server returned {}: {}", status, message).into());
    }

    Ok(response.json().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    roomcouncil::init_logger();

    let args = Args::parse();

    match args.command.unwrap_or(CliCommand::Serve {
        host: None,
        port: None,
    }) {
        CliCommand::Serve { host, port } => {
            let mut config = RoomCouncilConfig::from_env()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
            server::serve(build_pipeline(&config), addr).await
        }
        CliCommand::Ask { query, remote } => {
            println!("Asking the council: \"{}\"", query);
            let result = match remote {
                Some(base_url) => ask_remote(&base_url, &query).await?,
                None => {
                    let config = RoomCouncilConfig::from_env()?;
                    let query = roomcouncil::pipeline::normalize_query(&query)
                        .ok_or("query must not be empty")?
                        .to_string();
                    build_pipeline(&config).run(&query).await
                }
            };
            print_result(&result);
            Ok(())
        }
    }
}
