//! relink-cli — admin frontend for the Relink HTTP API
//!
//! # Subcommands
//! - `status`                                        — show server health
//! - `update <sku> <link-type> <linked-skus...>`     — replace one link type
//! - `update-all <sku> [--similar ..] [--repair ..] [--functional ..]`
//! - `list <sku> <link-type>`                        — linked products

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8810";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "relink-cli",
    version,
    about = "Relink product relationship links — admin CLI"
)]
struct Cli {
    /// Relink HTTP server URL (overrides RELINK_HTTP_URL env var)
    #[arg(long, env = "RELINK_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show Relink server status
    Status,

    /// Replace the links of one type for a product
    Update {
        /// Source product SKU
        sku: String,

        /// Link type: similar, repair or functional
        link_type: String,

        /// Candidate linked SKUs
        linked_skus: Vec<String>,

        /// Starting position offset for the new links
        #[arg(short, long, default_value_t = 0)]
        position: i32,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Update all three link types in one request
    UpdateAll {
        /// Source product SKU
        sku: String,

        /// Similar product SKUs
        #[arg(long, value_delimiter = ',')]
        similar: Vec<String>,

        /// Repair product SKUs
        #[arg(long, value_delimiter = ',')]
        repair: Vec<String>,

        /// Functional product SKUs
        #[arg(long, value_delimiter = ',')]
        functional: Vec<String>,

        /// Starting position offset for the new links
        #[arg(short, long, default_value_t = 0)]
        position: i32,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List the linked products of one type for a product
    List {
        /// Source product SKU
        sku: String,

        /// Link type: similar, repair or functional
        link_type: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductInfo {
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptedLink {
    pub sku: String,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct RejectedSku {
    pub sku: String,
    pub reason: String,
}

/// The per-type bucket payload shared by both mutation responses.
#[derive(Debug, Deserialize)]
pub struct LinkOutcome {
    pub link_type: String,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub successful: Vec<AcceptedLink>,
    #[serde(default)]
    pub rejected: Vec<RejectedSku>,
    #[serde(default)]
    pub duplicate: Vec<String>,
    #[serde(default)]
    pub already_linked: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResponse {
    pub product: ProductInfo,
    #[serde(flatten)]
    pub outcome: LinkOutcome,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAllResponse {
    pub product: ProductInfo,
    pub success: bool,
    pub message: String,
    pub similar: LinkOutcome,
    pub repair: LinkOutcome,
    pub functional: LinkOutcome,
}

#[derive(Debug, Deserialize)]
pub struct LinkedItem {
    pub sku: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkedProductsResponse {
    pub sku: String,
    pub link_type: String,
    pub count: usize,
    pub products: Vec<LinkedItem>,
}

// ============================================================================
// Output Formatting
// ============================================================================

/// Human-readable lines for one link-type outcome.
pub fn outcome_lines(outcome: &LinkOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} ({})",
        outcome.link_type,
        if outcome.success { "ok" } else { "failed" },
        outcome.message
    )];
    for link in &outcome.successful {
        lines.push(format!(
            "  + {} ({}) @ {}",
            link.sku, link.name, link.position
        ));
    }
    for rej in &outcome.rejected {
        lines.push(format!("  - {}: {}", rej.sku, rej.reason));
    }
    for sku in &outcome.duplicate {
        lines.push(format!("  = {} (duplicate in request)", sku));
    }
    for sku in &outcome.already_linked {
        lines.push(format!("  ~ {} (already linked)", sku));
    }
    lines
}

fn print_outcome(product: &ProductInfo, outcome: &LinkOutcome) {
    println!("{} ({})", product.sku, product.name);
    for line in outcome_lines(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

fn send_json(
    req: reqwest::blocking::RequestBuilder,
    url: &str,
) -> anyhow::Result<serde_json::Value> {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("relink-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("relink-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

fn do_update(
    server: &str,
    sku: &str,
    link_type: &str,
    linked_skus: &[String],
    position: i32,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = format!("{}/links/update", server);
    let body = serde_json::json!({
        "sku": sku,
        "link_type": link_type,
        "linked_skus": linked_skus,
        "position": position,
    });

    let raw = send_json(client()?.post(&url).json(&body), &url)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let resp: UpdateResponse = serde_json::from_value(raw)?;
    print_outcome(&resp.product, &resp.outcome);
    Ok(())
}

fn do_update_all(
    server: &str,
    sku: &str,
    similar: &[String],
    repair: &[String],
    functional: &[String],
    position: i32,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = format!("{}/links/update-all", server);
    let body = serde_json::json!({
        "sku": sku,
        "similar_skus": similar,
        "repair_skus": repair,
        "functional_skus": functional,
        "position": position,
    });

    let raw = send_json(client()?.post(&url).json(&body), &url)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let resp: UpdateAllResponse = serde_json::from_value(raw)?;
    println!(
        "{} ({}) — {} ({})",
        resp.product.sku,
        resp.product.name,
        if resp.success { "ok" } else { "failed" },
        resp.message
    );
    for outcome in [&resp.similar, &resp.repair, &resp.functional] {
        for line in outcome_lines(outcome) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn do_list(server: &str, sku: &str, link_type: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/products/{}/links/{}", server, sku, link_type);

    let raw = send_json(client()?.get(&url), &url)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let resp: LinkedProductsResponse = serde_json::from_value(raw)?;
    if resp.products.is_empty() {
        println!("No {} links for {}", resp.link_type, resp.sku);
        return Ok(());
    }
    println!("{} {} links for {}:", resp.count, resp.link_type, resp.sku);
    for item in &resp.products {
        println!("  {} ({})", item.sku, item.name);
    }
    Ok(())
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client()?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Relink server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:       {}", body["version"].as_str().unwrap_or("?"));
            println!("Socket:        {}", body["socket"].as_str().unwrap_or("?"));
            if body["storage"]["memory"] == true {
                println!("Storage:       in-memory");
            } else {
                println!(
                    "PostgreSQL:    {}",
                    body["storage"]["postgresql"].as_str().unwrap_or("?")
                );
                println!(
                    "Link types:    {}",
                    body["storage"]["link_types"].as_str().unwrap_or("?")
                );
            }
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("relink-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("relink-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Status => do_status(&server),
        Commands::Update {
            sku,
            link_type,
            linked_skus,
            position,
            json,
        } => do_update(&server, &sku, &link_type, &linked_skus, position, json),
        Commands::UpdateAll {
            sku,
            similar,
            repair,
            functional,
            position,
            json,
        } => do_update_all(&server, &sku, &similar, &repair, &functional, position, json),
        Commands::List {
            sku,
            link_type,
            json,
        } => do_list(&server, &sku, &link_type, json),
    };

    if let Err(e) = result {
        eprintln!("relink-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
