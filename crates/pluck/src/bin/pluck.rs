// ABOUTME: CLI binary for the pluck field extractor.
// ABOUTME: Extracts a field from one or more URLs via selector flags or builtin domain rules.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use pluck::{Client, Extraction, ExtractionRequest, FieldRule, RetryPolicy, SelectorSpec};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "pluck")]
#[command(about = "Extract a field from web pages using CSS selectors")]
struct Args {
    /// Element id to match; repeatable, forms a fallback chain
    #[arg(long = "id")]
    ids: Vec<String>,

    /// CSS selector; repeatable, appended to the chain after --id selectors
    #[arg(long = "css")]
    css: Vec<String>,

    /// CSS selector plus attribute as SELECTOR,ATTR; repeatable, appended last
    #[arg(long = "attr")]
    attrs: Vec<String>,

    /// Use a builtin domain rule by field name (e.g. price) instead of selectors
    #[arg(long = "field")]
    field: Option<String>,

    /// Request timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Total attempts per URL for transient failures (1 = no retry)
    #[arg(long = "retries", default_value_t = 1)]
    retries: u32,

    /// Base backoff between attempts in milliseconds
    #[arg(long = "backoff-ms", default_value_t = 500)]
    backoff_ms: u64,

    /// Output results as JSON
    #[arg(long = "json")]
    json: bool,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// URLs to extract from
    #[arg(required = true)]
    urls: Vec<String>,
}

/// Build the fallback chain from the selector flags, in flag-group order.
fn build_rule(args: &Args) -> Result<FieldRule, String> {
    let mut selectors = Vec::new();
    for id in &args.ids {
        selectors.push(SelectorSpec::id(id));
    }
    for css in &args.css {
        selectors.push(SelectorSpec::css(css));
    }
    for spec in &args.attrs {
        match spec.split_once(',') {
            Some((selector, attr)) if !selector.is_empty() && !attr.is_empty() => {
                selectors.push(SelectorSpec::attr(selector.trim(), attr.trim()));
            }
            _ => return Err(format!("invalid --attr value {:?}, expected SELECTOR,ATTR", spec)),
        }
    }
    Ok(FieldRule::chain(selectors))
}

fn outcome_json(url: &str, result: &Result<Extraction, pluck::ExtractError>) -> serde_json::Value {
    match result {
        Ok(Extraction::Found(text)) => json!({
            "url": url,
            "outcome": "found",
            "text": text,
        }),
        Ok(Extraction::NotFound) => json!({
            "url": url,
            "outcome": "not_found",
        }),
        Err(err) => json!({
            "url": url,
            "outcome": "error",
            "error": err.to_string(),
        }),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let has_selectors = !args.ids.is_empty() || !args.css.is_empty() || !args.attrs.is_empty();
    if args.field.is_some() && has_selectors {
        eprintln!("error: --field cannot be combined with --id/--css/--attr");
        return ExitCode::from(1);
    }
    if args.field.is_none() && !has_selectors {
        eprintln!("error: at least one of --id, --css, --attr, or --field is required");
        return ExitCode::from(1);
    }

    let rule = if args.field.is_none() {
        match build_rule(&args) {
            Ok(rule) => Some(rule),
            Err(msg) => {
                eprintln!("error: {}", msg);
                return ExitCode::from(1);
            }
        }
    } else {
        None
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .retry(RetryPolicy::new(
            args.retries,
            Duration::from_millis(args.backoff_ms),
        ))
        .allow_private_networks(args.allow_private_networks)
        .build();

    let mut results = Vec::new();
    let mut had_error = false;

    for url in &args.urls {
        let result = match (&rule, &args.field) {
            (Some(rule), _) => {
                let request = ExtractionRequest::new(url, rule.clone());
                client.extract(&request).await
            }
            (None, Some(field)) => client.extract_known(url, field).await,
            (None, None) => unreachable!("validated above"),
        };

        match &result {
            Ok(Extraction::Found(_)) => {}
            Ok(Extraction::NotFound) => {
                eprintln!("no match for {}", url);
                had_error = true;
            }
            Err(err) => {
                eprintln!("error extracting {}: {}", url, err);
                had_error = true;
            }
        }
        results.push((url.clone(), result));
    }

    let output_str = if args.json {
        let values: Vec<serde_json::Value> = results
            .iter()
            .map(|(url, result)| outcome_json(url, result))
            .collect();
        if values.len() == 1 {
            serde_json::to_string_pretty(&values[0]).unwrap()
        } else {
            serde_json::to_string_pretty(&values).unwrap()
        }
    } else {
        results
            .iter()
            .filter_map(|(_, result)| match result {
                Ok(Extraction::Found(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    if !output_str.is_empty() {
        if let Some(output_path) = &args.output {
            if let Err(e) = fs::write(output_path, &output_str) {
                eprintln!("error writing to {:?}: {}", output_path, e);
                had_error = true;
            }
        } else {
            println!("{}", output_str);
        }
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
