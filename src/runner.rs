use clap::CommandFactory;
use serde::Serialize;

use crate::cli::{Cli, Commands, SearchArgs, SearchCommand};
use marktguru::api::{CatalogClient, SearchOptions};
use marktguru::auth::{discover_api_key, Progress};
use marktguru::config::{ConfigStore, ConfigUpdate, DEFAULT_ZIP_CODE};
use marktguru::output::{format_results_text, simplify_offer, SimpleSearchResult};
use marktguru::query::{build_query, QueryBuildInput, QUERY_SYNTAX_HELP};

const DEFAULT_LIMIT: u32 = 10;
// Retailer filtering happens client-side, so fetch enough to filter from.
const RETAILER_FETCH_LIMIT: u32 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn key_prefix(key: &str, len: usize) -> String {
    key.chars().take(len).collect()
}

fn init_tracing(debug: bool, verbose: bool) {
    // Keep external crates (reqwest/hyper) at INFO to avoid flooding the CLI.
    // Logs go to stderr so `--json` output on stdout stays parseable.
    use tracing_subscriber::EnvFilter;
    let crate_level = if debug { "debug" } else if verbose { "info" } else { "warn" };
    let filter_str = format!(
        "marktguru={crate},reqwest=info,hyper=info,h2=info",
        crate = crate_level
    );
    let env_filter =
        EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .init();
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.debug, cli.verbose);
    let json = cli.json;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Login => handle_login(json).await,
        Commands::Search { command } => match command {
            Some(SearchCommand::Raw { query, filters }) => {
                exit_on_error(run_search(&query, &filters, json).await);
                Ok(())
            }
            Some(SearchCommand::Build {
                terms,
                phrases,
                wildcards,
                ors,
                groups,
                explain,
                filters,
            }) => {
                let input = QueryBuildInput { terms, phrases, wildcards, ors, groups };
                exit_on_error(handle_search_build(&input, explain, &filters, json).await);
                Ok(())
            }
            Some(SearchCommand::Syntax) => {
                println!("{}", QUERY_SYNTAX_HELP);
                Ok(())
            }
            None => {
                let mut cmd = Cli::command();
                if let Some(search) = cmd.find_subcommand_mut("search") {
                    search.print_help()?;
                    println!();
                }
                Ok(())
            }
        },
        Commands::SetZip { code } => handle_set_zip(&code, json),
        Commands::Config => handle_config(json),
    }
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn handle_login(json: bool) -> anyhow::Result<()> {
    let print = |msg: &str| println!("{}", msg);
    let progress: Progress = if json { None } else { Some(&print) };
    if !json {
        println!("Extracting Marktguru API key (HTTP-only)...\n");
    }

    let outcome = async {
        let store = ConfigStore::default_location()?;
        let key = discover_api_key(progress).await?;
        store.save(ConfigUpdate::api_key(&key))?;
        Ok::<_, anyhow::Error>(key)
    }
    .await;

    let result = match outcome {
        Ok(key) => LoginResult { success: true, api_key: Some(key), error: None },
        Err(e) => LoginResult { success: false, api_key: None, error: Some(e.to_string()) },
    };

    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else if let Some(key) = &result.api_key {
        println!("\n✓ API key extracted and saved!");
        println!("  Key: {}...", key_prefix(key, 15));
    } else if let Some(error) = &result.error {
        eprintln!("\n✗ {}", error);
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Stored key, or run discovery and store the result.
async fn ensure_api_key(store: &ConfigStore, json: bool) -> anyhow::Result<String> {
    if let Some(key) = store.load().api_key() {
        return Ok(key.to_string());
    }

    let log = |msg: &str| {
        if json {
            eprintln!("{}", msg);
        } else {
            println!("{}", msg);
        }
    };
    log("No API key configured. Running login...");
    let key = discover_api_key(Some(&log)).await?;
    store.save(ConfigUpdate::api_key(&key))?;
    Ok(key)
}

async fn handle_search_build(
    input: &QueryBuildInput,
    explain: bool,
    filters: &SearchArgs,
    json: bool,
) -> anyhow::Result<()> {
    let built = build_query(input)?;
    if explain {
        eprintln!("Query: {}", built.query);
    }
    for warning in &built.warnings {
        eprintln!("Warning: {}", warning);
    }
    run_search(&built.query, filters, json).await
}

async fn run_search(query: &str, filters: &SearchArgs, json: bool) -> anyhow::Result<()> {
    let store = ConfigStore::default_location()?;
    let api_key = ensure_api_key(&store, json).await?;
    let config = store.load();

    let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);
    let fetch_limit = if filters.retailer.is_some() {
        limit.max(RETAILER_FETCH_LIMIT)
    } else {
        limit
    };
    let options = SearchOptions {
        query: query.to_string(),
        zip_code: config.resolve_zip_code(filters.zip.as_deref()).to_string(),
        limit: Some(fetch_limit),
        ..Default::default()
    };

    let mut result = CatalogClient::new(api_key)?.search(&options).await?;
    result.narrow(filters.retailer.as_deref(), limit as usize);
    tracing::info!(
        query,
        shown = result.results.len(),
        total = result.total_results,
        "search complete"
    );

    if json {
        let simple = SimpleSearchResult {
            query: query.to_string(),
            total: result.total_results,
            offers: result.results.iter().map(simplify_offer).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&simple)?);
    } else {
        println!("{}", format_results_text(&result, query, chrono::Utc::now()));
    }
    Ok(())
}

fn handle_set_zip(code: &str, json: bool) -> anyhow::Result<()> {
    ConfigStore::default_location()?.save(ConfigUpdate::zip_code(code))?;
    if json {
        println!("{}", serde_json::json!({ "success": true, "zipCode": code }));
    } else {
        println!("✓ Default ZIP code set to: {}", code);
    }
    Ok(())
}

fn handle_config(json: bool) -> anyhow::Result<()> {
    let config = ConfigStore::default_location()?.load();
    let masked = config.api_key().map(|k| format!("{}...", key_prefix(k, 10)));
    if json {
        println!(
            "{}",
            serde_json::json!({
                "apiKey": masked,
                "apiKeySet": config.api_key().is_some(),
                "zipCode": config.zip_code_or_default(),
                "configPath": config.config_path.display().to_string(),
            })
        );
    } else {
        println!("Configuration:");
        println!("  API Key: {}", masked.as_deref().unwrap_or("(not set)"));
        let zip = config
            .zip_code()
            .map(String::from)
            .unwrap_or_else(|| format!("(default: {})", DEFAULT_ZIP_CODE));
        println!("  ZIP Code: {}", zip);
        println!("  Config file: {}", config.config_path.display());
    }
    Ok(())
}
