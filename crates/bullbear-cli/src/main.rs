//! Bull vs bear debate CLI.
//!
//! ```bash
//! # Full debate, three rounds
//! bullbear run NVDA --rounds 3
//!
//! # Research coverage only
//! bullbear research NVDA
//!
//! # Query one document collection
//! bullbear search "AI chip demand" --collection analyst_reports --ticker NVDA
//! ```
//!
//! Endpoints come from `BULLBEAR_ORACLE_URL` / `BULLBEAR_RESEARCH_URL` and
//! their companion variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bullbear_core::{
    Debate, DebateConfig, HttpOracle, HttpResearchProvider, Participant, ResearchProvider,
    ResearchStage, SessionState, SessionUpdate, Verdict,
};

#[derive(Parser, Debug)]
#[command(name = "bullbear", version, about = "Multi-agent bull vs bear stock debate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full debate on a ticker.
    Run {
        /// Stock ticker to analyze (e.g. NVDA, AAPL).
        ticker: String,
        /// Number of bull/bear exchange rounds.
        #[arg(short, long, default_value_t = 3)]
        rounds: u32,
        /// Specific question to debate instead of the default buy-or-sell.
        #[arg(short, long)]
        question: Option<String>,
        /// Save the flat session export to a JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Suppress per-turn output.
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Run only the research stage and show category coverage.
    Research {
        /// Stock ticker to research.
        ticker: String,
    },
    /// Query one document collection directly.
    Search {
        /// Free-text search query.
        query: String,
        /// Collection: analyst_reports, earnings_transcripts, sec_filings.
        #[arg(short, long, default_value = "analyst_reports")]
        collection: String,
        /// Restrict results to one ticker.
        #[arg(short, long)]
        ticker: Option<String>,
        /// Maximum number of results.
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Run {
            ticker,
            rounds,
            question,
            output,
            quiet,
        } => run_command(&ticker, rounds, question.as_deref(), output, quiet).await,
        Command::Research { ticker } => research_command(&ticker).await,
        Command::Search {
            query,
            collection,
            ticker,
            limit,
        } => search_command(&query, &collection, ticker.as_deref(), limit).await,
    }
}

async fn run_command(
    ticker: &str,
    rounds: u32,
    question: Option<&str>,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let oracle = Arc::new(HttpOracle::from_env());
    let provider = Arc::new(HttpResearchProvider::from_env());

    println!("=== Bull vs Bear: {} ({rounds} rounds) ===", ticker.to_uppercase());

    let debate = Debate::new(
        oracle,
        provider,
        ticker,
        question,
        DebateConfig { round_limit: rounds },
    );

    let mut rx = debate.into_stream();
    let mut final_state: Option<SessionState> = None;

    while let Some(update) = rx.recv().await {
        match update {
            SessionUpdate::Turn(turn) => {
                if quiet {
                    continue;
                }
                match turn.participant {
                    "research" => {
                        let populated = turn
                            .delta
                            .evidence
                            .as_ref()
                            .map(|b| b.populated_categories())
                            .unwrap_or(0);
                        println!("\n[research] {populated}/9 evidence categories populated");
                    }
                    "judge" => println!("\n[judge] verdict issued"),
                    name => {
                        for argument in &turn.delta.arguments {
                            println!(
                                "\n[{name}] (confidence {:.0}%)\n{}",
                                argument.confidence * 100.0,
                                bullbear_core::context::truncate(&argument.content, 600),
                            );
                        }
                    }
                }
            }
            SessionUpdate::Finished(state) => final_state = Some(*state),
            SessionUpdate::Failed(e) => return Err(e).context("debate aborted"),
        }
    }

    let state = final_state.context("stream closed without a final state")?;
    print_summary(&state);

    if let Some(path) = output {
        let export = serde_json::to_string_pretty(&state.export())?;
        std::fs::write(&path, export)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nResults saved to {}", path.display());
    }

    Ok(())
}

fn print_summary(state: &SessionState) {
    println!("\n=== DEBATE SUMMARY: {} ===", state.ticker);
    println!("Question:  {}", state.question);
    println!("Rounds:    {}/{}", state.round_index, state.round_limit);
    println!("Arguments: {}", state.arguments.len());
    println!("Checks:    {}", state.fact_checks.len());
    if !state.errors.is_empty() {
        println!("Warnings:  {}", state.errors.len());
    }

    if let Some(verdict) = &state.verdict {
        print_verdict(verdict);
    }
}

fn print_verdict(verdict: &Verdict) {
    println!("\n--- VERDICT: {} ---", verdict.recommendation.label());
    println!("Confidence: {:.0}%", verdict.confidence * 100.0);
    println!(
        "Bull {:.0}/100 vs Bear {:.0}/100",
        verdict.bull_score, verdict.bear_score
    );
    println!("\n{}", verdict.summary);
    println!("\nKey factors:");
    for factor in &verdict.key_factors {
        println!("  - {factor}");
    }
    println!("Risks to monitor:");
    for risk in &verdict.risks {
        println!("  - {risk}");
    }
}

async fn research_command(ticker: &str) -> Result<()> {
    let provider = Arc::new(HttpResearchProvider::from_env());
    let stage = ResearchStage::new(provider);
    let state = SessionState::new(ticker, None, 1);

    info!(ticker = %state.ticker, "running research stage");
    let delta = stage
        .act(&state)
        .await
        .context("research stage failed unexpectedly")?;

    let bundle = delta.evidence.context("research stage returned no bundle")?;
    println!("Research for {} ({})", bundle.ticker, bundle.company_name);
    println!("  metrics: {} fields", bundle.metrics.len());
    println!("  earnings history: {} rows", bundle.earnings_history.len());
    println!("  technical indicators: {} fields", bundle.technical_indicators.len());
    println!("  sentiment: {} fields", bundle.sentiment.len());
    println!("  insider activity: {} rows", bundle.insider_activity.len());
    println!("  institutional holdings: {} rows", bundle.institutional_holdings.len());
    println!("  analyst reports: {} excerpts", bundle.analyst_reports.len());
    println!("  earnings transcripts: {} excerpts", bundle.earnings_transcripts.len());
    println!("  sec filings: {} excerpts", bundle.sec_filings.len());

    for error in &delta.errors {
        println!("  warning: {error}");
    }
    Ok(())
}

async fn search_command(
    query: &str,
    collection: &str,
    ticker: Option<&str>,
    limit: usize,
) -> Result<()> {
    let provider = HttpResearchProvider::from_env();
    let results = provider
        .search(collection, query, ticker, limit)
        .await
        .with_context(|| format!("search against {collection} failed"))?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, excerpt) in results.iter().enumerate() {
        println!("\n{}. [{}] {}", i + 1, excerpt.source, excerpt.title);
        println!("{}", bullbear_core::context::truncate(&excerpt.content, 500));
    }
    Ok(())
}
