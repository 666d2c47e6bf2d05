//! Prompt context assembly — renders the evidence bundle and prior turns
//! into the bounded text block every oracle call receives.

use std::fmt::Write as _;

use crate::evidence::{field_str, DocumentExcerpt, EvidenceBundle};
use crate::state::Argument;

/// Per-entry truncation applied when replaying debate history.
pub const HISTORY_PREVIEW_CHARS: usize = 500;

/// Render the research snapshot for prompt consumption.
///
/// Only populated categories are rendered; an absent or fully empty bundle
/// becomes a single placeholder line so the prompt shape stays stable.
pub fn format_evidence(evidence: Option<&EvidenceBundle>) -> String {
    let Some(bundle) = evidence else {
        return "No research data available.".to_string();
    };
    if bundle.is_empty() {
        return "No research data available.".to_string();
    }

    let mut out = String::new();

    if !bundle.metrics.is_empty() {
        let m = &bundle.metrics;
        let _ = writeln!(out, "VALUATION METRICS:");
        let _ = writeln!(out, "- P/E Ratio: {}", field_str(m, "PE_RATIO"));
        let _ = writeln!(out, "- Forward P/E: {}", field_str(m, "FORWARD_PE"));
        let _ = writeln!(out, "- Price/Book: {}", field_str(m, "PRICE_TO_BOOK"));
        let _ = writeln!(out, "- ROE: {}%", field_str(m, "ROE_PCT"));
        let _ = writeln!(out, "- Debt/Equity: {}", field_str(m, "DEBT_TO_EQUITY"));
        let _ = writeln!(out, "- Dividend Yield: {}%", field_str(m, "DIVIDEND_YIELD_PCT"));
        out.push('\n');
    }

    if !bundle.technical_indicators.is_empty() {
        let t = &bundle.technical_indicators;
        let _ = writeln!(out, "TECHNICAL INDICATORS:");
        let _ = writeln!(out, "- Close Price: ${}", field_str(t, "CLOSE_PRICE"));
        let _ = writeln!(out, "- RSI (14): {}", field_str(t, "RSI_14"));
        let _ = writeln!(out, "- MACD: {}", field_str(t, "MACD"));
        let _ = writeln!(out, "- SMA 50: ${}", field_str(t, "SMA_50"));
        let _ = writeln!(out, "- SMA 200: ${}", field_str(t, "SMA_200"));
        out.push('\n');
    }

    if !bundle.sentiment.is_empty() {
        let s = &bundle.sentiment;
        let _ = writeln!(out, "MARKET SENTIMENT:");
        let _ = writeln!(out, "- Overall: {}", field_str(s, "OVERALL_SENTIMENT"));
        let _ = writeln!(out, "- News Score: {}", field_str(s, "NEWS_SENTIMENT_SCORE"));
        let _ = writeln!(
            out,
            "- Social Score: {}",
            field_str(s, "SOCIAL_MEDIA_SENTIMENT_SCORE")
        );
        let _ = writeln!(out, "- Bullish %: {}%", field_str(s, "BULLISH_PCT"));
        let _ = writeln!(out, "- Bearish %: {}%", field_str(s, "BEARISH_PCT"));
        out.push('\n');
    }

    if !bundle.earnings_history.is_empty() {
        let _ = writeln!(out, "RECENT EARNINGS:");
        for e in bundle.earnings_history.iter().take(3) {
            let _ = writeln!(
                out,
                "- {} {}: EPS ${} ({}, {}% surprise)",
                field_str(e, "FISCAL_QUARTER"),
                field_str(e, "FISCAL_YEAR"),
                field_str(e, "EPS_ACTUAL"),
                field_str(e, "BEAT_MISS"),
                field_str(e, "EPS_SURPRISE_PCT"),
            );
        }
        out.push('\n');
    }

    if !bundle.insider_activity.is_empty() {
        let _ = writeln!(out, "INSIDER ACTIVITY:");
        for i in bundle.insider_activity.iter().take(3) {
            let _ = writeln!(
                out,
                "- {} ({}): {} {} shares @ ${}",
                field_str(i, "INSIDER_NAME"),
                field_str(i, "INSIDER_TITLE"),
                field_str(i, "TRANSACTION_TYPE"),
                field_str(i, "SHARES_TRADED"),
                field_str(i, "PRICE_PER_SHARE"),
            );
        }
        out.push('\n');
    }

    if !bundle.institutional_holdings.is_empty() {
        let _ = writeln!(out, "INSTITUTIONAL HOLDINGS:");
        for h in bundle.institutional_holdings.iter().take(3) {
            let _ = writeln!(
                out,
                "- {} ({}): {} shares, ${}M",
                field_str(h, "INSTITUTION_NAME"),
                field_str(h, "INSTITUTION_TYPE"),
                field_str(h, "SHARES_HELD"),
                field_str(h, "VALUE_USD_MILLIONS"),
            );
        }
        out.push('\n');
    }

    render_excerpts(&mut out, "ANALYST REPORTS:", &bundle.analyst_reports);
    render_excerpts(&mut out, "EARNINGS CALL EXCERPTS:", &bundle.earnings_transcripts);
    render_excerpts(&mut out, "SEC FILINGS:", &bundle.sec_filings);

    out.trim_end().to_string()
}

fn render_excerpts(out: &mut String, heading: &str, excerpts: &[DocumentExcerpt]) {
    if excerpts.is_empty() {
        return;
    }
    let _ = writeln!(out, "{heading}");
    for ex in excerpts.iter().take(3) {
        let _ = writeln!(out, "- [{}] {}", ex.source, ex.title);
        if !ex.content.is_empty() {
            let _ = writeln!(out, "  {}", truncate(&ex.content, 200));
        }
    }
    out.push('\n');
}

/// Render prior turns for history replay, each truncated to a bounded
/// preview. The opposing argument under rebuttal is passed full-text
/// separately by the participant.
pub fn format_history(arguments: &[Argument]) -> String {
    if arguments.is_empty() {
        return "No previous arguments.".to_string();
    }
    let mut out = String::from("DEBATE HISTORY:");
    for arg in arguments {
        let _ = write!(
            out,
            "\n\n[{}] (confidence: {:.0}%)\n{}",
            arg.speaker.to_string().to_uppercase(),
            arg.confidence * 100.0,
            truncate(&arg.content, HISTORY_PREVIEW_CHARS),
        );
    }
    out
}

/// Truncate on a char boundary, marking elision.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Render accumulated fact-check results for the judge.
pub fn format_fact_checks(checks: &[crate::state::FactCheck]) -> String {
    if checks.is_empty() {
        return "No fact-checks available".to_string();
    }
    let mut out = String::from("FACT-CHECK RESULTS:");
    for check in checks {
        let _ = write!(
            out,
            "\n{}: accuracy {:.2}",
            check.subject_speaker.to_string().to_uppercase(),
            check.accuracy_score,
        );
    }
    out
}
