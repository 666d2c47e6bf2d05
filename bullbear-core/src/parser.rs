//! Free-text response parsing — oracle output into structured records.
//!
//! Two stages: a tolerant line-oriented tokenizer ([`RawFields`]) that never
//! fails, followed by typed builders that apply per-field defaults and clamp
//! every numeric into its valid range. Malformed numerics keep their
//! defaults; the full raw text is always retained verbatim as the record
//! body, with structured fields as a best-effort overlay.

use std::collections::BTreeMap;

use crate::state::{Argument, FactCheck, Recommendation, Speaker, Verdict};

/// Default confidence for arguments and fact-check accuracy.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;
/// Default confidence for verdicts.
pub const DEFAULT_VERDICT_CONFIDENCE: f64 = 0.5;
/// Default bull/bear score for verdicts.
pub const DEFAULT_SCORE: f64 = 50.0;
/// Moderator summary arguments carry a fixed confidence.
pub const MODERATOR_CONFIDENCE: f64 = 0.9;

/// Longest label prefix the tokenizer will recognize; longer prefixes are
/// treated as prose that happens to contain a colon.
const MAX_LABEL_LEN: usize = 32;

/// Unvalidated field map scanned out of one oracle response.
///
/// Labels are `NAME:` prefixes at the start of a line, matched
/// case-insensitively and normalized (spaces to underscores). Bullet lines
/// (`-`, `*`, `•`) are attributed to the most recently seen label so list
/// sections like `KEY_FACTORS:` can be recovered.
#[derive(Debug, Clone, Default)]
pub struct RawFields {
    /// Every `LABEL: value` occurrence in scan order.
    entries: Vec<(String, String)>,
    /// Bullet lines with the label of the section they appeared under.
    bullets: Vec<(Option<String>, String)>,
}

impl RawFields {
    /// Scan raw text. Never fails; unlabeled text is simply not captured.
    pub fn scan(raw: &str) -> Self {
        let mut fields = Self::default();
        let mut current_label: Option<String> = None;

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(text) = strip_bullet(trimmed) {
                fields
                    .bullets
                    .push((current_label.clone(), text.to_string()));
                continue;
            }
            if let Some((label, value)) = split_label(trimmed) {
                fields.entries.push((label.clone(), value));
                current_label = Some(label);
            }
        }
        fields
    }

    /// All values recorded under a label, in scan order.
    pub fn values(&self, label: &str) -> impl Iterator<Item = &str> {
        let wanted = normalize_label(label);
        self.entries
            .iter()
            .filter(move |(l, _)| *l == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// First value recorded under a label.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.values(label).next()
    }

    /// Parse a numeric field. The last occurrence whose leading token parses
    /// wins; anything else silently keeps `default`.
    pub fn numeric(&self, label: &str, default: f64) -> f64 {
        self.values(label)
            .filter_map(|v| v.split_whitespace().next())
            .filter_map(|token| token.parse::<f64>().ok())
            .last()
            .unwrap_or(default)
    }

    /// Bullet lines that appeared under the given section label.
    pub fn bullets_under(&self, label: &str) -> Vec<String> {
        let wanted = normalize_label(label);
        self.bullets
            .iter()
            .filter(|(section, _)| section.as_deref() == Some(wanted.as_str()))
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// All bullet lines regardless of section.
    pub fn all_bullets(&self) -> Vec<String> {
        self.bullets.iter().map(|(_, text)| text.clone()).collect()
    }

    /// Whether no labels or bullets were recognized at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.bullets.is_empty()
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase().replace(' ', "_")
}

fn strip_bullet(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "• ", "-", "*", "•"] {
        if let Some(rest) = line.strip_prefix(marker) {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
    }
    None
}

fn split_label(line: &str) -> Option<(String, String)> {
    let (head, tail) = line.split_once(':')?;
    let head = head.trim();
    if head.is_empty() || head.len() > MAX_LABEL_LEN {
        return None;
    }
    if !head
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
    {
        return None;
    }
    Some((normalize_label(head), tail.trim().to_string()))
}

/// Clamp a unit-interval value into [0.0, 1.0].
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Clamp a debate score into [0.0, 100.0].
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Parse one advocate (or moderator) response into an [`Argument`].
///
/// `content` keeps the raw text verbatim; `EVIDENCE:` lines each contribute
/// one citation; `CONFIDENCE:` defaults to 0.7 and is clamped.
pub fn parse_argument(speaker: Speaker, raw: &str) -> Argument {
    let fields = RawFields::scan(raw);
    let confidence = clamp_unit(fields.numeric("CONFIDENCE", DEFAULT_CONFIDENCE));
    let evidence: Vec<String> = fields
        .values("EVIDENCE")
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Argument::new(speaker, raw.to_string(), evidence, confidence)
}

/// Parse one moderator fact-check response into a [`FactCheck`].
pub fn parse_fact_check(subject_speaker: Speaker, raw: &str) -> FactCheck {
    let fields = RawFields::scan(raw);
    let accuracy = clamp_unit(fields.numeric("ACCURACY_SCORE", DEFAULT_CONFIDENCE));
    FactCheck::new(subject_speaker, accuracy, raw.to_string())
}

/// Parse the judge's response into a [`Verdict`].
pub fn parse_verdict(raw: &str) -> Verdict {
    let fields = RawFields::scan(raw);

    let rec_text = fields
        .value("RECOMMENDATION")
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string());
    let recommendation = match_recommendation(&rec_text);

    let confidence = clamp_unit(fields.numeric("CONFIDENCE", DEFAULT_VERDICT_CONFIDENCE));
    let bull_score = clamp_score(fields.numeric("BULL_SCORE", DEFAULT_SCORE));
    let bear_score = clamp_score(fields.numeric("BEAR_SCORE", DEFAULT_SCORE));

    let summary = fields
        .value("SUMMARY")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string());

    let mut key_factors = fields.bullets_under("KEY_FACTORS");
    if key_factors.is_empty() {
        // Older responses bullet their factors without a section heading.
        key_factors = fields
            .all_bullets()
            .into_iter()
            .filter(|b| !fields.bullets_under("RISKS_TO_MONITOR").contains(b))
            .collect();
    }
    key_factors.truncate(5);
    if key_factors.is_empty() {
        key_factors.push("See detailed analysis in summary".to_string());
    }

    let mut risks = fields.bullets_under("RISKS_TO_MONITOR");
    risks.truncate(3);
    if risks.is_empty() {
        risks = vec!["Market volatility".to_string(), "Execution risk".to_string()];
    }

    Verdict {
        recommendation,
        confidence,
        summary,
        bull_score,
        bear_score,
        key_factors,
        risks,
        created_at: chrono::Utc::now(),
    }
}

/// Substring-match the five recommendation labels, most specific first so
/// `STRONG BUY` never falls through to `BUY`. Unmatched text holds.
fn match_recommendation(text: &str) -> Recommendation {
    let upper = text.to_uppercase();
    for rec in [
        Recommendation::StrongBuy,
        Recommendation::StrongSell,
        Recommendation::Buy,
        Recommendation::Sell,
        Recommendation::Hold,
    ] {
        if upper.contains(rec.label()) {
            return rec;
        }
    }
    Recommendation::Hold
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULL_RESPONSE: &str = "\
ARGUMENT: Revenue is accelerating on data-center demand.
EVIDENCE: Q2 revenue up 122% year over year
EVIDENCE: Analyst PT raised to $160
CONFIDENCE: 0.85 based on evidence strength
KEY_CATALYSTS: Next-gen product launch in Q4";

    #[test]
    fn tokenizer_captures_labels_and_values() {
        let fields = RawFields::scan(BULL_RESPONSE);
        assert_eq!(
            fields.value("argument"),
            Some("Revenue is accelerating on data-center demand.")
        );
        assert_eq!(fields.values("EVIDENCE").count(), 2);
        assert_eq!(fields.numeric("CONFIDENCE", 0.0), 0.85);
    }

    #[test]
    fn tokenizer_ignores_prose_colons() {
        let fields = RawFields::scan(
            "The outlook, as one analyst put it quite memorably last week: cloudy.\nCONFIDENCE: 0.6",
        );
        // The long prose prefix is not treated as a label.
        assert_eq!(fields.entries.len(), 1);
        assert_eq!(fields.numeric("CONFIDENCE", 0.0), 0.6);
    }

    #[test]
    fn tokenizer_attributes_bullets_to_sections() {
        let fields = RawFields::scan(
            "KEY_FACTORS:\n- growth\n- margins\nRISKS_TO_MONITOR:\n- valuation",
        );
        assert_eq!(fields.bullets_under("KEY_FACTORS"), vec!["growth", "margins"]);
        assert_eq!(fields.bullets_under("RISKS_TO_MONITOR"), vec!["valuation"]);
        assert_eq!(fields.all_bullets().len(), 3);
    }

    #[test]
    fn argument_extracts_overlay_and_keeps_raw() {
        let arg = parse_argument(Speaker::Bull, BULL_RESPONSE);
        assert_eq!(arg.speaker, Speaker::Bull);
        assert_eq!(arg.content, BULL_RESPONSE);
        assert_eq!(arg.evidence.len(), 2);
        assert_eq!(arg.confidence, 0.85);
    }

    #[test]
    fn argument_defaults_when_nothing_recognized() {
        let raw = "Just a free-form paragraph with no structure at all.";
        let arg = parse_argument(Speaker::Bear, raw);
        assert_eq!(arg.content, raw);
        assert!(arg.evidence.is_empty());
        assert_eq!(arg.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn confidence_out_of_range_is_clamped() {
        let arg = parse_argument(Speaker::Bull, "CONFIDENCE: 1.8");
        assert_eq!(arg.confidence, 1.0);
        let arg = parse_argument(Speaker::Bull, "CONFIDENCE: -0.3");
        assert_eq!(arg.confidence, 0.0);
    }

    #[test]
    fn malformed_confidence_keeps_default() {
        let arg = parse_argument(Speaker::Bull, "CONFIDENCE: [high]");
        assert_eq!(arg.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn fact_check_parses_accuracy() {
        let check = parse_fact_check(Speaker::Bear, "ACCURACY_SCORE: 0.4\nOverstated risk claims.");
        assert_eq!(check.subject_speaker, Speaker::Bear);
        assert_eq!(check.accuracy_score, 0.4);
        assert!(check.feedback.contains("Overstated"));
    }

    #[test]
    fn fact_check_defaults_on_garbage() {
        let check = parse_fact_check(Speaker::Bull, "no structure here");
        assert_eq!(check.accuracy_score, DEFAULT_CONFIDENCE);
        assert_eq!(check.feedback, "no structure here");
    }

    #[test]
    fn verdict_full_parse() {
        let raw = "\
RECOMMENDATION: STRONG BUY
CONFIDENCE: 0.9
BULL_SCORE: 82
BEAR_SCORE: 41
SUMMARY: Bull case is decisively stronger.
KEY_FACTORS:
- Data-center growth
- Margin expansion
RISKS_TO_MONITOR:
- Export controls
- Customer concentration";
        let verdict = parse_verdict(raw);
        assert_eq!(verdict.recommendation, Recommendation::StrongBuy);
        assert_eq!(verdict.confidence, 0.9);
        assert_eq!(verdict.bull_score, 82.0);
        assert_eq!(verdict.bear_score, 41.0);
        assert_eq!(verdict.summary, "Bull case is decisively stronger.");
        assert_eq!(verdict.key_factors.len(), 2);
        assert_eq!(verdict.risks, vec!["Export controls", "Customer concentration"]);
    }

    #[test]
    fn strong_buy_takes_precedence_over_buy() {
        let verdict = parse_verdict("RECOMMENDATION: STRONG BUY (not just a BUY)");
        assert_eq!(verdict.recommendation, Recommendation::StrongBuy);
        let verdict = parse_verdict("Both STRONG BUY and BUY appear in this text");
        assert_eq!(verdict.recommendation, Recommendation::StrongBuy);
    }

    #[test]
    fn strong_sell_takes_precedence_over_sell() {
        let verdict = parse_verdict("RECOMMENDATION: STRONG SELL");
        assert_eq!(verdict.recommendation, Recommendation::StrongSell);
    }

    #[test]
    fn empty_verdict_text_holds() {
        let verdict = parse_verdict("");
        assert_eq!(verdict.recommendation, Recommendation::Hold);
        assert_eq!(verdict.confidence, DEFAULT_VERDICT_CONFIDENCE);
        assert_eq!(verdict.bull_score, DEFAULT_SCORE);
        assert_eq!(verdict.bear_score, DEFAULT_SCORE);
        assert_eq!(verdict.key_factors, vec!["See detailed analysis in summary"]);
        assert_eq!(verdict.risks, vec!["Market volatility", "Execution risk"]);
    }

    #[test]
    fn verdict_scores_clamped() {
        let verdict = parse_verdict("BULL_SCORE: 140\nBEAR_SCORE: -10");
        assert_eq!(verdict.bull_score, 100.0);
        assert_eq!(verdict.bear_score, 0.0);
    }

    #[test]
    fn verdict_caps_list_lengths() {
        let raw = "\
KEY_FACTORS:
- a
- b
- c
- d
- e
- f
- g
RISKS_TO_MONITOR:
- r1
- r2
- r3
- r4";
        let verdict = parse_verdict(raw);
        assert_eq!(verdict.key_factors.len(), 5);
        assert_eq!(verdict.risks.len(), 3);
    }

    #[test]
    fn unsectioned_bullets_become_key_factors() {
        let verdict = parse_verdict("Some analysis.\n- first driver\n- second driver");
        assert_eq!(verdict.key_factors, vec!["first driver", "second driver"]);
        // Risks were never bulleted, so the placeholder pair applies.
        assert_eq!(verdict.risks.len(), 2);
    }

    #[test]
    fn summary_falls_back_to_full_text() {
        let raw = "RECOMMENDATION: HOLD\nNo summary label anywhere.";
        let verdict = parse_verdict(raw);
        assert_eq!(verdict.summary, raw);
    }
}
