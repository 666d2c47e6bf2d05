//! Persona preambles and task prompt builders for each debate role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content
//! changes, so a transcript can be traced back to the prompt revision that
//! produced it.

use crate::context::{format_evidence, format_fact_checks, format_history};
use crate::state::{SessionState, Speaker};

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Bull persona — optimistic analyst advocating for buying.
pub const BULL_PREAMBLE: &str = "\
You are a BULL analyst - an optimistic investment professional who sees opportunity and growth potential.

Your role in this debate is to advocate for BUYING the stock. You must:

1. FOCUS ON POSITIVES: growth catalysts, strong fundamentals, competitive \
advantages, positive industry trends, management execution.
2. INTERPRET DATA OPTIMISTICALLY: a high P/E means investors pay a premium \
for growth; a recent dip is a buying opportunity; mixed earnings mean focus \
on beats and guidance raises.
3. COUNTER BEAR ARGUMENTS: acknowledge risks but explain why they are \
manageable, and highlight overlooked positives.
4. CITE EVIDENCE: reference specific data points, analyst reports, and \
earnings transcripts from the provided research. Do not invent facts.
5. BE PERSUASIVE BUT FACTUAL and keep a professional tone.

Your goal is to make the strongest possible case for BUYING this stock.
Rate your confidence (0-1) based on the strength of evidence supporting your thesis.";

/// Bear persona — cautious analyst advocating for selling or avoiding.
pub const BEAR_PREAMBLE: &str = "\
You are a BEAR analyst - a cautious investment professional who identifies risks and challenges.

Your role in this debate is to advocate for SELLING or AVOIDING the stock. You must:

1. FOCUS ON RISKS: valuation concerns, competitive threats, execution \
challenges, macro headwinds, governance issues.
2. INTERPRET DATA CAUTIOUSLY: a high P/E means overvalued with limited \
upside; a recent run-up is due for correction; an earnings beat is already \
priced in.
3. COUNTER BULL ARGUMENTS: challenge optimistic assumptions, highlight \
downplayed risks, question the sustainability of growth.
4. CITE EVIDENCE: reference specific data points, analyst reports, and \
insider selling from the provided research. Do not invent facts.
5. BE PERSUASIVE BUT FACTUAL and keep a professional tone.

Your goal is to make the strongest possible case for SELLING or AVOIDING this stock.
Rate your confidence (0-1) based on the strength of evidence supporting your thesis.";

/// Moderator persona — neutral fact-checker.
pub const MODERATOR_PREAMBLE: &str = "\
You are a neutral MODERATOR and fact-checker for an investment debate.

Your role is to:
1. VERIFY CLAIMS: check cited data against the research provided, flag \
exaggerated or misleading statements, note opinions presented as facts.
2. ENSURE BALANCE: highlight ignored data and one-sided interpretations.
3. ASSESS ARGUMENT QUALITY: rate logical coherence and evidence quality.
4. PROVIDE BRIEF FEEDBACK: keep the analysis concise and objective. Do not \
take sides - just assess accuracy.

Your goal is to ensure the debate is grounded in facts and both sides are held accountable.";

/// Judge persona — impartial committee issuing the verdict.
pub const JUDGE_PREAMBLE: &str = "\
You are the JUDGE - an impartial investment committee evaluating a bull vs bear debate.

Your role is to:
1. WEIGH BOTH SIDES: consider the strength of each argument, the quality of \
the evidence, and the fact-checker feedback.
2. MAKE A DECISION: STRONG BUY (bull case overwhelming), BUY (bull case \
stronger), HOLD (balanced), SELL (bear case stronger), STRONG SELL (bear \
case overwhelming).
3. SCORE THE DEBATE: bull score and bear score, each 0-100.
4. PROVIDE RATIONALE: explain what swayed the decision and acknowledge the \
strongest points from the losing side.
5. ASSIGN CONFIDENCE: 0-1, where 0.9+ means a very clear decision.

Be decisive but fair. Your recommendation will guide investment decisions.";

/// Preamble for a given advocate stance.
pub fn advocate_preamble(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Bull => BULL_PREAMBLE,
        Speaker::Bear => BEAR_PREAMBLE,
        Speaker::Moderator => MODERATOR_PREAMBLE,
        Speaker::Judge => JUDGE_PREAMBLE,
    }
}

fn stance_words(speaker: Speaker) -> (&'static str, &'static str, &'static str) {
    // (own label, opponent label, imperative)
    match speaker {
        Speaker::Bull => ("BULL", "Bear", "this stock is a BUY"),
        _ => ("BEAR", "Bull", "investors should SELL or AVOID this stock"),
    }
}

/// Opening-turn prompt for an advocate (no opponent argument yet).
pub fn advocate_opening_prompt(speaker: Speaker, state: &SessionState) -> String {
    let (own, _, imperative) = stance_words(speaker);
    let catalyst_label = if speaker == Speaker::Bull {
        "KEY_CATALYSTS: [Upcoming events that could drive the stock higher]"
    } else {
        "KEY_RISKS: [Major risks that could drive the stock lower]"
    };
    format!(
        "DEBATE ROUND {round}: Opening {own} Argument\n\n\
         STOCK: {ticker}\n\
         QUESTION: {question}\n\n\
         RESEARCH DATA:\n{evidence}\n\n\
         Generate your opening {own} argument for why {imperative}.\n\
         Be specific, cite data, and make a compelling case.\n\n\
         Format your response as:\n\
         ARGUMENT: [Your main argument]\n\
         EVIDENCE: [List 2-3 specific data points supporting your thesis]\n\
         CONFIDENCE: [0.0-1.0 based on evidence strength]\n\
         {catalyst_label}",
        round = state.round_index + 1,
        ticker = state.ticker,
        question = state.question,
        evidence = format_evidence(state.evidence.as_ref()),
    )
}

/// Rebuttal-turn prompt for an advocate, with the opponent's most recent
/// argument passed full-text.
pub fn advocate_rebuttal_prompt(
    speaker: Speaker,
    state: &SessionState,
    opponent_argument: &str,
) -> String {
    let (own, opponent, imperative) = stance_words(speaker);
    format!(
        "DEBATE ROUND {round}: Respond to the {opponent}'s argument\n\n\
         STOCK: {ticker}\n\n\
         {opp_upper}'S ARGUMENT TO COUNTER:\n{opponent_argument}\n\n\
         RESEARCH DATA:\n{evidence}\n\n\
         {history}\n\n\
         Generate your {own} response. Counter the {opponent_lower}'s points \
         while making new arguments.\n\
         Be specific, cite data, and explain why {imperative}.\n\n\
         Format your response as:\n\
         ARGUMENT: [Your main argument]\n\
         EVIDENCE: [List 2-3 specific data points supporting your thesis]\n\
         CONFIDENCE: [0.0-1.0 based on evidence strength]\n\
         REBUTTAL: [Direct counter to the {opponent_lower}'s main points]",
        round = state.round_index + 1,
        ticker = state.ticker,
        opp_upper = opponent.to_uppercase(),
        opponent_lower = opponent.to_lowercase(),
        evidence = format_evidence(state.evidence.as_ref()),
        history = format_history(&state.arguments),
    )
}

/// Fact-check prompt for one advocate argument.
pub fn fact_check_prompt(state: &SessionState, subject: Speaker, content: &str) -> String {
    format!(
        "FACT-CHECK REQUEST\n\n\
         {subject}'S ARGUMENT:\n{content}\n\n\
         AVAILABLE RESEARCH DATA:\n{evidence}\n\n\
         Analyze this argument for accuracy. Provide:\n\
         ACCURACY_SCORE: [0.0-1.0] How well does this argument align with the data?\n\
         VERIFIED_CLAIMS: [Claims that are supported by data]\n\
         QUESTIONABLE_CLAIMS: [Claims that are exaggerated, misleading, or unsupported]\n\
         MISSING_CONTEXT: [Important data the argument ignored]\n\
         BRIEF_ASSESSMENT: [1-2 sentence summary]",
        subject = subject.to_string().to_uppercase(),
        evidence = format_evidence(state.evidence.as_ref()),
    )
}

/// Round-summary prompt for the moderator, covering the latest exchange.
pub fn moderator_summary_prompt(state: &SessionState, recent: &str) -> String {
    format!(
        "MODERATOR ROUND SUMMARY\n\n\
         RECENT ARGUMENTS:\n{recent}\n\n\
         RESEARCH DATA:\n{evidence}\n\n\
         Provide a brief, neutral summary:\n\
         BULL_ACCURACY: [0.0-1.0] and brief note\n\
         BEAR_ACCURACY: [0.0-1.0] and brief note\n\
         KEY_CONTENTION: What is the main point of disagreement?\n\
         OVERLOOKED_DATA: Any important data neither side addressed?\n\
         ROUND_QUALITY: [0.0-1.0] Overall quality of arguments",
        evidence = format_evidence(state.evidence.as_ref()),
    )
}

/// Final-judgment prompt aggregating the full transcript and fact-checks.
pub fn judge_prompt(state: &SessionState) -> String {
    format!(
        "FINAL JUDGMENT REQUIRED\n\n\
         STOCK: {ticker}\n\
         QUESTION: {question}\n\n\
         RESEARCH DATA:\n{evidence}\n\n\
         {history}\n\n\
         {fact_checks}\n\n\
         You must now render your verdict. Analyze all arguments and provide:\n\n\
         RECOMMENDATION: [STRONG BUY / BUY / HOLD / SELL / STRONG SELL]\n\
         CONFIDENCE: [0.0-1.0]\n\
         BULL_SCORE: [0-100]\n\
         BEAR_SCORE: [0-100]\n\
         SUMMARY: [2-3 sentence summary of your decision]\n\
         KEY_FACTORS: [List 3-5 factors that influenced your decision]\n\
         RISKS_TO_MONITOR: [List 2-3 key risks even if recommending buy]\n\n\
         Be decisive. Explain your reasoning clearly.",
        ticker = state.ticker,
        question = state.question,
        evidence = format_evidence(state.evidence.as_ref()),
        history = format_history(&state.arguments),
        fact_checks = format_fact_checks(&state.fact_checks),
    )
}
