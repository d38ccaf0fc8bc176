// crates/core/src/intent.rs
//! Homework-intent classifier.
//!
//! Scores a single user message for "answer-seeking" vs
//! "learning-seeking" language. The patterns are a declarative rule
//! table (pattern → family → weight) so they can be tested and extended
//! independently of the scoring algorithm.
//!
//! The tie-break is deliberately asymmetric: any learning-intent match
//! suppresses the answer-seeking verdict entirely, even when several
//! answer patterns also fire. Ambiguous requests are treated as
//! learning rather than blocking a legitimate learner.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which pattern family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFamily {
    AnswerSeeking,
    LearningSeeking,
}

/// One entry in the rule table.
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    /// Stable label reported in `IntentVerdict::matched_patterns`.
    pub label: &'static str,
    pub family: PatternFamily,
    pub pattern: &'static str,
    pub weight: u32,
}

const fn rule(label: &'static str, family: PatternFamily, pattern: &'static str) -> IntentRule {
    IntentRule {
        label,
        family,
        pattern,
        weight: 1,
    }
}

/// The rule table. Patterns are data: adding a rule never touches the
/// scoring control flow.
pub const RULES: &[IntentRule] = &[
    // Answer-seeking: direct-answer requests
    rule(
        "direct-answer-request",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(give|tell)\s+me\s+the\s+(answer|solution)s?\b",
    ),
    rule(
        "just-the-answer",
        PatternFamily::AnswerSeeking,
        r"(?i)\bjust\s+(the\s+)?(answer|solution)s?\b",
    ),
    rule(
        "whats-the-answer",
        PatternFamily::AnswerSeeking,
        r"(?i)\bwhat('s| is)\s+the\s+(final\s+)?(answer|solution)\b",
    ),
    rule(
        "do-it-for-me",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(do|solve|write|finish)\s+(it|this|that|my\s+\w+)\s+for\s+me\b",
    ),
    // Answer-seeking: exam/cheat phrasing
    rule(
        "exam-question",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(exam|test|quiz|midterm|final)\s+question\b",
    ),
    rule(
        "graded-work",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(this\s+is\s+)?(on|for)\s+(my|the|an?)\s+(exam|test|quiz|assignment|homework)\b",
    ),
    // Answer-seeking: copy/paste requests
    rule(
        "copy-paste",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(copy|paste)\b.*\b(answer|solution|submit)\b",
    ),
    rule(
        "submittable-output",
        PatternFamily::AnswerSeeking,
        r"(?i)\b(something|it)\s+i\s+can\s+(just\s+)?(submit|turn\s+in|hand\s+in)\b",
    ),
    // Answer-seeking: urgency-under-deadline phrasing
    rule(
        "deadline-pressure",
        PatternFamily::AnswerSeeking,
        r"(?i)\bdue\s+(tonight|today|tomorrow|in\s+an?\s+hour|in\s+\d+\s+(minutes|hours))\b",
    ),
    rule(
        "no-time-to-learn",
        PatternFamily::AnswerSeeking,
        r"(?i)\bno\s+time\s+to\s+(learn|study|understand)\b",
    ),
    // Learning-seeking: explain/understand requests
    rule(
        "help-understand",
        PatternFamily::LearningSeeking,
        r"(?i)\bhelp\s+me\s+(understand|learn|figure)\b",
    ),
    rule(
        "explain",
        PatternFamily::LearningSeeking,
        r"(?i)\b(explain|clarify)\b",
    ),
    rule(
        "understand",
        PatternFamily::LearningSeeking,
        r"(?i)\b(understand|understanding)\b",
    ),
    // Learning-seeking: step-by-step / method requests
    rule(
        "step-by-step",
        PatternFamily::LearningSeeking,
        r"(?i)\bstep[\s-]by[\s-]step\b",
    ),
    rule(
        "walk-through",
        PatternFamily::LearningSeeking,
        r"(?i)\bwalk\s+me\s+through\b",
    ),
    rule(
        "method-approach",
        PatternFamily::LearningSeeking,
        r"(?i)\b(method|approach|technique|concept)\b",
    ),
    // Learning-seeking: why/how questions
    rule("why-question", PatternFamily::LearningSeeking, r"(?i)\bwhy\b"),
    rule(
        "how-question",
        PatternFamily::LearningSeeking,
        r"(?i)\bhow\s+(do|does|did|can|could|would|should)\b",
    ),
    rule(
        "what-does-mean",
        PatternFamily::LearningSeeking,
        r"(?i)\bwhat\s+does\b.*\bmean\b",
    ),
    // Learning-seeking: expressions of confusion
    rule(
        "confusion",
        PatternFamily::LearningSeeking,
        r"(?i)\b(confused|confusing|stuck|lost)\b",
    ),
    rule(
        "dont-get-it",
        PatternFamily::LearningSeeking,
        r"(?i)\b(don't|dont|do\s+not)\s+(get|understand|follow)\b",
    ),
];

struct CompiledRule {
    label: &'static str,
    family: PatternFamily,
    weight: u32,
    regex: Regex,
}

/// Compile the rule table once. A rule that fails to compile is dropped
/// with a warning rather than taking the classifier down — this layer
/// is advisory and must fail open.
fn compiled_rules() -> &'static [CompiledRule] {
    static COMPILED: OnceLock<Vec<CompiledRule>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|r| match Regex::new(r.pattern) {
                Ok(regex) => Some(CompiledRule {
                    label: r.label,
                    family: r.family,
                    weight: r.weight,
                    regex,
                }),
                Err(e) => {
                    tracing::warn!(label = r.label, error = %e, "Dropping unparseable intent rule");
                    None
                }
            })
            .collect()
    })
}

/// Classifier confidence in an answer-seeking verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// The classifier's judgment on a single message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentVerdict {
    pub is_answer_seeking: bool,
    pub confidence: Confidence,
    /// Labels of the rules that matched, both families, in table order.
    pub matched_patterns: Vec<String>,
}

impl IntentVerdict {
    /// Directive to prepend to the response-generation instructions when
    /// the verdict is positive. This engine only produces the directive;
    /// the response layer owns the model call.
    pub fn guard_directive(&self) -> Option<&'static str> {
        if !self.is_answer_seeking {
            return None;
        }
        match self.confidence {
            Confidence::High => Some(
                "The student is asking for a direct answer to what appears to be \
                 graded work. Do not provide the final answer. Guide them through \
                 the underlying concept with questions and worked analogies instead.",
            ),
            Confidence::Medium => Some(
                "The student may be asking for a direct answer rather than help \
                 learning. Prefer explaining the approach over stating the result, \
                 and check what they have tried so far.",
            ),
            Confidence::Low => None,
        }
    }
}

/// Score a message against the rule table.
///
/// `is_answer_seeking` is true only when at least one answer-seeking rule
/// matches and no learning-seeking rule does. Confidence is `High` at two
/// or more unsuppressed answer matches, `Medium` at exactly one, `Low`
/// otherwise (including every suppressed case).
pub fn classify_intent(message: &str) -> IntentVerdict {
    let mut answer_score: u32 = 0;
    let mut learning_score: u32 = 0;
    let mut matched_patterns = Vec::new();

    for rule in compiled_rules() {
        if rule.regex.is_match(message) {
            match rule.family {
                PatternFamily::AnswerSeeking => answer_score += rule.weight,
                PatternFamily::LearningSeeking => learning_score += rule.weight,
            }
            matched_patterns.push(rule.label.to_string());
        }
    }

    let is_answer_seeking = answer_score > 0 && learning_score == 0;
    let confidence = if is_answer_seeking && answer_score >= 2 {
        Confidence::High
    } else if is_answer_seeking {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    IntentVerdict {
        is_answer_seeking,
        confidence,
        matched_patterns,
    }
}
