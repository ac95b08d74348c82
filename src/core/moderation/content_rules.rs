// Content rules - sanitization, blocked phrases, pattern checks and spam scoring.
//
// Everything here is a pure function over text so the gate in
// moderation_service.rs stays small and these can be tested directly.

use super::moderation_models::{ContentCategory, ModerationIssue};
use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url pattern"));
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email pattern")
});
// ASCII word boundaries: a digit run next to a non-ASCII letter still counts
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[0-9]{3}[-.]?[0-9]{3}[-.]?[0-9]{4}(?-u:\b)")
        .expect("valid phone pattern")
});

/// Share of uppercase letters above which content counts as shouting.
const CAPS_RATIO: f64 = 0.7;
/// A run of this many identical characters counts as repetition.
const REPEAT_RUN: usize = 5;

/// Blocked phrases for a category, matched as lowercase substrings.
pub fn blocked_phrases(category: ContentCategory) -> &'static [&'static str] {
    match category {
        ContentCategory::Harmful => &[
            "suicide", "kill", "die", "death", "harm", "hurt", "abuse", "abusive", "abusing",
            "abused",
        ],
        ContentCategory::Spam => &[
            "buy now",
            "click here",
            "limited time",
            "act now",
            "make money",
            "earn money",
            "work from home",
            "discount",
            "offer",
            "promotion",
            "sale",
        ],
        ContentCategory::Inappropriate => &[
            "porn",
            "sex",
            "nude",
            "naked",
            "explicit",
            "adult content",
            "xxx",
        ],
        ContentCategory::HateSpeech => &[
            "hate",
            "racist",
            "racism",
            "sexist",
            "sexism",
            "homophobic",
            "transphobic",
            "bigot",
        ],
    }
}

/// Strip unsafe markup, keeping harmless inline formatting.
pub fn sanitize(raw: &str) -> String {
    ammonia::clean(raw)
}

/// Check sanitized text against blocked phrases and contact/link patterns.
///
/// Returns one issue per matching phrase plus at most one issue per pattern.
pub fn check_content(content: &str) -> Vec<ModerationIssue> {
    let lower = content.to_lowercase();
    let mut issues = Vec::new();

    for category in ContentCategory::ALL {
        for phrase in blocked_phrases(category) {
            if lower.contains(phrase) {
                issues.push(ModerationIssue::new(
                    category,
                    format!("Contains blocked word: {}", phrase),
                ));
            }
        }
    }

    let patterns: [(&Regex, &str); 3] = [
        (&URL_PATTERN, "Contains URL"),
        (&EMAIL_PATTERN, "Contains email address"),
        (&PHONE_PATTERN, "Contains phone number"),
    ];
    for (pattern, reason) in patterns {
        if pattern.is_match(content) {
            issues.push(ModerationIssue::new(ContentCategory::Spam, reason));
        }
    }

    issues
}

/// Additive spam heuristic in the range `0.0..=1.0`.
///
/// Lengths and runs are measured in UTF-16 code units, the way browsers
/// measure the text, so astral characters such as emoji count twice.
pub fn spam_score(content: &str) -> f64 {
    let mut score = 0.0;
    let lower = content.to_lowercase();

    let total_units = content.encode_utf16().count();
    let caps = content.chars().filter(|c| c.is_ascii_uppercase()).count();
    if caps as f64 > total_units as f64 * CAPS_RATIO {
        score += 0.3;
    }

    if has_repeated_run(content, REPEAT_RUN) {
        score += 0.2;
    }

    let spam_hits = blocked_phrases(ContentCategory::Spam)
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .count();
    score += spam_hits as f64 * 0.1;

    let url_count = URL_PATTERN.find_iter(content).count();
    if url_count > 0 {
        score += (url_count as f64 * 0.2).min(0.4);
    }

    score.min(1.0)
}

/// True when some UTF-16 code unit (other than a line break) repeats `run` times in a row.
fn has_repeated_run(content: &str, run: usize) -> bool {
    let mut previous: Option<u16> = None;
    let mut length = 0;

    for c in content.encode_utf16() {
        if is_line_break(c) {
            previous = None;
            length = 0;
            continue;
        }
        if previous == Some(c) {
            length += 1;
        } else {
            previous = Some(c);
            length = 1;
        }
        if length >= run {
            return true;
        }
    }

    false
}

fn is_line_break(unit: u16) -> bool {
    matches!(unit, 0x000A | 0x000D | 0x2028 | 0x2029)
}
