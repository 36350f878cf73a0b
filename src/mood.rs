//! Heuristic mood classifier for bot message metadata.
//!
//! Analyses assistant reply text and maps it to one of 8 moods with a
//! display emoji. Two classification layers:
//!
//! 1. **Explicit tag** — the LLM can prefix a reply with `[mood:happy]`
//!    for deterministic classification.
//! 2. **Keyword heuristic** — fast pattern scan over the text when no
//!    explicit tag is present.
//!
//! The classifier runs on the flush path, so it stays allocation-light and
//! bounded by a single lowercase pass over the reply.

/// Result of mood classification.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodResult {
    /// One of the 8 known moods:
    /// `neutral`, `happy`, `curious`, `caring`, `worried`, `focused`,
    /// `calm`, `playful`.
    pub mood: String,
    /// Display emoji mapped from the detected mood.
    pub emoji: Option<String>,
    /// Classification confidence in the range `0.0..=1.0`.
    pub confidence: f32,
}

/// Minimum confidence required to attach a mood to a message.
///
/// Below this threshold the message keeps its previous mood metadata,
/// preventing noise from short or ambiguous replies.
pub const CONFIDENCE_THRESHOLD: f32 = 0.3;

// ── Keyword tables ──────────────────────────────────────────────────────

/// (mood, keywords, emoji)
const MOOD_TABLE: &[(&str, &[&str], &str)] = &[
    (
        "happy",
        &[
            "great",
            "wonderful",
            "glad",
            "love",
            "fantastic",
            "excellent",
            "awesome",
            "delighted",
            "brilliant",
            "happy to",
        ],
        "😄",
    ),
    (
        "curious",
        &[
            "interesting",
            "tell me more",
            "wonder",
            "fascinating",
            "curious",
            "what if",
            "how does",
            "intriguing",
            "let's find out",
            "dig into",
        ],
        "🤔",
    ),
    (
        "caring",
        &[
            "understand",
            "sorry to hear",
            "here for you",
            "take care",
            "that sounds hard",
            "appreciate",
            "thinking of you",
            "support",
            "comfort",
            "gently",
        ],
        "🤗",
    ),
    (
        "worried",
        &[
            "careful",
            "warning",
            "unfortunately",
            "be aware",
            "caution",
            "risk",
            "danger",
            "worried",
            "issue",
            "problem",
        ],
        "😟",
    ),
    (
        "focused",
        &[
            "specifically",
            "exactly",
            "precisely",
            "step by step",
            "in detail",
            "technically",
            "the key point",
            "to clarify",
            "let me break",
            "implementation",
        ],
        "🧐",
    ),
    (
        "calm",
        &[
            "relax",
            "take your time",
            "no rush",
            "peaceful",
            "easy",
            "breathe",
            "settle",
            "steady",
            "quietly",
            "at your pace",
        ],
        "😌",
    ),
    (
        "playful",
        &[
            "haha", "fun", "joke", "silly", "laugh", "pun", "whimsy", "goofy", "playful", "cheeky",
        ],
        "😜",
    ),
];

/// Classify the emotional tone of assistant reply text.
///
/// Returns a [`MoodResult`] with the detected mood, display emoji, and
/// confidence score. The caller should check
/// [`confidence >= CONFIDENCE_THRESHOLD`](CONFIDENCE_THRESHOLD) before
/// attaching the result to a message.
///
/// # Priority
///
/// 1. Explicit `[mood:X]` tag at the start of the text → confidence 1.0.
/// 2. Keyword heuristic scan → confidence proportional to match density.
/// 3. Fallback → `neutral` with confidence 0.0.
pub fn classify(text: &str) -> MoodResult {
    // ── Layer 1: explicit tag ───────────────────────────────────────────
    if let Some(result) = try_parse_explicit_tag(text) {
        return result;
    }

    // ── Layer 2: keyword heuristic ──────────────────────────────────────
    let lower = text.to_lowercase();

    let mut best_mood = "neutral";
    let mut best_emoji: Option<&str> = None;
    let mut best_score: usize = 0;

    for &(mood, keywords, emoji) in MOOD_TABLE {
        let score: usize = keywords.iter().filter(|kw| lower.contains(*kw)).count();
        if score > best_score {
            best_score = score;
            best_mood = mood;
            best_emoji = Some(emoji);
        }
    }

    if best_score == 0 {
        return MoodResult {
            mood: "neutral".to_owned(),
            emoji: None,
            confidence: 0.0,
        };
    }

    // Confidence: scale by hit count with diminishing returns.
    // 1 hit → 0.35, 2 → 0.55, 3 → 0.70, 4+ → capped at 0.90.
    let confidence = match best_score {
        1 => 0.35,
        2 => 0.55,
        3 => 0.70,
        _ => (0.70 + 0.05 * (best_score as f32 - 3.0)).min(0.90),
    };

    MoodResult {
        mood: best_mood.to_owned(),
        emoji: best_emoji.map(|s| s.to_owned()),
        confidence,
    }
}

/// Strip an explicit `[mood:X]` tag from the start of the text, returning
/// the cleaned text (without the tag) and the tag value.
///
/// Returns `None` if no valid tag is found. Only recognises the 8 known
/// moods, so arbitrary bracketed reply prefixes pass through untouched.
pub fn strip_mood_tag(text: &str) -> Option<(String, String)> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix("[mood:")?;
    let end = rest.find(']')?;
    let tag_value = &rest[..end];

    if !is_known_mood(tag_value) {
        return None;
    }

    let cleaned = rest[end + 1..].trim_start().to_owned();
    Some((cleaned, tag_value.to_owned()))
}

/// Display emoji for a known mood name.
#[must_use]
pub fn emoji_for_mood(mood: &str) -> Option<&'static str> {
    for &(m, _, emoji) in MOOD_TABLE {
        if m == mood {
            return Some(emoji);
        }
    }
    None
}

// ── Internals ───────────────────────────────────────────────────────────

/// Known moods.
const KNOWN_MOODS: &[&str] = &[
    "neutral", "happy", "curious", "caring", "worried", "focused", "calm", "playful",
];

fn is_known_mood(s: &str) -> bool {
    KNOWN_MOODS.contains(&s)
}

fn try_parse_explicit_tag(text: &str) -> Option<MoodResult> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix("[mood:")?;
    let end = rest.find(']')?;
    let tag_value = &rest[..end];

    if !is_known_mood(tag_value) {
        return None;
    }

    Some(MoodResult {
        mood: tag_value.to_owned(),
        emoji: emoji_for_mood(tag_value).map(|s| s.to_owned()),
        confidence: 1.0,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────
