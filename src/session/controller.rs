//! Append-vs-mutate decisions for streamed conversation updates.
//!
//! The controller is a pure policy over the history store: it never
//! schedules ticks and never touches view state. Callers translate the
//! returned [`UpdateOutcome`] into view events (scroll scheduling,
//! append/update notifications).

use crate::config::AssistantConfig;
use crate::mood;
use crate::session::history::ConversationHistory;
use crate::session::messages::Message;
use crate::text::strip_names_from_message;
use chrono::Utc;

/// What a single apply pass did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new entry was appended with this sequence id.
    Appended(u64),
    /// The open tail bot message was rewritten in place.
    Updated(u64),
    /// Nothing to do: empty text, or content already present at the tail.
    Unchanged,
}

/// Decides, per combined text, whether to append a new history entry or
/// rewrite the open bot message at the tail.
#[derive(Debug, Clone)]
pub struct StreamController {
    user_name: String,
    bot_name: String,
    mood_enabled: bool,
}

impl StreamController {
    /// Build a controller from the assistant configuration.
    #[must_use]
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            user_name: config.identity.user_name.clone(),
            bot_name: config.identity.bot_name.clone(),
            mood_enabled: config.mood.enabled,
        }
    }

    /// Apply one combined text to the history.
    ///
    /// `first_message` marks whole-unit inserts (user prompts, loaded
    /// entries); streamed continuations pass `false` and rewrite the open
    /// tail bot message when one exists. For streamed bot text,
    /// `combined_text` must be the cumulative reply so far, because
    /// rewriting replaces the tail content outright.
    ///
    /// Empty text is "nothing to update": no mutation, no append. Text
    /// identical to a same-kind tail entry is dropped, which keeps
    /// overlapping flush/final-marker deliveries from duplicating bot
    /// messages.
    pub fn apply(
        &self,
        history: &mut ConversationHistory,
        speaker_name: &str,
        combined_text: &str,
        is_bot: bool,
        first_message: bool,
    ) -> UpdateOutcome {
        let base = if first_message {
            combined_text.trim_start()
        } else {
            combined_text
        };
        let mut normalized = strip_names_from_message(base, &self.user_name, &self.bot_name);

        let mut explicit_mood = None;
        if is_bot {
            if let Some((cleaned, tag)) = mood::strip_mood_tag(&normalized) {
                normalized = cleaned;
                explicit_mood = Some(tag);
            }
        }

        if normalized.is_empty() {
            return UpdateOutcome::Unchanged;
        }

        if let Some(last) = history.last() {
            if last.is_bot == is_bot && last.content == normalized {
                return UpdateOutcome::Unchanged;
            }
        }

        let (mood, mood_emoji) = self.mood_for(is_bot, explicit_mood.as_deref(), &normalized);

        if is_bot && !first_message {
            if let Some(tail) = history.open_tail_mut() {
                tail.content = normalized;
                // Refresh mood only when the grown reply classifies with
                // enough confidence; otherwise keep what we had.
                if mood.is_some() {
                    tail.mood = mood;
                    tail.mood_emoji = mood_emoji;
                }
                return UpdateOutcome::Updated(tail.sequence_id);
            }
        }

        let sequence_id = history.next_sequence_id();
        let message = Message {
            speaker_name: speaker_name.to_owned(),
            content: normalized,
            is_bot,
            sequence_id,
            conversation_id: history.conversation_id(),
            mood,
            mood_emoji,
            timestamp: Utc::now(),
        };
        if is_bot && !first_message {
            history.push_open(message);
        } else {
            history.push(message);
        }
        UpdateOutcome::Appended(sequence_id)
    }

    fn mood_for(
        &self,
        is_bot: bool,
        explicit: Option<&str>,
        content: &str,
    ) -> (Option<String>, Option<String>) {
        if !is_bot || !self.mood_enabled {
            return (None, None);
        }
        if let Some(tag) = explicit {
            return (
                Some(tag.to_owned()),
                mood::emoji_for_mood(tag).map(|s| s.to_owned()),
            );
        }
        let result = mood::classify(content);
        if result.confidence >= mood::CONFIDENCE_THRESHOLD {
            (Some(result.mood), result.emoji)
        } else {
            (None, None)
        }
    }
}
