//! Message text normalization helpers.

/// Strip leading speaker-attribution prefixes from a message.
///
/// LLM replies sometimes echo the transcript format and open with
/// `"{name}:"`. Both the user and bot names are stripped, repeatedly, so
/// `"Aria: Aria: hi"` collapses to `"hi"`. Text without a name prefix is
/// returned unchanged, including leading whitespace, since streamed
/// fragments may start mid-sentence.
#[must_use]
pub fn strip_names_from_message(message: &str, user_name: &str, bot_name: &str) -> String {
    let mut rest = message;
    loop {
        match strip_one_prefix(rest, user_name).or_else(|| strip_one_prefix(rest, bot_name)) {
            Some(tail) => rest = tail,
            None => return rest.to_owned(),
        }
    }
}

/// Strip a single `"{name}:"` prefix (with optional surrounding spaces).
///
/// Returns `None` when the message does not start with the given name
/// followed by a colon.
fn strip_one_prefix<'a>(message: &'a str, name: &str) -> Option<&'a str> {
    if name.is_empty() {
        return None;
    }
    let tail = message.trim_start().strip_prefix(name)?;
    let tail = tail.trim_start().strip_prefix(':')?;
    Some(tail.strip_prefix(' ').unwrap_or(tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_name_prefix() {
        assert_eq!(strip_names_from_message("Aria: hello", "User", "Aria"), "hello");
    }

    #[test]
    fn strips_user_name_prefix() {
        assert_eq!(strip_names_from_message("User: hi there", "User", "Aria"), "hi there");
    }

    #[test]
    fn strips_repeated_prefixes() {
        assert_eq!(strip_names_from_message("Aria: Aria: hi", "User", "Aria"), "hi");
    }

    #[test]
    fn strips_mixed_prefixes() {
        assert_eq!(strip_names_from_message("User: Aria: hi", "User", "Aria"), "hi");
    }

    #[test]
    fn leaves_unprefixed_text_untouched() {
        assert_eq!(
            strip_names_from_message("  plain fragment", "User", "Aria"),
            "  plain fragment"
        );
    }

    #[test]
    fn name_in_the_middle_is_preserved() {
        assert_eq!(
            strip_names_from_message("ask Aria: later", "User", "Aria"),
            "ask Aria: later"
        );
    }

    #[test]
    fn colon_with_space_before_is_stripped() {
        assert_eq!(strip_names_from_message("Aria : hello", "User", "Aria"), "hello");
    }

    #[test]
    fn empty_names_never_strip() {
        assert_eq!(strip_names_from_message(": odd", "", ""), ": odd");
    }
}
