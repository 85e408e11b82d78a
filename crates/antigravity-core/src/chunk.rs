//! Splitting long text into transport-sized pieces.

/// Maximum characters in a single Telegram message.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Split `text` into chunks of at most `max_chars` characters.
///
/// A chunk ends after the last newline in its second half when there is
/// one, otherwise exactly at `max_chars`. Splits always fall on char
/// boundaries and concatenating the chunks yields the original text.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset just past the `max_chars`-th character.
        let hard_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);

        if hard_end == rest.len() {
            chunks.push(rest.to_string());
            break;
        }

        let window = &rest[..hard_end];
        let split_at = window
            .rfind('\n')
            .filter(|&nl| window[..nl].chars().count() >= max_chars / 2)
            .map_or(hard_end, |nl| nl + 1);

        chunks.push(rest[..split_at].to_string());
        rest = &rest[split_at..];
    }

    chunks
}
