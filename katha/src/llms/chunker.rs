//! Splits narration text into request-sized pieces.

/// Characters that end a clause. The Devanagari danda closes Hindi sentences.
const BREAKS: &[char] = &['.', '!', '?', ';', ':', ',', '\n', '\u{0964}', '\u{2026}'];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Each cut prefers the last clause break inside the window, then the last
/// whitespace, and only then splits mid-word. Chunks are trimmed and never
/// empty. Blank input yields no chunks.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let Some((limit, _)) = rest.char_indices().nth(max_chars) else {
            chunks.push(rest.to_owned());
            break;
        };

        let window = &rest[..limit];
        let cut = window
            .rfind(BREAKS)
            .map(|i| i + window[i..].chars().next().map_or(1, char::len_utf8))
            .or_else(|| window.rfind(char::is_whitespace).filter(|&i| i > 0))
            .unwrap_or(limit);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            chunks.push(head.to_owned());
        }
        rest = tail.trim_start();
    }

    chunks
}
