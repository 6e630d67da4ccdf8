//! Username derivation from display names.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Slug-shaped usernames: ASCII alphanumeric runs joined by single dots or dashes
pub static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+([.-][a-zA-Z0-9]+)*$").unwrap());

/// Fallback base when a name has no usable characters.
const EMPTY_SLUG: &str = "user";

/// Longest slug; leaves room in the 106-character column for a numeric suffix.
pub const MAX_SLUG_LEN: usize = 100;

/// ASCII spelling of letters NFKD leaves untouched.
fn transliterate(ch: char) -> Option<&'static str> {
    let ascii = match ch {
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ø' | 'Ø' => "o",
        'ß' => "ss",
        'ł' | 'Ł' => "l",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        'ı' => "i",
        _ => return None,
    };
    Some(ascii)
}

/// Point slug of a display name.
///
/// Diacritics are stripped through NFKD decomposition, a few letters are
/// transliterated and any other non-ASCII character is dropped. The result
/// is lowercase ASCII of at most [`MAX_SLUG_LEN`] bytes. Runs of other
/// characters collapse into one separator: a dot when the run contains a
/// dot, a dash otherwise. Separators never lead or trail.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_SLUG_LEN));
    let mut pending: Option<char> = None;

    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        let ascii = if ch.is_ascii_alphanumeric() {
            Some(ch.to_ascii_lowercase().to_string())
        } else {
            transliterate(ch).map(str::to_string)
        };

        match ascii {
            Some(part) => {
                if let Some(separator) = pending.take()
                    && !out.is_empty()
                {
                    out.push(separator);
                }
                out.push_str(&part);
                if out.len() >= MAX_SLUG_LEN {
                    break;
                }
            }
            None if ch == '.' => pending = Some('.'),
            None if ch.is_alphanumeric() => {}
            None => {
                if pending.is_none() {
                    pending = Some('-');
                }
            }
        }
    }

    out.truncate(MAX_SLUG_LEN);
    let trimmed = out.trim_end_matches(['-', '.']);

    if trimmed.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Username for a slug already used by `taken` accounts.
///
/// The first holder keeps the bare slug; the next get `slug1`, `slug2`, ...
pub fn username_candidate(slug: &str, taken: i64) -> String {
    if taken <= 0 {
        slug.to_string()
    } else {
        format!("{slug}{taken}")
    }
}
