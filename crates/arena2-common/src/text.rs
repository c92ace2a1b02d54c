//! String reading policies shared by [`BinaryReader`](crate::BinaryReader)
//! and [`SourceReader`](crate::SourceReader).
//!
//! Legacy strings are single-byte text. Bytes that do not decode are logged
//! and produce an empty string instead of an error.

use memchr::memchr;

/// Decode legacy text, yielding an empty string on failure.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                len = bytes.len(),
                "undecodable string bytes, using empty string"
            );
            String::new()
        }
    }
}

/// Null-terminated string at the front of `window`.
///
/// Returns the text and the number of bytes consumed (terminator included).
/// End of data terminates the string when no null byte is present.
pub(crate) fn cstring(window: &[u8]) -> (String, usize) {
    match memchr(0, window) {
        Some(null_pos) => (decode_text(&window[..null_pos]), null_pos + 1),
        None => (decode_text(window), window.len()),
    }
}

/// Fixed-length string with every embedded null dropped.
///
/// Returns `None` when `length` exceeds the window.
pub(crate) fn fixed_string(window: &[u8], length: usize) -> Option<String> {
    if length > window.len() {
        return None;
    }
    let bytes: Vec<u8> = window[..length].iter().copied().filter(|&b| b != 0).collect();
    Some(decode_text(&bytes))
}

/// Bounded null-terminated string followed by an unconditional skip.
///
/// Reads up to `max_len` bytes (`0` means unbounded) stopping at a null. If
/// no null was found and `max_len` is zero the text is truncated to `skip`
/// bytes. Returns `None` when either length exceeds the window, in which case
/// the caller leaves its cursor where it was.
pub(crate) fn cstring_skip(window: &[u8], max_len: usize, skip: usize) -> Option<String> {
    if skip > window.len() || max_len > window.len() {
        return None;
    }

    let limit = if max_len == 0 { window.len() } else { max_len };
    let text = match memchr(0, &window[..limit]) {
        Some(null_pos) => &window[..null_pos],
        None if max_len == 0 => &window[..skip],
        None => &window[..limit],
    };

    Some(decode_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cstring_consumes_terminator() {
        assert_eq!(cstring(b"abc\0def"), ("abc".to_string(), 4));
        assert_eq!(cstring(b"abc"), ("abc".to_string(), 3));
    }

    #[test]
    fn test_fixed_string_drops_inner_nulls() {
        assert_eq!(fixed_string(b"ab\0cd\0\0", 7).as_deref(), Some("abcd"));
        assert_eq!(fixed_string(b"ab", 3), None);
    }

    #[test]
    fn test_cstring_skip_stops_at_null() {
        assert_eq!(cstring_skip(b"NAME\0\0\0\0xxxx", 8, 8).as_deref(), Some("NAME"));
    }

    #[test]
    fn test_cstring_skip_unbounded_truncates_to_skip() {
        assert_eq!(cstring_skip(b"ABCDEFGHIJ", 0, 4).as_deref(), Some("ABCD"));
    }

    #[test]
    fn test_cstring_skip_out_of_range_is_none() {
        assert_eq!(cstring_skip(b"ABC", 0, 8), None);
        assert_eq!(cstring_skip(b"ABC", 8, 2), None);
    }

    #[test]
    fn test_invalid_text_is_empty() {
        assert_eq!(decode_text(&[0xff, 0xfe]), "");
    }
}
