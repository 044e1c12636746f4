//! Name Sanitization
//!
//! Clamps tag and attribute names to a restricted ASCII subset of XML Names:
//!   first:  [A-Za-z_]
//!   rest:   [A-Za-z0-9_.-]
//!
//! Bytes are inspected one at a time without UTF-8 decoding, so multi-byte
//! sequences are replaced byte by byte.

use memchr::memchr;

#[inline]
fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_')
}

#[inline]
fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.')
}

/// Sanitize a name in place, replacing illegal bytes with `_`.
///
/// Returns the length, which never changes. Empty input is left untouched.
pub fn sanitize_name(name: &mut [u8]) -> usize {
    let Some((first, rest)) = name.split_first_mut() else {
        return 0;
    };
    if !is_name_start(*first) {
        *first = b'_';
    }
    for b in rest.iter_mut() {
        if !is_name_char(*b) {
            *b = b'_';
        }
    }
    name.len()
}

/// Split `prefix:local` at the first colon.
///
/// Returns `None` when there is no colon or nothing follows it.
#[inline]
pub fn split_prefix(name: &[u8]) -> Option<(&[u8], &[u8])> {
    let colon = memchr(b':', name)?;
    if colon + 1 >= name.len() {
        return None;
    }
    Some((&name[..colon], &name[colon + 1..]))
}

/// Replace the first colon with `_`, used when a prefix cannot be bound.
#[inline]
pub fn flatten_prefix(name: &mut [u8]) {
    if let Some(colon) = memchr(b':', name) {
        name[colon] = b'_';
    }
}

/// View name bytes as text, replacing invalid UTF-8.
#[inline]
pub fn name_str(name: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitized(s: &[u8]) -> Vec<u8> {
        let mut v = s.to_vec();
        sanitize_name(&mut v);
        v
    }

    #[test]
    fn test_valid_names_unchanged() {
        assert_eq!(sanitized(b"div"), b"div");
        assert_eq!(sanitized(b"_x-1.y"), b"_x-1.y");
        assert_eq!(sanitized(b"data-foo_bar"), b"data-foo_bar");
    }

    #[test]
    fn test_bad_first_byte() {
        assert_eq!(sanitized(b"1abc"), b"_abc");
        assert_eq!(sanitized(b"-x"), b"_x");
        assert_eq!(sanitized(b".x"), b"_x");
    }

    #[test]
    fn test_bad_inner_bytes() {
        assert_eq!(sanitized(b"a b"), b"a_b");
        assert_eq!(sanitized(b"a:b"), b"a_b");
        assert_eq!(sanitized(b"x\"y<z"), b"x_y_z");
    }

    #[test]
    fn test_multibyte_mangled_bytewise() {
        // "é" is two bytes in UTF-8, each replaced
        let out = sanitized("caf\u{e9}".as_bytes());
        assert_eq!(out, b"caf__");
    }

    #[test]
    fn test_empty() {
        let mut v: Vec<u8> = Vec::new();
        assert_eq!(sanitize_name(&mut v), 0);
        assert!(v.is_empty());
    }

    #[test]
    fn test_length_unchanged() {
        let mut v = b"9 lives!".to_vec();
        assert_eq!(sanitize_name(&mut v), 8);
    }

    #[test]
    fn test_idempotent() {
        let inputs: [&[u8]; 6] = [b"", b"ok", b"9x", b"a b:c", "\u{2603}snow".as_bytes(), b"\x00\xff"];
        for input in inputs {
            let once = sanitized(input);
            let twice = sanitized(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_split_prefix() {
        assert_eq!(split_prefix(b"my:custom"), Some((&b"my"[..], &b"custom"[..])));
        assert_eq!(split_prefix(b"plain"), None);
        assert_eq!(split_prefix(b"trailing:"), None);
        assert_eq!(split_prefix(b":lead"), Some((&b""[..], &b"lead"[..])));
    }

    #[test]
    fn test_flatten_prefix() {
        let mut v = b"foo:bar:baz".to_vec();
        flatten_prefix(&mut v);
        assert_eq!(v, b"foo_bar:baz");
    }
}
