//! Query-string escaping compatible with KDNiao's payload encoding.
//!
//! Push bodies carry `RequestData` escaped a second time inside the form, and
//! print tokens sign an escaped copy of the order list. Both use the query
//! escaping convention: space as `+`, unreserved bytes verbatim, everything
//! else as uppercase `%XX`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

/// Bytes escaped by [`query_escape`]: everything except `A-Z a-z 0-9 - _ . ~`.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors from [`query_unescape`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnescapeError {
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    #[error("unescaped data is not valid UTF-8")]
    InvalidUtf8,
}

/// Escape `input` for use in a query string.
pub fn query_escape(input: &str) -> String {
    input
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Reverse [`query_escape`].
///
/// Unlike a lenient percent-decoder, a `%` not followed by two hex digits is
/// rejected rather than passed through.
pub fn query_unescape(input: &str) -> Result<String, UnescapeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map(|pair| pair.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(UnescapeError::InvalidEscape(
                    String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UnescapeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_escape_json() {
        let escaped = query_escape(r#"[{"OrderCode":"012657700387","PortName":"Printer 1"}]"#);
        assert_eq!(
            escaped,
            "%5B%7B%22OrderCode%22%3A%22012657700387%22%2C%22PortName%22%3A%22Printer+1%22%7D%5D"
        );
    }

    #[test]
    fn test_query_escape_unreserved() {
        assert_eq!(query_escape("aZ09-_.~"), "aZ09-_.~");
        assert_eq!(query_escape("a*b/c"), "a%2Ab%2Fc");
        assert_eq!(query_escape("中"), "%E4%B8%AD");
    }

    #[test]
    fn test_query_unescape() {
        assert_eq!(
            query_unescape("%7B%22State%22%3A%223%22%7D").unwrap(),
            r#"{"State":"3"}"#
        );
        assert_eq!(query_unescape("a+b%20c").unwrap(), "a b c");
        assert_eq!(query_unescape("plain").unwrap(), "plain");
    }

    #[test]
    fn test_query_unescape_reverses_escape() {
        let original = r#"{"AcceptStation":"深圳市 福田区","Remark":"100%"}"#;
        assert_eq!(query_unescape(&query_escape(original)).unwrap(), original);
    }

    #[test]
    fn test_query_unescape_invalid_escape() {
        assert!(matches!(
            query_unescape("%zz"),
            Err(UnescapeError::InvalidEscape(_))
        ));
        assert!(matches!(
            query_unescape("abc%4"),
            Err(UnescapeError::InvalidEscape(_))
        ));
        assert!(matches!(
            query_unescape("%"),
            Err(UnescapeError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_query_unescape_invalid_utf8() {
        assert_eq!(query_unescape("%FF%FE"), Err(UnescapeError::InvalidUtf8));
    }
}
