//! Small stateless helpers handlers use to inspect requests.

use axum::http::header::AUTHORIZATION;

use crate::http::request::HttpRequest;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const fn decode_table() -> [i8; 256] {
    let mut table = [-1i8; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as i8;
        i += 1;
    }
    table
}

static DECODE: [i8; 256] = decode_table();

/// Decode standard-alphabet base64.
///
/// Decoding stops at the first byte outside `A-Z a-z 0-9 + /`, which includes
/// `=` padding. Nothing is validated: leftover bits that do not fill a whole
/// byte are dropped, and malformed input yields whatever prefix decoded
/// cleanly.
pub fn base64_decode(input: impl AsRef<[u8]>) -> Vec<u8> {
    let input = input.as_ref();
    let mut out = Vec::with_capacity(input.len() / 4 * 3 + 2);

    let mut acc: u32 = 0;
    let mut bits: i32 = -8;
    for &c in input {
        let value = DECODE[c as usize];
        if value < 0 {
            break;
        }
        acc = (acc << 6) | value as u32;
        bits += 6;
        if bits >= 0 {
            out.push((acc >> bits) as u8);
            bits -= 8;
        }
    }
    out
}

/// Credentials from an `Authorization: Basic ...` header.
///
/// Returns `None` when the header is missing, uses another scheme, does not
/// decode to UTF-8, or has no `:` separator.
pub fn basic_auth(request: &HttpRequest<'_>) -> Option<(String, String)> {
    let value = request.header(AUTHORIZATION.as_str())?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = String::from_utf8(base64_decode(encoded.trim())).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, Version};

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(base64_decode("").is_empty());
    }

    #[test]
    fn decodes_known_vectors() {
        assert_eq!(base64_decode("TWFu"), b"Man");
        assert_eq!(base64_decode("aGVsbG8gd29ybGQh"), b"hello world!");
        assert_eq!(base64_decode("+/+/"), [0xfb, 0xff, 0xbf]);
    }

    #[test]
    fn padding_ends_decoding() {
        assert_eq!(base64_decode("TWE="), b"Ma");
        assert_eq!(base64_decode("TQ=="), b"M");
    }

    #[test]
    fn stops_at_first_invalid_character() {
        // "TWFu" + '!' + "TWFu": only the prefix before '!' counts.
        assert_eq!(base64_decode("TWFu!TWFu"), b"Man");
        // Five valid characters carry 30 bits, enough for three bytes.
        assert_eq!(base64_decode("TWFuT*"), b"Man");
    }

    #[test]
    fn trailing_partial_bits_are_dropped() {
        // A single character carries only 6 bits: no whole byte.
        assert!(base64_decode("T").is_empty());
        assert_eq!(base64_decode("TW"), b"M");
    }

    fn request_with_auth<'a>(
        method: &'a Method,
        headers: &'a HeaderMap,
    ) -> HttpRequest<'a> {
        HttpRequest::new(method, "/", Version::HTTP_11, headers, b"")
    }

    #[test]
    fn basic_auth_extracts_credentials() {
        let mut headers = HeaderMap::new();
        // "user:pass"
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        let method = Method::GET;
        let req = request_with_auth(&method, &headers);
        assert_eq!(
            basic_auth(&req),
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    #[test]
    fn basic_auth_rejects_other_schemes_and_missing_header() {
        let method = Method::GET;
        let empty = HeaderMap::new();
        assert_eq!(basic_auth(&request_with_auth(&method, &empty)), None);

        let mut bearer = HeaderMap::new();
        bearer.insert(AUTHORIZATION, HeaderValue::from_static("Bearer dXNlcjpwYXNz"));
        assert_eq!(basic_auth(&request_with_auth(&method, &bearer)), None);

        let mut no_colon = HeaderMap::new();
        // "userpass"
        no_colon.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcnBhc3M="));
        assert_eq!(basic_auth(&request_with_auth(&method, &no_colon)), None);
    }
}
