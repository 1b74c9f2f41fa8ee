//! HTTP Basic authorization header handling
//!
//! The password is never validated here. The remote endpoint does that when
//! the handshake probe is issued; this module only needs the principal name
//! for display and auditing.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

/// Placeholder principal when the username cannot be derived from the header
pub const UNKNOWN_USERNAME: &str = "<unknown>";

const BASIC_SCHEME: &str = "Basic";

/// Standard alphabet, `=` padding optional on decode
const TOKEN_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Extract the username from an HTTP Basic `Authorization` header value.
///
/// Returns `None` for empty input, a non-Basic scheme, a token that is not
/// valid base64, or decoded credentials without a `:` separator. The token is
/// decoded as ISO-8859-1, one byte per character.
pub fn username_from_header(authorization: &str) -> Option<String> {
    let header = authorization.trim();
    let (scheme, token) = header.split_once(char::is_whitespace)?;
    let token = token.trim();

    if token.is_empty() || !scheme.trim().eq_ignore_ascii_case(BASIC_SCHEME) {
        return None;
    }

    let bytes = TOKEN_DECODER.decode(token).ok()?;
    let decoded: String = bytes.iter().map(|&b| char::from(b)).collect();

    decoded
        .split_once(':')
        .map(|(username, _)| username.to_string())
}

/// Build a Basic `Authorization` header value for a username/password pair
pub fn basic_header(username: &str, password: &str) -> String {
    let token = STANDARD.encode(format!("{}:{}", username, password));
    format!("{} {}", BASIC_SCHEME, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_extracts_username() {
        assert_eq!(
            username_from_header(&encode("weblogic:welcome1")),
            Some("weblogic".to_string())
        );
        // Same credentials without the trailing `=` padding
        assert_eq!(
            username_from_header("Basic d2VibG9naWM6d2VsY29tZTE"),
            Some("weblogic".to_string())
        );
    }

    #[test]
    fn test_password_with_colons() {
        assert_eq!(
            username_from_header(&encode("operator:pa:ss:word")),
            Some("operator".to_string())
        );
    }

    #[test]
    fn test_empty_password_and_username() {
        assert_eq!(username_from_header(&encode("admin:")), Some("admin".to_string()));
        assert_eq!(username_from_header(&encode(":secret")), Some(String::new()));
    }

    #[test]
    fn test_scheme_is_case_insensitive_and_trimmed() {
        let token = STANDARD.encode("alice:pw");
        assert_eq!(
            username_from_header(&format!("  basic   {}  ", token)),
            Some("alice".to_string())
        );
        assert_eq!(
            username_from_header(&format!("BASIC {}", token)),
            Some("alice".to_string())
        );
    }

    #[test]
    fn test_latin1_decoding() {
        // 0xE9 is 'é' in ISO-8859-1 and is not valid UTF-8 on its own
        let token = STANDARD.encode([b'r', 0xE9, b'n', b'e', b':', b'x']);
        assert_eq!(
            username_from_header(&format!("Basic {}", token)),
            Some("réne".to_string())
        );
    }

    #[test]
    fn test_malformed_headers_are_absent() {
        let cases = [
            String::new(),
            "   ".to_string(),
            "Basic".to_string(),
            "Basic    ".to_string(),
            format!("Bearer {}", STANDARD.encode("user:pass")),
            "Basic not*base64!".to_string(),
            encode("no-separator"),
            STANDARD.encode("user:pass"),
        ];

        for case in cases {
            assert_eq!(username_from_header(&case), None, "header: {:?}", case);
        }
    }

    #[test]
    fn test_basic_header_roundtrip() {
        let header = basic_header("monitor", "s3:cret");
        assert!(header.starts_with("Basic "));
        assert_eq!(username_from_header(&header), Some("monitor".to_string()));
    }
}
