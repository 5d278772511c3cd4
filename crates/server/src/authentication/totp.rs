//! RFC 6238 time-based one-time passwords (HMAC-SHA1, 6 digits, 30s steps).

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use url::form_urlencoded::byte_serialize;

use crate::random::base32_decode;

pub const DIGITS: u32 = 6;
pub const PERIOD_SECONDS: i64 = 30;
pub const ISSUER: &str = "todo";

/// Codes from one step either side of the current one are accepted.
const ALLOWED_SKEW: i64 = 1;

fn code_for_counter(key: &[u8], counter: u64) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset]) & 0x7f) << 24
        | u32::from(digest[offset + 1]) << 16
        | u32::from(digest[offset + 2]) << 8
        | u32::from(digest[offset + 3]);

    format!(
        "{:0width$}",
        binary % 10u32.pow(DIGITS),
        width = DIGITS as usize
    )
}

fn counter_at(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(PERIOD_SECONDS)
}

/// The code for a base32 `secret` at `unix_seconds`, or `None` if the secret
/// isn't valid base32.
pub fn generate_code(secret: &str, unix_seconds: i64) -> Option<String> {
    let key = base32_decode(secret)?;
    Some(code_for_counter(&key, counter_at(unix_seconds) as u64))
}

pub fn current_code(secret: &str) -> Option<String> {
    generate_code(secret, OffsetDateTime::now_utc().unix_timestamp())
}

/// Checks `code` against the steps around `unix_seconds` in constant time.
pub fn verify_code_at(secret: &str, code: &str, unix_seconds: i64) -> bool {
    let Some(key) = base32_decode(secret) else {
        return false;
    };
    if code.len() != DIGITS as usize {
        return false;
    }

    let counter = counter_at(unix_seconds);
    (-ALLOWED_SKEW..=ALLOWED_SKEW)
        .filter_map(|skew| u64::try_from(counter + skew).ok())
        .any(|c| bool::from(code_for_counter(&key, c).as_bytes().ct_eq(code.as_bytes())))
}

pub fn verify_code(secret: &str, code: &str) -> bool {
    verify_code_at(secret, code, OffsetDateTime::now_utc().unix_timestamp())
}

/// `otpauth://` URI for enrolling `secret` in an authenticator app.
pub fn provisioning_uri(account: &str, secret: &str) -> String {
    let issuer: String = byte_serialize(ISSUER.as_bytes()).collect();
    let account: String = byte_serialize(account.as_bytes()).collect();
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}&digits={DIGITS}&period={PERIOD_SECONDS}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::base32_encode;

    // RFC 6238 appendix B, SHA1 variant, truncated to six digits.
    const RFC_SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn matches_rfc6238_vectors() {
        let secret = base32_encode(RFC_SECRET);
        assert_eq!(generate_code(&secret, 59).unwrap(), "287082");
        assert_eq!(generate_code(&secret, 1111111109).unwrap(), "081804");
        assert_eq!(generate_code(&secret, 1234567890).unwrap(), "005924");
        assert_eq!(generate_code(&secret, 2000000000).unwrap(), "279037");
    }

    #[test]
    fn accepts_adjacent_steps_only() {
        let secret = base32_encode(RFC_SECRET);
        let code = generate_code(&secret, 1111111109).unwrap();
        assert!(verify_code_at(&secret, &code, 1111111109));
        assert!(verify_code_at(&secret, &code, 1111111109 + PERIOD_SECONDS));
        assert!(!verify_code_at(&secret, &code, 1111111109 + 3 * PERIOD_SECONDS));
    }

    #[test]
    fn rejects_malformed_input() {
        let secret = base32_encode(RFC_SECRET);
        assert!(!verify_code_at(&secret, "12345", 59));
        assert!(!verify_code_at("not base32!", "287082", 59));
        assert!(generate_code("not base32!", 59).is_none());
    }

    #[test]
    fn provisioning_uri_escapes_account() {
        let uri = provisioning_uri("jane doe", "ABC");
        assert_eq!(
            uri,
            "otpauth://totp/todo:jane+doe?secret=ABC&issuer=todo&digits=6&period=30"
        );
    }
}
