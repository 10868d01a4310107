use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UUID_V4: Regex = Regex::new(
        r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$"
    )
    .unwrap();
}

/// Returns a fresh random token identifier in hyphenated UUIDv4 form.
pub fn next_jti() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}

/// Reports whether `jti` is a hyphenated UUIDv4, case-insensitive.
pub fn is_uuid_v4(jti: &str) -> bool {
    UUID_V4.is_match(jti)
}
