//! Base-32 secret handling.

use base32::Alphabet;

/// Decode a base-32 secret (with or without spaces/dashes/padding,
/// case-insensitive). Returns `None` when the text is not valid base-32,
/// including lengths that leave a partial trailing group.
pub fn decode(b32: &str) -> Option<Vec<u8>> {
    let cleaned: String = b32
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect::<String>()
        .to_uppercase();
    let unpadded = cleaned.trim_end_matches('=');
    if !unpadded.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7')) {
        return None;
    }
    if matches!(unpadded.len() % 8, 1 | 3 | 6) {
        return None;
    }
    base32::decode(Alphabet::Rfc4648 { padding: false }, unpadded)
}

/// Encode raw bytes to base-32 (no padding, uppercase).
pub fn encode(bytes: &[u8]) -> String {
    base32::encode(Alphabet::Rfc4648 { padding: false }, bytes)
}
