//! Canonical deep links for source items.
//!
//! WeRead reader URLs embed an obfuscated token derived from the book id.
//! The token must match the platform byte for byte or the link 404s.

use md5::{Digest, Md5};
use shelf_sync_sources::LinkScheme;

/// Minimum token length before the trailing checksum is appended
const PADDED_LEN: usize = 20;

/// Ids are split into 9 digit chunks, each fits in a u64
const NUMERIC_CHUNK: usize = 9;

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Mode code and hex chunks for an id
fn encode_chunks(id: &str) -> (&'static str, Vec<String>) {
    if id.bytes().all(|b| b.is_ascii_digit()) {
        let chunks = id
            .as_bytes()
            .chunks(NUMERIC_CHUNK)
            .map(|chunk| {
                // Chunks are ASCII digits so the conversions cannot fail
                let digits = std::str::from_utf8(chunk).unwrap_or("0");
                format!("{:x}", digits.parse::<u64>().unwrap_or(0))
            })
            .collect();
        return ("3", chunks);
    }
    let hex: String = id.encode_utf16().map(|unit| format!("{:x}", unit)).collect();
    ("4", vec![hex])
}

/// Reader token for a WeRead book id
pub fn reader_token(id: &str) -> String {
    let digest = md5_hex(id);
    let (mode, chunks) = encode_chunks(id);

    let mut token = String::with_capacity(PADDED_LEN + 8);
    token.push_str(&digest[..3]);
    token.push_str(mode);
    token.push('2');
    token.push_str(&digest[digest.len() - 2..]);

    let encoded: Vec<String> = chunks
        .iter()
        .map(|chunk| format!("{:02x}{}", chunk.len(), chunk))
        .collect();
    token.push_str(&encoded.join("g"));

    if token.len() < PADDED_LEN {
        let missing = PADDED_LEN - token.len();
        token.push_str(&digest[..missing]);
    }

    let checksum = md5_hex(&token);
    token.push_str(&checksum[..3]);
    token
}

pub fn canonical_link(scheme: &LinkScheme, id: &str) -> String {
    match scheme {
        LinkScheme::ReaderToken { base } => format!("{}{}", base, reader_token(id)),
        LinkScheme::SubjectPath { base } => format!("{}{}/", base, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids() {
        assert_eq!(reader_token("695233"), "ce032b305a9bc1ce0b0dd2a");
        assert_eq!(reader_token("3300045678"), "547328e0813ab7857g018ee9");
        assert_eq!(reader_token("1234567890123456789"), "d7c329b0775bcd15g06bc614eg019204");
    }

    #[test]
    fn test_non_numeric_ids() {
        assert_eq!(
            reader_token("CB_3Vb6Cr4Mc7KT6yV6Ea"),
            "92c42152a43425f335662364372344d63374b543679563645614e6"
        );
        assert_eq!(
            reader_token("MP_WXS_3009300544"),
            "f8842d1224d505f5758535f333030393330303534342bc"
        );
    }

    #[test]
    fn test_mode_follows_character_class() {
        assert_eq!(&reader_token("695233")[3..4], "3");
        assert_eq!(&reader_token("MP_WXS_1")[3..4], "4");
    }

    #[test]
    fn test_short_tokens_are_padded_from_digest() {
        let token = reader_token("");
        assert_eq!(token, "d41327ed41d8cd98f00b86b");
        assert_eq!(token.len(), PADDED_LEN + 3);
        for id in ["1", "42", "695233", "x"] {
            assert!(reader_token(id).len() >= 23, "token for {} too short", id);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(reader_token("3300045678"), reader_token("3300045678"));
    }

    #[test]
    fn test_canonical_links() {
        let weread = LinkScheme::ReaderToken {
            base: "https://weread.qq.com/web/reader/".to_string(),
        };
        assert_eq!(
            canonical_link(&weread, "695233"),
            "https://weread.qq.com/web/reader/ce032b305a9bc1ce0b0dd2a"
        );
        let douban = LinkScheme::SubjectPath {
            base: "https://movie.douban.com/subject/".to_string(),
        };
        assert_eq!(
            canonical_link(&douban, "1292052"),
            "https://movie.douban.com/subject/1292052/"
        );
    }
}
