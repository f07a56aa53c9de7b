//! Wire encoding of the client-held assignment token
//!
//! A token is a list of `<test-set-id>:<payload>` entries joined by `|`. The
//! payload is URL-safe unpadded base64 of one byte per variable, or `-` for an
//! explicit "none". Decoding never fails: the token is client input, so
//! anything malformed is dropped entry by entry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tracing::debug;

use crate::domain::experiment::TestSetId;
use crate::domain::exposure::AssignmentToken;

const ENTRY_SEPARATOR: &str = "|";
const KEY_SEPARATOR: char = ':';
const NONE_PAYLOAD: &str = "-";

/// Encoder/decoder for [`AssignmentToken`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StickyAssignmentCodec;

impl StickyAssignmentCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode a token, entries in test set order
    pub fn encode(&self, token: &AssignmentToken) -> String {
        token
            .entries()
            .map(|(id, indices)| format!("{}{}{}", id, KEY_SEPARATOR, self.encode_payload(indices)))
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }

    /// Decode a token, skipping entries that do not parse
    pub fn decode(&self, raw: &str) -> AssignmentToken {
        let mut token = AssignmentToken::new();

        for entry in raw.split(ENTRY_SEPARATOR).filter(|e| !e.is_empty()) {
            let Some((key, payload)) = entry.split_once(KEY_SEPARATOR) else {
                debug!(entry, "Skipping token entry without separator");
                continue;
            };

            let Ok(test_set_id) = TestSetId::new(key) else {
                debug!(entry, "Skipping token entry with invalid test set id");
                continue;
            };

            match self.decode_payload(payload) {
                Some(indices) => token.set(test_set_id, indices),
                None => debug!(entry, "Skipping token entry with invalid payload"),
            }
        }

        token
    }

    /// Encode one combination, `None` as the explicit "none" marker.
    ///
    /// Output length depends only on the number of variables.
    pub fn encode_payload(&self, indices: Option<&[u8]>) -> String {
        match indices {
            Some(indices) => URL_SAFE_NO_PAD.encode(indices),
            None => NONE_PAYLOAD.to_string(),
        }
    }

    /// Decode one payload: `Some(None)` for "none", `None` when malformed
    pub fn decode_payload(&self, payload: &str) -> Option<Option<Vec<u8>>> {
        if payload == NONE_PAYLOAD {
            return Some(None);
        }

        match URL_SAFE_NO_PAD.decode(payload) {
            Ok(bytes) if !bytes.is_empty() => Some(Some(bytes)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> TestSetId {
        TestSetId::new(value).unwrap()
    }

    #[test]
    fn test_encode_token() {
        let codec = StickyAssignmentCodec::new();
        let token = AssignmentToken::new()
            .with_entry(id("hero-test"), Some(vec![1, 0]))
            .with_entry(id("cta-test"), None);

        assert_eq!(codec.encode(&token), "cta-test:-|hero-test:AQA");
    }

    #[test]
    fn test_decode_token() {
        let codec = StickyAssignmentCodec::new();
        let token = codec.decode("cta-test:-|hero-test:AQA");

        assert_eq!(token.get(&id("hero-test")), Some(Some(&[1u8, 0][..])));
        assert_eq!(token.get(&id("cta-test")), Some(None));
    }

    #[test]
    fn test_payload_length_is_fixed_per_variable_count() {
        let codec = StickyAssignmentCodec::new();

        let low = codec.encode_payload(Some(&[0, 0, 0]));
        let high = codec.encode_payload(Some(&[255, 254, 253]));
        assert_eq!(low.len(), high.len());
        assert_eq!(low.len(), 4);
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let codec = StickyAssignmentCodec::new();
        let token = codec.decode("garbage|bad id:AA|hero-test:!!|cta-test:AQ|empty-test:");

        assert_eq!(token.len(), 1);
        assert_eq!(token.get(&id("cta-test")), Some(Some(&[1u8][..])));
    }

    #[test]
    fn test_decode_empty_string() {
        let codec = StickyAssignmentCodec::new();
        assert!(codec.decode("").is_empty());
    }

    #[test]
    fn test_duplicate_entries_last_wins() {
        let codec = StickyAssignmentCodec::new();
        let token = codec.decode("hero-test:AA|hero-test:Ag");

        assert_eq!(token.get(&id("hero-test")), Some(Some(&[2u8][..])));
    }
}
