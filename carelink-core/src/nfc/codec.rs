//! Tag message codec.
//!
//! Record kinds form a closed variant set decoded once at the platform
//! boundary, so downstream logic pattern-matches instead of comparing
//! strings.

/// Kind of an NDEF-style record within a tag message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRecordKind {
    /// A well-known URL record.
    Url,
    /// A plain text record.
    Text,
    /// Any record kind the portal does not consume.
    Other,
}

/// Typed, length-delimited data unit within a tag message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    kind: TagRecordKind,
    payload: Vec<u8>,
}

impl TagRecord {
    /// Build a record from its kind and raw payload bytes.
    pub fn new(kind: TagRecordKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Record kind.
    pub const fn kind(&self) -> TagRecordKind {
        self.kind
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }
}

/// A complete message read from a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMessage {
    records: Vec<TagRecord>,
}

impl TagMessage {
    /// Build a message from its records.
    pub fn new(records: Vec<TagRecord>) -> Self {
        Self { records }
    }

    /// Records in received order.
    pub fn records(&self) -> &[TagRecord] {
        self.records.as_slice()
    }
}

/// Text payload decoded from a `url` or `text` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    text: String,
}

impl DecodedPayload {
    /// Borrow the decoded text.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Consume the payload, yielding the decoded text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Decode a tag message into text payloads, one per `url`/`text` record
/// in record order.
///
/// Records of other kinds are silently skipped; that is the codec's one
/// deliberate non-error swallow. Payload bytes are decoded as UTF-8 with
/// invalid sequences replaced, matching the platform text decoder.
pub fn decode(message: &TagMessage) -> Vec<DecodedPayload> {
    message
        .records()
        .iter()
        .filter(|record| {
            matches!(record.kind(), TagRecordKind::Url | TagRecordKind::Text)
        })
        .map(|record| DecodedPayload {
            text: String::from_utf8_lossy(record.payload()).into_owned(),
        })
        .collect()
}

/// Encode outbound text as a single `url` record wrapping it verbatim.
///
/// No escaping or validation is performed; malformed URLs are the
/// caller's responsibility.
pub fn encode(text: &str) -> TagRecord {
    TagRecord::new(TagRecordKind::Url, text.as_bytes())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn url_record(text: &str) -> TagRecord {
        TagRecord::new(TagRecordKind::Url, text.as_bytes())
    }

    fn text_record(text: &str) -> TagRecord {
        TagRecord::new(TagRecordKind::Text, text.as_bytes())
    }

    #[rstest]
    fn decodes_url_and_text_records_in_order() {
        let message = TagMessage::new(vec![
            url_record("https://portal.example/login/patient?id=p-1"),
            text_record("hello"),
            url_record("https://portal.example/second"),
        ]);
        let payloads = decode(&message);
        let texts: Vec<&str> = payloads.iter().map(DecodedPayload::text).collect();
        assert_eq!(
            texts,
            vec![
                "https://portal.example/login/patient?id=p-1",
                "hello",
                "https://portal.example/second",
            ]
        );
    }

    #[rstest]
    fn skips_other_records_without_error() {
        let message = TagMessage::new(vec![
            TagRecord::new(TagRecordKind::Other, vec![0x00, 0x01]),
            text_record("kept"),
            TagRecord::new(TagRecordKind::Other, b"mime data".to_vec()),
        ]);
        let payloads = decode(&message);
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].text(), "kept");
    }

    #[rstest]
    fn empty_message_decodes_to_nothing() {
        assert!(decode(&TagMessage::new(Vec::new())).is_empty());
    }

    #[rstest]
    fn invalid_utf8_is_replaced_not_rejected() {
        let message = TagMessage::new(vec![TagRecord::new(
            TagRecordKind::Text,
            vec![0x68, 0x69, 0xFF],
        )]);
        let payloads = decode(&message);
        assert_eq!(payloads[0].text(), "hi\u{FFFD}");
    }

    #[rstest]
    #[case("https://portal.example/login/patient?id=p-1")]
    #[case("plain text, not a url")]
    #[case("")]
    fn encode_decode_round_trips(#[case] text: &str) {
        let record = encode(text);
        assert_eq!(record.kind(), TagRecordKind::Url);
        let payloads = decode(&TagMessage::new(vec![record]));
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].text(), text);
    }
}
