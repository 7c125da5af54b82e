//! Content translation between the two protocols.
//!
//! Everything here is a pure function over borrowed input: no I/O, no
//! shared state. A segment or item that cannot be translated is dropped and
//! the rest of the message continues.

pub mod decode;
pub mod encode;
pub mod remote_log;

pub use {
    decode::{NODE_SENDER_ID, NODE_SENDER_NAME, decode_content},
    encode::{encode_message, encode_segment, quoted_images, reply_target},
    remote_log::{RemoteLog, RemoteLogLevel, remote_log},
};

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        corelink_platform::Segment,
        corelink_protocol::ContentItem,
        rstest::rstest,
    };

    #[rstest]
    #[case("hello")]
    #[case("")]
    #[case("多行\n文本 with spaces  ")]
    fn text_round_trip(#[case] text: &str) {
        let items = encode_message(&[Segment::text(text)], "");
        assert_eq!(items, vec![ContentItem::text(text)]);

        let back = decode_content(&items);
        assert_eq!(back, vec![Segment::text(text)]);
    }

    #[test]
    fn raw_text_round_trip() {
        let items = encode_message(&[], "hello");
        let back = decode_content(&items);
        assert_eq!(back, vec![Segment::text("hello")]);
    }
}
