//! Platform segments → Core content items.

use {
    corelink_platform::{MessageRecord, Segment},
    corelink_protocol::ContentItem,
    tracing::trace,
};

/// Encode a platform message.
///
/// `raw_text` is only consulted when the message carries no structured
/// segments at all; a message whose segments all drop encodes to nothing.
pub fn encode_message(segments: &[Segment], raw_text: &str) -> Vec<ContentItem> {
    if segments.is_empty() {
        if raw_text.is_empty() {
            return Vec::new();
        }
        return vec![ContentItem::text(raw_text)];
    }
    segments.iter().filter_map(encode_segment).collect()
}

/// Encode one segment, `None` when it has no Core representation.
pub fn encode_segment(segment: &Segment) -> Option<ContentItem> {
    match segment.kind.as_str() {
        "text" => segment.attr_str("text").map(ContentItem::text),
        "image" => {
            let source = segment
                .attr_str("url")
                .or_else(|| segment.attr_str("file"))
                .unwrap_or_default();
            Some(ContentItem::image(source))
        },
        "at" => segment.attr_string("qq").map(ContentItem::at),
        "reply" => segment.attr_string("id").map(ContentItem::reply),
        "face" => segment
            .attr_string("id")
            .map(|id| ContentItem::text(format!("[表情:{id}]"))),
        "record" => segment
            .attr_str("url")
            .or_else(|| segment.attr_str("file"))
            .map(ContentItem::record),
        "file" => {
            let name = segment
                .attr_str("name")
                .or_else(|| segment.attr_str("file"))
                .unwrap_or_default();
            let url = segment.attr_str("url").unwrap_or_default();
            Some(ContentItem::file(name, url))
        },
        other => {
            let text = segment.attr_str("text");
            if text.is_none() {
                trace!(kind = other, "dropping segment without text");
            }
            text.map(ContentItem::text)
        },
    }
}

/// Id of the message quoted by the first `reply` segment.
pub fn reply_target(segments: &[Segment]) -> Option<String> {
    segments
        .iter()
        .filter(|seg| seg.kind == "reply")
        .find_map(|seg| seg.attr_string("id"))
        .filter(|id| !id.is_empty())
}

/// Image items for every image in a quoted message.
pub fn quoted_images(record: &MessageRecord) -> Vec<ContentItem> {
    record
        .message
        .segments()
        .iter()
        .filter(|seg| seg.kind == "image")
        .filter_map(|seg| seg.attr_str("url"))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(ContentItem::image)
        .collect()
}
