//! Core content items → platform segments.

use {
    corelink_platform::Segment,
    corelink_protocol::{ContentItem, ContentKind, id_to_string},
    serde_json::Value,
    tracing::{debug, trace},
};

/// Sender shown on forward-message nodes built from `node` items.
pub const NODE_SENDER_ID: &str = "10000";
pub const NODE_SENDER_NAME: &str = "corelink";

const LINK_PREFIX: &str = "link://";

/// Decode a content list into platform segments, skipping anything that has
/// no platform representation.
pub fn decode_content(items: &[ContentItem]) -> Vec<Segment> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        decode_item(item, &mut out);
    }
    out
}

fn decode_item(item: &ContentItem, out: &mut Vec<Segment>) {
    if item.data.is_null() {
        return;
    }
    match item.content_kind() {
        ContentKind::Empty => {},
        ContentKind::Text => {
            if let Some(text) = item.as_str() {
                out.push(Segment::text(text));
            }
        },
        ContentKind::Image => {
            if let Some(source) = item.as_str() {
                let file = source.strip_prefix(LINK_PREFIX).unwrap_or(source);
                out.push(Segment::image(file));
            }
        },
        ContentKind::At => {
            if let Some(target) = id_to_string(&item.data) {
                out.push(Segment::at(target));
            }
        },
        ContentKind::Reply => {
            if let Some(id) = id_to_string(&item.data) {
                out.push(Segment::reply(id));
            }
        },
        ContentKind::Record => {
            if let Some(source) = item.as_str() {
                out.push(Segment::record(source));
            }
        },
        ContentKind::File => {
            if let Some(text) = item.as_str().and_then(file_text) {
                out.push(Segment::text(text));
            }
        },
        ContentKind::Markdown => {
            if let Some(text) = item.as_str() {
                out.push(Segment::text(text));
            }
        },
        ContentKind::Node => decode_node(&item.data, out),
        ContentKind::Unsupported => {
            debug!(kind = %item.kind, "dropping content kind unsupported by the platform");
        },
        ContentKind::Log(_) | ContentKind::Other(_) => match &item.data {
            Value::String(text) if !text.is_empty() => out.push(Segment::text(text.as_str())),
            _ => trace!(kind = %item.kind, "dropping unknown content kind"),
        },
    }
}

/// `"<name>|link://<url>"` → `"[文件: <name>] <url>"`, `"<name>|<other>"` →
/// `"[文件: <name>]"`.
fn file_text(payload: &str) -> Option<String> {
    let (name, rest) = payload.split_once('|')?;
    Some(match rest.strip_prefix(LINK_PREFIX) {
        Some(url) => format!("[文件: {name}] {url}"),
        None => format!("[文件: {name}]"),
    })
}

/// One forward node per sub-item; sub-items that decode to nothing are
/// skipped.
fn decode_node(data: &Value, out: &mut Vec<Segment>) {
    let Some(entries) = data.as_array() else {
        trace!("dropping node with non-array payload");
        return;
    };
    for entry in entries {
        let item = ContentItem::from_value(entry);
        let mut content = Vec::new();
        decode_item(&item, &mut content);
        if !content.is_empty() {
            out.push(Segment::node(NODE_SENDER_ID, NODE_SENDER_NAME, content));
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn item(value: Value) -> ContentItem {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case(json!({"type": "text", "data": "hi"}), vec![Segment::text("hi")])]
    #[case(
        json!({"type": "image", "data": "link://http://x/y.png"}),
        vec![Segment::image("http://x/y.png")]
    )]
    #[case(
        json!({"type": "image", "data": "base64://aGVsbG8="}),
        vec![Segment::image("base64://aGVsbG8=")]
    )]
    #[case(
        json!({"type": "image", "data": "https://x/y.png"}),
        vec![Segment::image("https://x/y.png")]
    )]
    #[case(json!({"type": "image", "data": "file:///tmp/a.png"}), vec![Segment::image("file:///tmp/a.png")])]
    #[case(json!({"type": "image", "data": ""}), vec![Segment::image("")])]
    #[case(json!({"type": "at", "data": "123"}), vec![Segment::at("123")])]
    #[case(json!({"type": "at", "data": 123}), vec![Segment::at("123")])]
    #[case(json!({"type": "reply", "data": "55"}), vec![Segment::reply("55")])]
    #[case(json!({"type": "record", "data": "base64://AAAA"}), vec![Segment::record("base64://AAAA")])]
    #[case(
        json!({"type": "file", "data": "report.pdf|link://http://x/r.pdf"}),
        vec![Segment::text("[文件: report.pdf] http://x/r.pdf")]
    )]
    #[case(
        json!({"type": "file", "data": "report.pdf|base64://AAAA"}),
        vec![Segment::text("[文件: report.pdf]")]
    )]
    #[case(json!({"type": "file", "data": "no-separator"}), vec![])]
    #[case(json!({"type": "markdown", "data": "**bold**"}), vec![Segment::text("**bold**")])]
    #[case(json!({"type": "buttons", "data": [[{"text": "ok"}]]}), vec![])]
    #[case(json!({"type": "image_size", "data": {"width": 1}}), vec![])]
    #[case(json!({"type": "template_markdown", "data": "x"}), vec![])]
    #[case(json!({"type": "group", "data": "1"}), vec![])]
    #[case(json!({"type": "sticker", "data": "smile"}), vec![Segment::text("smile")])]
    #[case(json!({"type": "sticker", "data": ""}), vec![])]
    #[case(json!({"type": "sticker", "data": {"id": 1}}), vec![])]
    #[case(json!({"type": "text", "data": null}), vec![])]
    #[case(json!({"type": "", "data": "orphan"}), vec![])]
    #[case(json!({"data": "orphan"}), vec![])]
    fn decode_item_mapping(#[case] input: Value, #[case] expected: Vec<Segment>) {
        assert_eq!(decode_content(&[item(input)]), expected);
    }

    #[test]
    fn node_with_two_items_yields_two_nodes() {
        let content = vec![ContentItem::node(vec![
            ContentItem::text("first"),
            ContentItem::image("link://http://x/a.png"),
        ])];

        let out = decode_content(&content);
        assert_eq!(
            out,
            vec![
                Segment::node(NODE_SENDER_ID, NODE_SENDER_NAME, vec![Segment::text("first")]),
                Segment::node(NODE_SENDER_ID, NODE_SENDER_NAME, vec![Segment::image(
                    "http://x/a.png"
                )]),
            ]
        );
    }

    #[test]
    fn node_skips_empty_and_malformed_entries() {
        let content = vec![item(json!({
            "type": "node",
            "data": [
                {"type": "buttons", "data": []},
                "not an item",
                {"type": null, "data": "untyped"},
                {"type": "text", "data": "kept"},
            ],
        }))];
        assert_eq!(decode_content(&content), vec![Segment::node(
            NODE_SENDER_ID,
            NODE_SENDER_NAME,
            vec![Segment::text("kept")]
        )]);
    }

    #[test]
    fn nested_node_recurses() {
        let inner = ContentItem::node(vec![ContentItem::text("deep")]);
        let outer = ContentItem::node(vec![inner]);
        let out = decode_content(&[outer]);

        let expected_inner =
            Segment::node(NODE_SENDER_ID, NODE_SENDER_NAME, vec![Segment::text("deep")]);
        assert_eq!(out, vec![Segment::node(
            NODE_SENDER_ID,
            NODE_SENDER_NAME,
            vec![expected_inner]
        )]);
    }

    #[test]
    fn failing_item_does_not_stop_the_rest() {
        let content = vec![
            ContentItem::text("a"),
            ContentItem::new("file", "broken"),
            ContentItem::new("template_buttons", "x"),
            ContentItem::at("9"),
        ];
        assert_eq!(decode_content(&content), vec![
            Segment::text("a"),
            Segment::at("9")
        ]);
    }
}
