//! Document model tests.

use super::{Document, MutationRecord, NodeKind, ParseError};

#[test]
fn parse_and_serialize_round_trip() {
    let html = r#"<div id="chat"><p class="message">Hi <b>there</b><br>friend</p><!-- note --></div>"#;
    let doc = Document::parse(html).unwrap();
    assert_eq!(doc.inner_html(doc.root()), html);
}

#[test]
fn text_is_escaped_on_serialize() {
    let doc = Document::parse("<p>a &lt; b &amp;&amp; c &gt; d</p>").unwrap();
    let p = doc.children(doc.root())[0];
    assert_eq!(doc.text_content(p), "a < b && c > d");
    assert_eq!(doc.inner_html(p), "a &lt; b &amp;&amp; c &gt; d");
}

#[test]
fn lone_angle_bracket_is_text() {
    let doc = Document::parse("<p>x<=0 and 1 < 2</p>").unwrap();
    let p = doc.children(doc.root())[0];
    assert_eq!(doc.text_content(p), "x<=0 and 1 < 2");
    assert_eq!(doc.inner_html(p), "x&lt;=0 and 1 &lt; 2");
}

#[test]
fn attributes_are_escaped_on_serialize() {
    let mut doc = Document::new();
    let a = doc.create_element("a");
    doc.set_attribute(a, "title", r#"say "hi" & go"#);
    assert_eq!(
        doc.outer_html(a),
        r#"<a title="say &quot;hi&quot; &amp; go"></a>"#
    );
}

#[test]
fn raw_text_elements_are_verbatim() {
    let html = "<script>if (a < b && c) { x = \"</p>\"; }</script><p>ok</p>";
    let doc = Document::parse(html).unwrap();
    let script = doc.children(doc.root())[0];
    assert_eq!(doc.tag(script), Some("script"));
    assert_eq!(doc.text_content(script), "if (a < b && c) { x = \"</p>\"; }");
    assert_eq!(doc.inner_html(doc.root()), html);
}

#[test]
fn unclosed_elements_close_at_end() {
    let doc = Document::parse("<div><p>open").unwrap();
    assert_eq!(doc.inner_html(doc.root()), "<div><p>open</p></div>");
}

#[test]
fn end_tag_closes_inner_open_elements() {
    let doc = Document::parse("<div><span>a</div>b").unwrap();
    assert_eq!(doc.inner_html(doc.root()), "<div><span>a</span></div>b");
}

#[test]
fn unexpected_end_tag_is_error() {
    let err = Document::parse("<p>a</span></p>").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnexpectedEndTag {
            tag: "span".to_string(),
            offset: 4
        }
    );
}

#[test]
fn unterminated_tag_and_comment_are_errors() {
    assert!(matches!(
        Document::parse("<p class=\"x>text"),
        Err(ParseError::UnterminatedTag { offset: 0 })
    ));
    assert!(matches!(
        Document::parse("ok <!-- never closed"),
        Err(ParseError::UnterminatedComment { offset: 3 })
    ));
}

#[test]
fn nesting_limit_is_enforced() {
    let html = "<span>".repeat(super::MAX_DEPTH + 1);
    assert_eq!(
        Document::parse(&html).unwrap_err(),
        ParseError::NestingTooDeep {
            limit: super::MAX_DEPTH
        }
    );
    let html = "<span>".repeat(super::MAX_DEPTH);
    assert!(Document::parse(&html).is_ok());
}

#[test]
fn element_by_id_and_classes() {
    let doc = Document::parse(r#"<main><div id="chat" class="box  wide"></div></main>"#).unwrap();
    let chat = doc.element_by_id("chat").unwrap();
    assert!(doc.has_class(chat, "box"));
    assert!(doc.has_class(chat, "wide"));
    assert!(!doc.has_class(chat, "bo"));
    assert!(doc.element_by_id("missing").is_none());
}

#[test]
fn descendants_in_document_order() {
    let doc = Document::parse("<a><b>1</b><c>2</c></a><d></d>").unwrap();
    let tags: Vec<String> = doc
        .descendants(doc.root())
        .into_iter()
        .map(|n| match doc.kind(n) {
            NodeKind::Element { tag, .. } => tag.clone(),
            NodeKind::Text(t) => t.clone(),
            _ => String::new(),
        })
        .collect();
    assert_eq!(tags, vec!["a", "b", "1", "c", "2", "d"]);
}

#[test]
fn set_inner_html_keeps_element_identity() {
    let mut doc = Document::parse(r#"<div id="m">old</div>"#).unwrap();
    let m = doc.element_by_id("m").unwrap();
    doc.set_inner_html(m, "<em>new</em>").unwrap();
    assert_eq!(doc.element_by_id("m"), Some(m));
    assert_eq!(doc.inner_html(m), "<em>new</em>");
}

#[test]
fn set_inner_html_error_leaves_node_untouched() {
    let mut doc = Document::parse(r#"<div id="m">old</div>"#).unwrap();
    let m = doc.element_by_id("m").unwrap();
    assert!(doc.set_inner_html(m, "</b>").is_err());
    assert_eq!(doc.inner_html(m), "old");
}

#[test]
fn observer_sees_subtree_additions_only() {
    let mut doc = Document::parse(r#"<div id="chat"><div id="inner"></div></div><div id="other"></div>"#)
        .unwrap();
    let chat = doc.element_by_id("chat").unwrap();
    let inner = doc.element_by_id("inner").unwrap();
    let other = doc.element_by_id("other").unwrap();
    let obs = doc.observe(chat);

    let a = doc.create_element("p");
    doc.append_child(inner, a);
    let b = doc.create_element("p");
    doc.append_child(other, b);
    doc.remove_child(inner, a);

    assert!(doc.has_pending_records());
    assert_eq!(
        doc.take_records(obs),
        vec![MutationRecord {
            target: inner,
            added: vec![a]
        }]
    );
    assert!(doc.take_records(obs).is_empty());
    assert!(!doc.has_pending_records());
}

#[test]
fn set_inner_html_reports_new_children() {
    let mut doc = Document::parse(r#"<div id="chat"><p id="m">x</p></div>"#).unwrap();
    let chat = doc.element_by_id("chat").unwrap();
    let m = doc.element_by_id("m").unwrap();
    let obs = doc.observe(chat);
    doc.set_inner_html(m, "a<b>c</b>").unwrap();
    let records = doc.take_records(obs);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].target, m);
    assert_eq!(records[0].added, doc.children(m).to_vec());
}

#[test]
fn parse_detached_does_not_touch_tree() {
    let mut doc = Document::parse(r#"<div id="chat"></div>"#).unwrap();
    let chat = doc.element_by_id("chat").unwrap();
    let obs = doc.observe(chat);
    let frag = doc.parse_detached("<p>scratch</p>").unwrap();
    assert_eq!(doc.parent(frag), None);
    assert_eq!(doc.inner_html(frag), "<p>scratch</p>");
    assert_eq!(doc.inner_html(doc.root()), r#"<div id="chat"></div>"#);
    assert!(doc.take_records(obs).is_empty());
}
