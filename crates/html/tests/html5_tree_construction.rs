use html::{parse_document, NodeData, NodeId};

fn child_elements<'a>(
    doc: &'a html::Document,
    atoms: &'a html::html5::AtomTable,
    id: NodeId,
) -> Vec<&'a str> {
    doc.node(id)
        .children
        .iter()
        .filter_map(|&child| doc.element_name(child, atoms))
        .collect()
}

#[test]
fn parse_document_produces_html_head_body_skeleton() {
    let (doc, atoms) = parse_document(b"<!DOCTYPE html><html><head></head><body></body></html>");
    let html = doc.html.expect("document should have an html element");
    assert_eq!(child_elements(&doc, &atoms, html), vec!["head", "body"]);
}

#[test]
fn parse_document_synthesizes_missing_structure() {
    let (doc, atoms) = parse_document(b"just some text");
    let html = doc.html.expect("html element synthesized");
    assert_eq!(child_elements(&doc, &atoms, html), vec!["head", "body"]);
    assert_eq!(doc.quirks_mode, html::QuirksMode::Quirks);
}

#[test]
fn comments_before_html_are_preserved() {
    let (doc, _atoms) = parse_document(b"<!-- top --><!DOCTYPE html><html></html>");
    assert_eq!(doc.comments_before_html(), vec![" top "]);
}

#[test]
fn malformed_table_markup_does_not_panic() {
    let (doc, atoms) = parse_document(
        b"<!DOCTYPE html><table><tr><td>a</td><td>b</tr><tr><td>c</td></tr></table>",
    );
    let html = doc.html.unwrap();
    let body = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("body"))
        .unwrap();
    assert!(child_elements(&doc, &atoms, body).contains(&"table"));
}

#[test]
fn nested_formatting_elements_close_cleanly() {
    let (doc, atoms) = parse_document(b"<!DOCTYPE html><p><b><i>hi</i></b> there</p>");
    let html = doc.html.unwrap();
    let body = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("body"))
        .unwrap();
    let p = doc
        .node(body)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("p"))
        .unwrap();
    assert_eq!(child_elements(&doc, &atoms, p), vec!["b"]);
    let text_after = doc.node(p).children.iter().any(|&id| {
        matches!(&doc.node(id).data, NodeData::Text(text) if text.contains("there"))
    });
    assert!(text_after, "text after </b> should be a sibling of <b>");
}
