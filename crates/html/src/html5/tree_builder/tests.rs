use super::*;
use crate::html5::shared::NodeData;
use crate::html5::tokenizer::Tokenizer;

fn build(source: &str) -> (Document, AtomTable) {
    let mut tokenizer = Tokenizer::new(source);
    let mut builder = TreeBuilder::new(TreeBuilderConfig::default());
    tokenizer.run(&mut builder);
    builder.finish()
}

fn child_names(doc: &Document, atoms: &AtomTable, id: NodeId) -> Vec<String> {
    doc.node(id)
        .children
        .iter()
        .filter_map(|&child| doc.element_name(child, atoms).map(str::to_string))
        .collect()
}

#[test]
fn minimal_document_gets_html_head_body() {
    let (doc, atoms) = build("<!DOCTYPE html><title>hi</title><p>text</p>");
    let html = doc.html.expect("html element created implicitly");
    let names = child_names(&doc, &atoms, html);
    assert_eq!(names, vec!["head", "body"]);
}

#[test]
fn doctype_is_recorded_and_no_quirks() {
    let (doc, _atoms) = build("<!DOCTYPE html><p>hi</p>");
    assert_eq!(doc.quirks_mode, QuirksMode::NoQuirks);
    let (name, public_id, system_id) = doc.doctype().expect("doctype node present");
    assert_eq!(name, "html");
    assert_eq!(public_id, "");
    assert_eq!(system_id, "");
}

#[test]
fn missing_doctype_triggers_quirks_mode() {
    let (doc, _atoms) = build("<p>hi</p>");
    assert_eq!(doc.quirks_mode, QuirksMode::Quirks);
}

#[test]
fn paragraphs_do_not_nest() {
    let (doc, atoms) = build("<!DOCTYPE html><p>one<p>two");
    let html = doc.html.unwrap();
    let body = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("body"))
        .unwrap();
    let paragraphs = child_names(&doc, &atoms, body);
    assert_eq!(paragraphs, vec!["p", "p"]);
}

#[test]
fn implicit_li_closes_previous_li() {
    let (doc, atoms) = build("<!DOCTYPE html><ul><li>a<li>b</ul>");
    let html = doc.html.unwrap();
    let body = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("body"))
        .unwrap();
    let ul = doc
        .node(body)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("ul"))
        .unwrap();
    let items = child_names(&doc, &atoms, ul);
    assert_eq!(items, vec!["li", "li"]);
}

#[test]
fn adjacent_text_nodes_coalesce() {
    let (doc, atoms) = build("<!DOCTYPE html><p>a<b>x</b>b");
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
    // "a", then <b>x</b>, then "b": two distinct text runs, not coalesced
    // across the intervening element.
    let texts: Vec<&str> = doc.node(p).children.iter().filter_map(|&id| {
        if let NodeData::Text(text) = &doc.node(id).data {
            Some(text.as_str())
        } else {
            None
        }
    }).collect();
    assert_eq!(texts, vec!["a", "b"]);
}

#[test]
fn void_elements_have_no_children_on_stack() {
    let (doc, atoms) = build("<!DOCTYPE html><p>before<br>after</p>");
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
    let names = child_names(&doc, &atoms, p);
    assert_eq!(names, vec!["br"]);
    let br = doc
        .node(p)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("br"))
        .unwrap();
    assert!(doc.node(br).children.is_empty());
}

#[test]
fn table_switches_and_restores_insertion_mode() {
    let (doc, atoms) = build("<!DOCTYPE html><table><tr><td>cell</td></tr></table>tail");
    let html = doc.html.unwrap();
    let body = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("body"))
        .unwrap();
    let names = child_names(&doc, &atoms, body);
    assert!(names.contains(&"table".to_string()));
}

#[test]
fn title_contents_are_rcdata_not_markup() {
    let (doc, atoms) = build("<!DOCTYPE html><title>1 &lt; 2</title>");
    let html = doc.html.unwrap();
    let head = doc
        .node(html)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("head"))
        .unwrap();
    let title = doc
        .node(head)
        .children
        .iter()
        .copied()
        .find(|&id| doc.element_name(id, &atoms) == Some("title"))
        .unwrap();
    let NodeData::Text(text) = &doc.node(doc.node(title).children[0]).data else {
        panic!("expected text child");
    };
    assert_eq!(text, "1 < 2");
}
