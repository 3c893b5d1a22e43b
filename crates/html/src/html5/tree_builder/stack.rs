//! Stack of open elements, plus the scope-membership algorithms the tree
//! builder runs over it (§4.2.2 "has-element-in-X-scope").

use crate::html5::shared::{AtomId, NodeId};

/// Entry in the stack of open elements: a back-reference into the document
/// arena plus the element's interned name, so scope checks never need to
/// round-trip through the document to read a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OpenElement {
    pub(crate) id: NodeId,
    pub(crate) name: AtomId,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct OpenElementsStack {
    items: Vec<OpenElement>,
}

impl OpenElementsStack {
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, entry: OpenElement) {
        self.items.push(entry);
    }

    pub(crate) fn current(&self) -> Option<OpenElement> {
        self.items.last().copied()
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement> {
        self.items.pop()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Most-recently-pushed first, matching how §4.2.2 describes scanning
    /// "the stack of open elements, from top to bottom".
    pub(crate) fn iter_top_to_bottom(&self) -> impl Iterator<Item = &OpenElement> {
        self.items.iter().rev()
    }

    pub(crate) fn contains_name(&self, name: AtomId) -> bool {
        self.items.iter().any(|e| e.name == name)
    }

    pub(crate) fn position_from_top(&self, name: AtomId) -> Option<usize> {
        self.items.iter().rposition(|entry| entry.name == name)
    }

    /// Removes the first occurrence (scanning from the top) of an element
    /// whose name matches, without disturbing the stack order otherwise.
    pub(crate) fn remove_name(&mut self, name: AtomId) {
        if let Some(index) = self.position_from_top(name) {
            self.items.remove(index);
        }
    }
}

/// The scope variants §4.2.2 names: each fixes the boundary-element set a
/// `has-element-in-X-scope` walk stops at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Default,
    ListItem,
    Button,
    Table,
}

const DEFAULT_SCOPE_BOUNDARY: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
];
const TABLE_SCOPE_BOUNDARY: &[&str] = &["html", "table", "template"];

fn is_boundary(scope: Scope, name: &str) -> bool {
    match scope {
        Scope::Default => DEFAULT_SCOPE_BOUNDARY.contains(&name),
        Scope::ListItem => DEFAULT_SCOPE_BOUNDARY.contains(&name) || name == "ol" || name == "ul",
        Scope::Button => DEFAULT_SCOPE_BOUNDARY.contains(&name) || name == "button",
        Scope::Table => TABLE_SCOPE_BOUNDARY.contains(&name),
    }
}

/// Walks the stack of open elements most-recent-first: returns `true` on
/// finding `target`, `false` on hitting a scope boundary first.
pub(crate) fn has_element_in_scope(
    stack: &OpenElementsStack,
    atoms: &crate::html5::shared::AtomTable,
    target: &str,
    scope: Scope,
) -> bool {
    for entry in stack.iter_top_to_bottom() {
        let Some(name) = atoms.resolve(entry.name) else {
            continue;
        };
        if name == target {
            return true;
        }
        if is_boundary(scope, name) {
            return false;
        }
    }
    false
}

/// Elements whose presence on the stack prevents certain end-tag
/// corrections (§4.2.2 "special"), roughly the HTML5 "special" category
/// restricted to elements this crate's subset of insertion modes can open.
pub(crate) const SPECIAL_ELEMENTS: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote",
    "body", "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "div",
    "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "section", "select", "source", "style", "summary", "table", "tbody", "td", "template",
    "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
];

pub(crate) fn is_special(name: &str) -> bool {
    SPECIAL_ELEMENTS.contains(&name)
}

/// Tags that switch to the generic raw-text parsing algorithm.
pub(crate) const RAWTEXT_ELEMENTS: &[&str] = &["style", "xmp", "iframe", "noembed", "noframes"];
/// Tags that switch to the generic RCDATA parsing algorithm.
pub(crate) const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// Implied end tags §4.2.2: element names popped automatically by
/// `generate_implied_end_tags`.
pub(crate) const IMPLIED_END_TAG_ELEMENTS: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html5::shared::AtomTable;

    fn push(stack: &mut OpenElementsStack, atoms: &mut AtomTable, name: &str, id: NodeId) {
        stack.push(OpenElement {
            id,
            name: atoms.intern_ascii_folded(name),
        });
    }

    #[test]
    fn scope_stops_at_boundary() {
        let mut atoms = AtomTable::new();
        let mut stack = OpenElementsStack::default();
        push(&mut stack, &mut atoms, "html", 0);
        push(&mut stack, &mut atoms, "body", 1);
        push(&mut stack, &mut atoms, "table", 2);
        push(&mut stack, &mut atoms, "td", 3);
        push(&mut stack, &mut atoms, "p", 4);

        assert!(has_element_in_scope(&stack, &atoms, "p", Scope::Default));
        // "table" is a default-scope boundary below "td"; "p" is inside it,
        // but scanning further up for "body" must stop at "table".
        assert!(!has_element_in_scope(&stack, &atoms, "body", Scope::Default));
    }

    #[test]
    fn is_special_recognizes_block_elements() {
        assert!(is_special("div"));
        assert!(is_special("table"));
        assert!(!is_special("span"));
    }
}
