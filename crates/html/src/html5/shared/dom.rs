//! Arena-backed DOM.
//!
//! Nodes are owned by the `Document` arena and referenced by `NodeId`, never
//! by pointer or `Rc` — the tree builder's open-elements stack stores
//! `NodeId`s that outlive no document, so there is nothing to dangle.

use super::AtomId;

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuirksMode {
    #[default]
    NoQuirks,
    LimitedQuirks,
    Quirks,
}

#[derive(Clone, Debug)]
pub struct ElementData {
    pub name: AtomId,
    /// Source order, duplicates resolved first-writer-wins by the tree builder.
    pub attributes: Vec<(AtomId, String)>,
}

impl ElementData {
    pub fn attr<'a>(&'a self, atoms: &'a super::AtomTable, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(id, _)| atoms.resolve(*id) == Some(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The document root is always node 0, created with the arena.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    pub quirks_mode: QuirksMode,
    /// Set once the tree builder creates the root `<html>` element.
    pub html: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            quirks_mode: QuirksMode::NoQuirks,
            html: None,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Inserts `child` right before `parent`'s own position in *its* parent's
    /// child list — the foster-parenting "insert before the table" placement.
    pub fn insert_before_in_parent(&mut self, reference: NodeId, child: NodeId) {
        let Some(grandparent) = self.nodes[reference].parent else {
            return;
        };
        self.nodes[child].parent = Some(grandparent);
        let siblings = &mut self.nodes[grandparent].children;
        let pos = siblings
            .iter()
            .position(|&n| n == reference)
            .unwrap_or(siblings.len());
        siblings.insert(pos, child);
    }

    pub fn element_name<'a>(&'a self, id: NodeId, atoms: &'a super::AtomTable) -> Option<&'a str> {
        match &self.nodes[id].data {
            NodeData::Element(e) => atoms.resolve(e.name),
            _ => None,
        }
    }

    pub fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The document's doctype record, if one was seen during parsing.
    pub fn doctype(&self) -> Option<(&str, &str, &str)> {
        self.nodes[Self::ROOT].children.iter().find_map(|&id| {
            match &self.nodes[id].data {
                NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => Some((name.as_str(), public_id.as_str(), system_id.as_str())),
                _ => None,
            }
        })
    }

    /// Comments that appeared before the root `<html>` element was inserted.
    pub fn comments_before_html(&self) -> Vec<&str> {
        self.nodes[Self::ROOT]
            .children
            .iter()
            .take_while(|&&id| Some(id) != self.html)
            .filter_map(|&id| match &self.nodes[id].data {
                NodeData::Comment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Appends to the last text node child when present, matching how the
    /// HTML tree-construction algorithm coalesces adjacent character tokens.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last].data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_node(NodeData::Text(text.to_string()));
        self.append_child(parent, node);
    }

    pub fn to_debug_tree(&self, atoms: &super::AtomTable) -> String {
        let mut out = String::new();
        self.write_debug_tree(Self::ROOT, 0, atoms, &mut out);
        out
    }

    fn write_debug_tree(
        &self,
        id: NodeId,
        depth: usize,
        atoms: &super::AtomTable,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        match &self.nodes[id].data {
            NodeData::Document => out.push_str(&format!("{indent}#document\n")),
            NodeData::Doctype { name, .. } => {
                out.push_str(&format!("{indent}<!DOCTYPE {name}>\n"))
            }
            NodeData::Element(e) => {
                let name = atoms.resolve(e.name).unwrap_or("?");
                out.push_str(&format!("{indent}<{name}>\n"));
            }
            NodeData::Text(text) => out.push_str(&format!("{indent}\"{text}\"\n")),
            NodeData::Comment(text) => out.push_str(&format!("{indent}<!--{text}-->\n")),
        }
        for &child in &self.nodes[id].children.clone() {
            self.write_debug_tree(child, depth + 1, atoms, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html5::shared::AtomTable;

    #[test]
    fn append_text_coalesces_adjacent_runs() {
        let mut doc = Document::new();
        doc.append_text(Document::ROOT, "a");
        doc.append_text(Document::ROOT, "b");
        assert_eq!(doc.node(Document::ROOT).children.len(), 1);
        let NodeData::Text(text) = &doc.node(doc.node(Document::ROOT).children[0]).data else {
            panic!("expected text node");
        };
        assert_eq!(text, "ab");
    }

    #[test]
    fn insert_before_in_parent_places_before_reference() {
        let mut doc = Document::new();
        let mut atoms = AtomTable::new();
        let table_name = atoms.intern_ascii_folded("table");
        let table = doc.create_node(NodeData::Element(ElementData {
            name: table_name,
            attributes: vec![],
        }));
        doc.append_child(Document::ROOT, table);
        let text = doc.create_node(NodeData::Text("foster".into()));
        doc.insert_before_in_parent(table, text);
        assert_eq!(doc.node(Document::ROOT).children, vec![text, table]);
    }
}
