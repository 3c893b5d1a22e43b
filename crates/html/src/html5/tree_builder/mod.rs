//! HTML5 tree construction: the insertion-mode state machine that turns a
//! token stream into a [`Document`] (§4.2.2).
//!
//! The state machine never touches the document directly; every mutation
//! goes through the [`Actions`] trait, the "only coupling between the
//! state machine and the document model" the spec calls for. [`TreeBuilder`]
//! is the concrete implementation; [`ModeOverride`] is the transparent
//! decorator used for "delegation with override" (§9) — forwarding every
//! method except `current_insertion_mode`, so a mode can process a token
//! using another mode's rules while still reporting itself as current.

mod formatting;
pub mod modes;
mod quirks;
mod stack;

#[cfg(test)]
mod tests;

use crate::html5::shared::{
    AtomId, AtomTable, Attribute, Document, ElementData, NodeData, NodeId, QuirksMode, Token,
};
use crate::html5::tokenizer::states::State as TokenizerState;
use crate::html5::tokenizer::TokenSink;
use formatting::ActiveFormattingList;
use modes::InsertionMode;
use stack::{OpenElement, OpenElementsStack, Scope};

#[derive(Clone, Debug, Default)]
pub struct TreeBuilderConfig {
    pub scripting: bool,
}

#[derive(Clone, Debug)]
pub enum TreeBuilderStepResult {
    Continue,
    Suspend(SuspendReason),
}

#[derive(Clone, Debug)]
pub enum SuspendReason {
    Script,
    Other,
}

#[derive(Clone, Debug)]
pub struct TreeBuilderError;

/// The tree-construction stage's sole mutation surface onto the document
/// model (§4.2.2). [`TreeBuilder`] is the only real implementation;
/// [`ModeOverride`] is a pass-through decorator over any `Actions`.
pub trait Actions {
    fn set_doctype_from(
        &mut self,
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        force_quirks: bool,
    );
    fn quirks_mode(&self) -> QuirksMode;
    fn set_quirks_mode(&mut self, mode: QuirksMode);
    fn scripting(&self) -> bool;

    fn insert_comment(&mut self, text: &str);
    fn insert_element_for_start_tag(&mut self, name: &str, attrs: &[Attribute]) -> NodeId;
    fn insert_character(&mut self, ch: char);
    fn pop_current_node(&mut self);
    fn current_node_name(&self) -> Option<String>;
    fn names_of_open_elements(&self) -> Vec<String>;

    /// Adds attributes to the root `<html>` element; first writer wins on
    /// a name collision (§4.2.2 "merge_into_html_node").
    fn merge_into_html_node(&mut self, attrs: &[Attribute]);

    fn set_tokenizer_state(&mut self, state: TokenizerState);
    fn set_original_insertion_mode(&mut self, mode: InsertionMode);
    fn original_insertion_mode(&self) -> InsertionMode;
    fn current_insertion_mode(&self) -> InsertionMode;
    fn set_current_insertion_mode(&mut self, mode: InsertionMode);

    fn push_head_as_current_open_element(&mut self);
    fn remove_from_open_elements(&mut self, name: &str);

    /// No-op placeholder; see §9 and `formatting.rs`.
    fn reconstruct_active_formatting_elements(&mut self);
    fn set_frameset_ok(&mut self, ok: bool);
    fn frameset_ok(&self) -> bool;
    /// No-op placeholder; foster parenting for misplaced table content is
    /// not implemented, see DESIGN.md.
    fn set_foster_parenting(&mut self, enabled: bool);

    fn has_element_in_scope(&self, name: &str) -> bool;
    fn has_element_in_list_item_scope(&self, name: &str) -> bool;
    fn has_element_in_button_scope(&self, name: &str) -> bool;
    fn has_element_in_table_scope(&self, name: &str) -> bool;
    fn generate_implied_end_tags(&mut self, except: Option<&str>);
    fn close_p_element(&mut self);
    fn reset_insertion_mode_appropriately(&mut self);
    fn stack_is_empty(&self) -> bool;
}

/// Transparent wrapper that answers every [`Actions`] method by forwarding
/// to the wrapped implementation, except `current_insertion_mode`, which it
/// answers with a fixed override. See module docs and §9.
pub(crate) struct ModeOverride<'a> {
    inner: &'a mut dyn Actions,
    reported_mode: InsertionMode,
}

impl<'a> ModeOverride<'a> {
    pub(crate) fn new(inner: &'a mut dyn Actions, reported_mode: InsertionMode) -> Self {
        Self {
            inner,
            reported_mode,
        }
    }
}

impl Actions for ModeOverride<'_> {
    fn set_doctype_from(
        &mut self,
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        force_quirks: bool,
    ) {
        self.inner
            .set_doctype_from(name, public_id, system_id, force_quirks)
    }
    fn quirks_mode(&self) -> QuirksMode {
        self.inner.quirks_mode()
    }
    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.inner.set_quirks_mode(mode)
    }
    fn scripting(&self) -> bool {
        self.inner.scripting()
    }
    fn insert_comment(&mut self, text: &str) {
        self.inner.insert_comment(text)
    }
    fn insert_element_for_start_tag(&mut self, name: &str, attrs: &[Attribute]) -> NodeId {
        self.inner.insert_element_for_start_tag(name, attrs)
    }
    fn insert_character(&mut self, ch: char) {
        self.inner.insert_character(ch)
    }
    fn pop_current_node(&mut self) {
        self.inner.pop_current_node()
    }
    fn current_node_name(&self) -> Option<String> {
        self.inner.current_node_name()
    }
    fn names_of_open_elements(&self) -> Vec<String> {
        self.inner.names_of_open_elements()
    }
    fn merge_into_html_node(&mut self, attrs: &[Attribute]) {
        self.inner.merge_into_html_node(attrs)
    }
    fn set_tokenizer_state(&mut self, state: TokenizerState) {
        self.inner.set_tokenizer_state(state)
    }
    fn set_original_insertion_mode(&mut self, mode: InsertionMode) {
        self.inner.set_original_insertion_mode(mode)
    }
    fn original_insertion_mode(&self) -> InsertionMode {
        self.inner.original_insertion_mode()
    }
    fn current_insertion_mode(&self) -> InsertionMode {
        self.reported_mode
    }
    fn set_current_insertion_mode(&mut self, mode: InsertionMode) {
        self.inner.set_current_insertion_mode(mode)
    }
    fn push_head_as_current_open_element(&mut self) {
        self.inner.push_head_as_current_open_element()
    }
    fn remove_from_open_elements(&mut self, name: &str) {
        self.inner.remove_from_open_elements(name)
    }
    fn reconstruct_active_formatting_elements(&mut self) {
        self.inner.reconstruct_active_formatting_elements()
    }
    fn set_frameset_ok(&mut self, ok: bool) {
        self.inner.set_frameset_ok(ok)
    }
    fn frameset_ok(&self) -> bool {
        self.inner.frameset_ok()
    }
    fn set_foster_parenting(&mut self, enabled: bool) {
        self.inner.set_foster_parenting(enabled)
    }
    fn has_element_in_scope(&self, name: &str) -> bool {
        self.inner.has_element_in_scope(name)
    }
    fn has_element_in_list_item_scope(&self, name: &str) -> bool {
        self.inner.has_element_in_list_item_scope(name)
    }
    fn has_element_in_button_scope(&self, name: &str) -> bool {
        self.inner.has_element_in_button_scope(name)
    }
    fn has_element_in_table_scope(&self, name: &str) -> bool {
        self.inner.has_element_in_table_scope(name)
    }
    fn generate_implied_end_tags(&mut self, except: Option<&str>) {
        self.inner.generate_implied_end_tags(except)
    }
    fn close_p_element(&mut self) {
        self.inner.close_p_element()
    }
    fn reset_insertion_mode_appropriately(&mut self) {
        self.inner.reset_insertion_mode_appropriately()
    }
    fn stack_is_empty(&self) -> bool {
        self.inner.stack_is_empty()
    }
}

/// Drives the insertion-mode state machine over a token stream, building a
/// [`Document`] in an internal arena. Implements [`TokenSink`] so a
/// [`crate::html5::tokenizer::Tokenizer`] can run directly against it.
pub struct TreeBuilder {
    config: TreeBuilderConfig,
    document: Document,
    atoms: AtomTable,
    open_elements: OpenElementsStack,
    afe: ActiveFormattingList,
    mode: InsertionMode,
    original_mode: InsertionMode,
    head_element: Option<NodeId>,
    frameset_ok: bool,
    foster_parenting: bool,
    pending_tokenizer_state: Option<TokenizerState>,
}

impl TreeBuilder {
    pub fn new(config: TreeBuilderConfig) -> Self {
        Self {
            config,
            document: Document::new(),
            atoms: AtomTable::new(),
            open_elements: OpenElementsStack::default(),
            afe: ActiveFormattingList::default(),
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            head_element: None,
            frameset_ok: true,
            foster_parenting: false,
            pending_tokenizer_state: None,
        }
    }

    /// Consumes the builder, returning the document it built and the atom
    /// table resolving its interned element/attribute names.
    pub fn finish(self) -> (Document, AtomTable) {
        (self.document, self.atoms)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    fn current(&self) -> Option<OpenElement> {
        self.open_elements.current()
    }

    fn appropriate_insertion_parent(&self) -> NodeId {
        self.current().map(|e| e.id).unwrap_or(Document::ROOT)
    }

    fn push_element(&mut self, id: NodeId, name: AtomId) {
        self.open_elements.push(OpenElement { id, name });
    }
}

impl Actions for TreeBuilder {
    fn set_doctype_from(
        &mut self,
        name: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        force_quirks: bool,
    ) {
        let quirks = quirks::detect(name, public_id, system_id, force_quirks);
        self.document.quirks_mode = quirks;
        let node = self.document.create_node(NodeData::Doctype {
            name: name.unwrap_or_default().to_string(),
            public_id: public_id.unwrap_or_default().to_string(),
            system_id: system_id.unwrap_or_default().to_string(),
        });
        self.document.append_child(Document::ROOT, node);
    }

    fn quirks_mode(&self) -> QuirksMode {
        self.document.quirks_mode
    }

    fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.document.quirks_mode = mode;
    }

    fn scripting(&self) -> bool {
        self.config.scripting
    }

    fn insert_comment(&mut self, text: &str) {
        let parent = self.appropriate_insertion_parent();
        let node = self.document.create_node(NodeData::Comment(text.to_string()));
        self.document.append_child(parent, node);
    }

    fn insert_element_for_start_tag(&mut self, name: &str, attrs: &[Attribute]) -> NodeId {
        let name_id = self.atoms.intern_ascii_folded(name);
        let mut data = Vec::with_capacity(attrs.len());
        for attr in attrs {
            let attr_name = self.atoms.intern_ascii_folded(&attr.name);
            if data.iter().any(|(n, _): &(AtomId, String)| *n == attr_name) {
                continue; // first writer wins on duplicate attributes, see §4.2.2
            }
            data.push((attr_name, attr.value.clone()));
        }
        let is_html = name_id == self.atoms.intern_ascii_folded("html");
        let parent = if is_html {
            Document::ROOT
        } else {
            self.appropriate_insertion_parent()
        };
        let node = self.document.create_node(NodeData::Element(ElementData {
            name: name_id,
            attributes: data,
        }));
        self.document.append_child(parent, node);
        if is_html {
            self.document.html = Some(node);
        }
        if name == "head" {
            self.head_element = Some(node);
        }
        self.push_element(node, name_id);
        node
    }

    fn insert_character(&mut self, ch: char) {
        let parent = self.appropriate_insertion_parent();
        let mut buf = [0u8; 4];
        self.document.append_text(parent, ch.encode_utf8(&mut buf));
    }

    fn pop_current_node(&mut self) {
        self.open_elements.pop();
    }

    fn current_node_name(&self) -> Option<String> {
        self.current()
            .and_then(|e| self.atoms.resolve(e.name))
            .map(|s| s.to_string())
    }

    fn names_of_open_elements(&self) -> Vec<String> {
        self.open_elements
            .iter_top_to_bottom()
            .filter_map(|e| self.atoms.resolve(e.name))
            .map(|s| s.to_string())
            .collect()
    }

    fn merge_into_html_node(&mut self, attrs: &[Attribute]) {
        let Some(html) = self.document.html else { return };
        let NodeData::Element(element) = &mut self.document.node_mut(html).data else {
            return;
        };
        for attr in attrs {
            let name_id = self.atoms.intern_ascii_folded(&attr.name);
            if element.attributes.iter().any(|(n, _)| *n == name_id) {
                continue;
            }
            element.attributes.push((name_id, attr.value.clone()));
        }
    }

    fn set_tokenizer_state(&mut self, state: TokenizerState) {
        self.pending_tokenizer_state = Some(state);
    }

    fn set_original_insertion_mode(&mut self, mode: InsertionMode) {
        self.original_mode = mode;
    }

    fn original_insertion_mode(&self) -> InsertionMode {
        self.original_mode
    }

    fn current_insertion_mode(&self) -> InsertionMode {
        self.mode
    }

    fn set_current_insertion_mode(&mut self, mode: InsertionMode) {
        self.mode = mode;
    }

    fn push_head_as_current_open_element(&mut self) {
        if let Some(head) = self.head_element {
            let name_id = self.atoms.intern_ascii_folded("head");
            self.push_element(head, name_id);
        }
    }

    fn remove_from_open_elements(&mut self, name: &str) {
        let name_id = self.atoms.intern_ascii_folded(name);
        self.open_elements.remove_name(name_id);
    }

    fn reconstruct_active_formatting_elements(&mut self) {
        // No-op placeholder, see §9 and `formatting.rs`.
    }

    fn set_frameset_ok(&mut self, ok: bool) {
        self.frameset_ok = ok;
    }

    fn frameset_ok(&self) -> bool {
        self.frameset_ok
    }

    fn set_foster_parenting(&mut self, enabled: bool) {
        self.foster_parenting = enabled;
    }

    fn has_element_in_scope(&self, name: &str) -> bool {
        stack::has_element_in_scope(&self.open_elements, &self.atoms, name, Scope::Default)
    }

    fn has_element_in_list_item_scope(&self, name: &str) -> bool {
        stack::has_element_in_scope(&self.open_elements, &self.atoms, name, Scope::ListItem)
    }

    fn has_element_in_button_scope(&self, name: &str) -> bool {
        stack::has_element_in_scope(&self.open_elements, &self.atoms, name, Scope::Button)
    }

    fn has_element_in_table_scope(&self, name: &str) -> bool {
        stack::has_element_in_scope(&self.open_elements, &self.atoms, name, Scope::Table)
    }

    fn generate_implied_end_tags(&mut self, except: Option<&str>) {
        loop {
            let Some(name) = self.current_node_name() else { break };
            if !stack::IMPLIED_END_TAG_ELEMENTS.contains(&name.as_str()) {
                break;
            }
            if Some(name.as_str()) == except {
                break;
            }
            self.pop_current_node();
        }
    }

    fn close_p_element(&mut self) {
        self.generate_implied_end_tags(Some("p"));
        loop {
            let name = self.current_node_name();
            self.pop_current_node();
            if name.as_deref() == Some("p") || name.is_none() {
                break;
            }
        }
    }

    fn reset_insertion_mode_appropriately(&mut self) {
        let mut next = InsertionMode::InBody;
        for entry in self.open_elements.iter_top_to_bottom() {
            match self.atoms.resolve(entry.name) {
                Some("table") => {
                    next = InsertionMode::InTable;
                    break;
                }
                Some("head") => {
                    next = InsertionMode::InHead;
                    break;
                }
                Some("body") => {
                    next = InsertionMode::InBody;
                    break;
                }
                Some("frameset") => {
                    next = InsertionMode::InFrameset;
                    break;
                }
                Some("html") => {
                    next = InsertionMode::AfterHead;
                    break;
                }
                _ => continue,
            }
        }
        self.mode = next;
    }

    fn stack_is_empty(&self) -> bool {
        self.open_elements.is_empty()
    }
}

impl TokenSink for TreeBuilder {
    fn process_token(&mut self, token: Token) -> Option<TokenizerState> {
        self.pending_tokenizer_state = None;
        loop {
            let mode = self.mode;
            match modes::dispatch(mode, self, &token) {
                modes::Outcome::Done => break,
                modes::Outcome::Reprocess => continue,
            }
        }
        self.pending_tokenizer_state.take()
    }
}
