//! HTML5 tree-construction insertion modes (§4.2.2).
//!
//! Each mode is a function `token -> Outcome`; `Outcome::Reprocess` means
//! the same token must be run again immediately, now under whatever mode
//! the function just switched to via [`Actions::set_current_insertion_mode`]
//! — matching how the WHATWG algorithm's "reprocess the token" steps work.
//! Table/row/cell/select/template sub-states are recognized by name in the
//! token dispatch below but not given their own insertion mode, per §4.2.2.

use super::stack::is_special;
use super::{Actions, ModeOverride};
use crate::html5::shared::{Attribute, QuirksMode, Token};
use crate::html5::tokenizer::states::State as TokenizerState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertionMode {
    #[default]
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
}

pub(crate) enum Outcome {
    Done,
    Reprocess,
}

fn is_boring_whitespace(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\x0C' | '\r' | ' ')
}

fn generic_text_parse(
    actions: &mut dyn Actions,
    name: &str,
    attrs: &[Attribute],
    state: TokenizerState,
    original_mode: InsertionMode,
) {
    actions.insert_element_for_start_tag(name, attrs);
    actions.set_tokenizer_state(state);
    actions.set_original_insertion_mode(original_mode);
    actions.set_current_insertion_mode(InsertionMode::Text);
}

/// Void-element start tag: insert then immediately pop, matching elements
/// with no content model (`area`, `br`, `img`, ...).
fn insert_void(actions: &mut dyn Actions, name: &str, attrs: &[Attribute]) {
    actions.insert_element_for_start_tag(name, attrs);
    actions.pop_current_node();
}

/// §4.2.2 "any other end tag" fallback for `in body`: scan the stack of
/// open elements top to bottom for a matching name, stopping (and ignoring
/// the token) if a `special` element is hit first.
fn close_via_any_other_end_tag(actions: &mut dyn Actions, tag_name: &str) {
    let names = actions.names_of_open_elements();
    let mut target = None;
    for (index, name) in names.iter().enumerate() {
        if name == tag_name {
            target = Some(index);
            break;
        }
        if is_special(name) {
            break;
        }
    }
    if let Some(index) = target {
        actions.generate_implied_end_tags(Some(tag_name));
        for _ in 0..=index {
            actions.pop_current_node();
        }
    }
}

/// Pops the open-elements stack until (and including) an element named
/// `name` has been popped, or the stack runs out.
fn pop_until(actions: &mut dyn Actions, name: &str) {
    loop {
        let current = actions.current_node_name();
        actions.pop_current_node();
        if current.as_deref() == Some(name) || current.is_none() {
            break;
        }
    }
}

const BLOCK_START_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div",
    "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav",
    "ol", "p", "section", "summary", "ul",
];
const BLOCK_END_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "center", "details", "dialog", "dir",
    "div", "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "listing",
    "main", "menu", "nav", "ol", "pre", "section", "summary", "ul",
];
const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const FORMATTING_TAGS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "nobr", "s", "small", "strike", "strong", "tt",
    "u",
];
const IN_HEAD_SHARED_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "link", "meta", "noframes", "script", "style", "template",
    "title",
];

pub(crate) fn dispatch(mode: InsertionMode, actions: &mut dyn Actions, token: &Token) -> Outcome {
    match mode {
        InsertionMode::Initial => initial(actions, token),
        InsertionMode::BeforeHtml => before_html(actions, token),
        InsertionMode::BeforeHead => before_head(actions, token),
        InsertionMode::InHead => in_head(actions, token),
        InsertionMode::InHeadNoscript => in_head_noscript(actions, token),
        InsertionMode::AfterHead => after_head(actions, token),
        InsertionMode::InBody => in_body(actions, token),
        InsertionMode::Text => text(actions, token),
        InsertionMode::InTable => in_table(actions, token),
        InsertionMode::InTableText => in_table_text(actions, token),
        InsertionMode::AfterBody => after_body(actions, token),
        InsertionMode::InFrameset => in_frameset(actions, token),
        InsertionMode::AfterFrameset => after_frameset(actions, token),
        InsertionMode::AfterAfterBody => after_after_body(actions, token),
    }
}

fn initial(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => Outcome::Done,
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype {
            name,
            public_id,
            system_id,
            force_quirks,
        } => {
            actions.set_doctype_from(
                name.as_deref(),
                public_id.as_deref(),
                system_id.as_deref(),
                *force_quirks,
            );
            actions.set_current_insertion_mode(InsertionMode::BeforeHtml);
            Outcome::Done
        }
        _ => {
            actions.set_quirks_mode(QuirksMode::Quirks);
            actions.set_current_insertion_mode(InsertionMode::BeforeHtml);
            Outcome::Reprocess
        }
    }
}

fn before_html(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Doctype { .. } => Outcome::Done,
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Character(ch) if is_boring_whitespace(*ch) => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.insert_element_for_start_tag("html", attributes);
            actions.set_current_insertion_mode(InsertionMode::BeforeHead);
            Outcome::Done
        }
        Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
            Outcome::Done
        }
        _ => {
            actions.insert_element_for_start_tag("html", &[]);
            actions.set_current_insertion_mode(InsertionMode::BeforeHead);
            Outcome::Reprocess
        }
    }
}

fn before_head(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => Outcome::Done,
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "head" => {
            actions.insert_element_for_start_tag("head", attributes);
            actions.set_current_insertion_mode(InsertionMode::InHead);
            Outcome::Done
        }
        Token::EndTag { name } if !matches!(name.as_str(), "head" | "body" | "html" | "br") => {
            Outcome::Done
        }
        _ => {
            actions.insert_element_for_start_tag("head", &[]);
            actions.set_current_insertion_mode(InsertionMode::InHead);
            Outcome::Reprocess
        }
    }
}

fn in_head(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. }
            if matches!(name.as_str(), "base" | "basefont" | "bgsound" | "link" | "meta") =>
        {
            insert_void(actions, name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "title" => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rcdata,
                InsertionMode::InHead,
            );
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "noscript" => {
            if actions.scripting() {
                generic_text_parse(
                    actions,
                    name,
                    attributes,
                    TokenizerState::Rawtext,
                    InsertionMode::InHead,
                );
            } else {
                actions.insert_element_for_start_tag("noscript", attributes);
                actions.set_current_insertion_mode(InsertionMode::InHeadNoscript);
            }
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if matches!(name.as_str(), "noframes" | "style") => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InHead,
            );
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "script" => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::ScriptData,
                InsertionMode::InHead,
            );
            Outcome::Done
        }
        Token::EndTag { name } if name == "head" => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::AfterHead);
            Outcome::Done
        }
        Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::AfterHead);
            Outcome::Reprocess
        }
        Token::StartTag { name, .. } if name == "head" => Outcome::Done,
        Token::EndTag { .. } => Outcome::Done,
        _ => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::AfterHead);
            Outcome::Reprocess
        }
    }
}

fn in_head_noscript(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::EndTag { name } if name == "noscript" => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::InHead);
            Outcome::Done
        }
        Token::Character(ch) if is_boring_whitespace(*ch) => delegate_to_in_head(actions, token),
        Token::Comment(_) => delegate_to_in_head(actions, token),
        Token::StartTag { name, .. } if IN_HEAD_SHARED_TAGS.contains(&name.as_str()) => {
            delegate_to_in_head(actions, token)
        }
        Token::EndTag { name } if name == "br" => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::InHead);
            Outcome::Reprocess
        }
        Token::StartTag { name, .. } if matches!(name.as_str(), "head" | "noscript") => {
            Outcome::Done
        }
        Token::EndTag { .. } => Outcome::Done,
        _ => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(InsertionMode::InHead);
            Outcome::Reprocess
        }
    }
}

fn delegate_to_in_head(actions: &mut dyn Actions, token: &Token) -> Outcome {
    let reported = actions.current_insertion_mode();
    let mut overridden = ModeOverride::new(actions, reported);
    dispatch(InsertionMode::InHead, &mut overridden, token);
    Outcome::Done
}

fn after_head(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "body" => {
            actions.insert_element_for_start_tag("body", attributes);
            actions.set_frameset_ok(false);
            actions.set_current_insertion_mode(InsertionMode::InBody);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "frameset" => {
            actions.insert_element_for_start_tag("frameset", attributes);
            actions.set_current_insertion_mode(InsertionMode::InFrameset);
            Outcome::Done
        }
        Token::StartTag { name, .. } if IN_HEAD_SHARED_TAGS.contains(&name.as_str()) => {
            actions.push_head_as_current_open_element();
            {
                let mut overridden = ModeOverride::new(actions, InsertionMode::AfterHead);
                dispatch(InsertionMode::InHead, &mut overridden, token);
            }
            actions.remove_from_open_elements("head");
            Outcome::Done
        }
        Token::EndTag { name } if name == "template" => Outcome::Done,
        Token::EndTag { name } if matches!(name.as_str(), "body" | "html" | "br") => {
            actions.insert_element_for_start_tag("body", &[]);
            actions.set_current_insertion_mode(InsertionMode::InBody);
            Outcome::Reprocess
        }
        Token::StartTag { name, .. } if name == "head" => Outcome::Done,
        Token::EndTag { .. } => Outcome::Done,
        _ => {
            actions.insert_element_for_start_tag("body", &[]);
            actions.set_current_insertion_mode(InsertionMode::InBody);
            Outcome::Reprocess
        }
    }
}

fn in_body(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) => {
            actions.reconstruct_active_formatting_elements();
            actions.insert_character(*ch);
            if !is_boring_whitespace(*ch) {
                actions.set_frameset_ok(false);
            }
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::Eof => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, .. } if IN_HEAD_SHARED_TAGS.contains(&name.as_str()) => {
            let mut overridden = ModeOverride::new(actions, InsertionMode::InBody);
            dispatch(InsertionMode::InHead, &mut overridden, token);
            Outcome::Done
        }
        Token::EndTag { name } if name == "template" => Outcome::Done,
        Token::EndTag { name } if name == "body" => {
            if actions.has_element_in_scope("body") {
                actions.set_current_insertion_mode(InsertionMode::AfterBody);
            }
            Outcome::Done
        }
        Token::EndTag { name } if name == "html" => {
            if actions.has_element_in_scope("body") {
                actions.set_current_insertion_mode(InsertionMode::AfterBody);
                Outcome::Reprocess
            } else {
                Outcome::Done
            }
        }
        Token::StartTag { name, attributes, .. } if BLOCK_START_TAGS.contains(&name.as_str()) => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            actions.insert_element_for_start_tag(name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if HEADINGS.contains(&name.as_str()) => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            if let Some(current) = actions.current_node_name() {
                if HEADINGS.contains(&current.as_str()) {
                    actions.pop_current_node();
                }
            }
            actions.insert_element_for_start_tag(name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if matches!(name.as_str(), "pre" | "listing") => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            actions.insert_element_for_start_tag(name, attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "form" => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            actions.insert_element_for_start_tag("form", attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "li" => {
            li_or_dd_dt(actions, &["li"], "li", attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if matches!(name.as_str(), "dd" | "dt") => {
            li_or_dd_dt(actions, &["dd", "dt"], name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "plaintext" => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            actions.insert_element_for_start_tag("plaintext", attributes);
            actions.set_tokenizer_state(TokenizerState::Plaintext);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "button" => {
            if actions.has_element_in_scope("button") {
                actions.generate_implied_end_tags(None);
                pop_until(actions, "button");
            }
            actions.reconstruct_active_formatting_elements();
            actions.insert_element_for_start_tag("button", attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::EndTag { name } if BLOCK_END_TAGS.contains(&name.as_str()) => {
            if actions.has_element_in_scope(name) {
                actions.generate_implied_end_tags(None);
                pop_until(actions, name);
            }
            Outcome::Done
        }
        Token::EndTag { name } if name == "form" => {
            if actions.has_element_in_scope("form") {
                actions.generate_implied_end_tags(None);
                pop_until(actions, "form");
            }
            Outcome::Done
        }
        Token::EndTag { name } if name == "p" => {
            if !actions.has_element_in_button_scope("p") {
                actions.insert_element_for_start_tag("p", &[]);
            }
            actions.close_p_element();
            Outcome::Done
        }
        Token::EndTag { name } if name == "li" => {
            if actions.has_element_in_list_item_scope("li") {
                actions.generate_implied_end_tags(Some("li"));
                pop_until(actions, "li");
            }
            Outcome::Done
        }
        Token::EndTag { name } if matches!(name.as_str(), "dd" | "dt") => {
            if actions.has_element_in_scope(name) {
                actions.generate_implied_end_tags(Some(name));
                pop_until(actions, name);
            }
            Outcome::Done
        }
        Token::EndTag { name } if HEADINGS.contains(&name.as_str()) => {
            if HEADINGS.iter().any(|h| actions.has_element_in_scope(h)) {
                actions.generate_implied_end_tags(None);
                pop_until(actions, name);
            }
            Outcome::Done
        }
        // Adoption agency (formatting elements / `a`) is simplified to a
        // plain scoped pop: no active-formatting-list reparenting, since
        // `reconstruct_active_formatting_elements` is a no-op, see DESIGN.md.
        Token::EndTag { name } if FORMATTING_TAGS.contains(&name.as_str()) => {
            if actions.has_element_in_scope(name) {
                actions.generate_implied_end_tags(None);
                pop_until(actions, name);
            }
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if FORMATTING_TAGS.contains(&name.as_str()) => {
            actions.reconstruct_active_formatting_elements();
            actions.insert_element_for_start_tag(name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. }
            if matches!(name.as_str(), "applet" | "marquee" | "object") =>
        {
            actions.reconstruct_active_formatting_elements();
            actions.insert_element_for_start_tag(name, attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::EndTag { name } if matches!(name.as_str(), "applet" | "marquee" | "object") => {
            if actions.has_element_in_scope(name) {
                actions.generate_implied_end_tags(None);
                pop_until(actions, name);
            }
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "table" => {
            if actions.quirks_mode() != QuirksMode::Quirks && actions.has_element_in_button_scope("p")
            {
                actions.close_p_element();
            }
            actions.insert_element_for_start_tag("table", attributes);
            actions.set_frameset_ok(false);
            actions.set_current_insertion_mode(InsertionMode::InTable);
            Outcome::Done
        }
        Token::EndTag { name } if name == "br" => {
            actions.reconstruct_active_formatting_elements();
            insert_void(actions, "br", &[]);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. }
            if matches!(name.as_str(), "area" | "br" | "embed" | "img" | "keygen" | "wbr") =>
        {
            actions.reconstruct_active_formatting_elements();
            insert_void(actions, name, attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "image" => {
            actions.reconstruct_active_formatting_elements();
            insert_void(actions, "img", attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "input" => {
            actions.reconstruct_active_formatting_elements();
            insert_void(actions, "input", attributes);
            let is_hidden = attributes
                .iter()
                .any(|a| a.name.eq_ignore_ascii_case("type") && a.value.eq_ignore_ascii_case("hidden"));
            if !is_hidden {
                actions.set_frameset_ok(false);
            }
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. }
            if matches!(name.as_str(), "param" | "source" | "track") =>
        {
            insert_void(actions, name, attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "hr" => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            insert_void(actions, "hr", attributes);
            actions.set_frameset_ok(false);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "textarea" => {
            actions.insert_element_for_start_tag("textarea", attributes);
            actions.set_tokenizer_state(TokenizerState::Rcdata);
            actions.set_original_insertion_mode(InsertionMode::InBody);
            actions.set_frameset_ok(false);
            actions.set_current_insertion_mode(InsertionMode::Text);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "xmp" => {
            if actions.has_element_in_button_scope("p") {
                actions.close_p_element();
            }
            actions.reconstruct_active_formatting_elements();
            actions.set_frameset_ok(false);
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InBody,
            );
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "iframe" => {
            actions.set_frameset_ok(false);
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InBody,
            );
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "noembed" => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InBody,
            );
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "noscript" && actions.scripting() => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InBody,
            );
            Outcome::Done
        }
        Token::StartTag { name, .. }
            if matches!(
                name.as_str(),
                "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot"
                    | "th" | "thead" | "tr"
            ) =>
        {
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } => {
            actions.reconstruct_active_formatting_elements();
            actions.insert_element_for_start_tag(name, attributes);
            Outcome::Done
        }
        Token::EndTag { name } => {
            close_via_any_other_end_tag(actions, name);
            Outcome::Done
        }
    }
}

/// Shared algorithm for `li`/`dd`/`dt` start tags: walk the stack
/// top-to-bottom, closing a matching implicit open list item, stopping
/// early at a `special` element outside `{address, div, p}`.
fn li_or_dd_dt(actions: &mut dyn Actions, own_names: &[&str], name: &str, attrs: &[Attribute]) {
    let names = actions.names_of_open_elements();
    for candidate in &names {
        if own_names.contains(&candidate.as_str()) {
            actions.generate_implied_end_tags(Some(candidate));
            pop_until(actions, candidate);
            break;
        }
        if is_special(candidate) && !matches!(candidate.as_str(), "address" | "div" | "p") {
            break;
        }
    }
    if actions.has_element_in_button_scope("p") {
        actions.close_p_element();
    }
    actions.insert_element_for_start_tag(name, attrs);
}

fn text(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Eof => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(actions.original_insertion_mode());
            Outcome::Reprocess
        }
        Token::EndTag { .. } => {
            actions.pop_current_node();
            actions.set_current_insertion_mode(actions.original_insertion_mode());
            Outcome::Done
        }
        _ => Outcome::Done,
    }
}

fn in_table(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(_) => {
            actions.set_original_insertion_mode(InsertionMode::InTable);
            actions.set_current_insertion_mode(InsertionMode::InTableText);
            Outcome::Reprocess
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, .. } if name == "table" => {
            if actions.has_element_in_table_scope("table") {
                pop_until(actions, "table");
                actions.reset_insertion_mode_appropriately();
            }
            Outcome::Reprocess
        }
        Token::EndTag { name } if name == "table" => {
            if actions.has_element_in_table_scope("table") {
                pop_until(actions, "table");
                actions.reset_insertion_mode_appropriately();
            }
            Outcome::Done
        }
        Token::EndTag { name } if name == "template" => Outcome::Done,
        Token::StartTag { name, .. } if IN_HEAD_SHARED_TAGS.contains(&name.as_str()) => {
            let mut overridden = ModeOverride::new(actions, InsertionMode::InTable);
            dispatch(InsertionMode::InHead, &mut overridden, token);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. }
            if matches!(
                name.as_str(),
                "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
            ) =>
        {
            // Row/cell/caption/colgroup sub-modes are out of scope (§4.2.2);
            // insert generically and stay in `in table`.
            actions.insert_element_for_start_tag(name, attributes);
            Outcome::Done
        }
        Token::Eof => Outcome::Done,
        _ => {
            actions.set_foster_parenting(true);
            {
                let mut overridden = ModeOverride::new(actions, InsertionMode::InTable);
                dispatch(InsertionMode::InBody, &mut overridden, token);
            }
            actions.set_foster_parenting(false);
            Outcome::Done
        }
    }
}

fn in_table_text(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if *ch != '\0' => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Character(_) => Outcome::Done,
        _ => {
            actions.set_current_insertion_mode(actions.original_insertion_mode());
            Outcome::Reprocess
        }
    }
}

fn after_body(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::EndTag { name } if name == "html" => {
            actions.set_current_insertion_mode(InsertionMode::AfterAfterBody);
            Outcome::Done
        }
        Token::Eof => Outcome::Done,
        _ => {
            actions.set_current_insertion_mode(InsertionMode::InBody);
            Outcome::Reprocess
        }
    }
}

fn in_frameset(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "frameset" => {
            actions.insert_element_for_start_tag("frameset", attributes);
            Outcome::Done
        }
        Token::EndTag { name } if name == "frameset" => {
            actions.pop_current_node();
            if actions.current_node_name().as_deref() != Some("frameset") {
                actions.set_current_insertion_mode(InsertionMode::AfterFrameset);
            }
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "frame" => {
            insert_void(actions, "frame", attributes);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "noframes" => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::InFrameset,
            );
            Outcome::Done
        }
        Token::Eof => Outcome::Done,
        _ => Outcome::Done,
    }
}

fn after_frameset(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::EndTag { name } if name == "html" => {
            actions.set_current_insertion_mode(InsertionMode::AfterAfterBody);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "noframes" => {
            generic_text_parse(
                actions,
                name,
                attributes,
                TokenizerState::Rawtext,
                InsertionMode::AfterFrameset,
            );
            Outcome::Done
        }
        Token::Eof => Outcome::Done,
        _ => Outcome::Done,
    }
}

fn after_after_body(actions: &mut dyn Actions, token: &Token) -> Outcome {
    match token {
        Token::Comment(text) => {
            actions.insert_comment(text);
            Outcome::Done
        }
        Token::Doctype { .. } => Outcome::Done,
        Token::Character(ch) if is_boring_whitespace(*ch) => {
            actions.insert_character(*ch);
            Outcome::Done
        }
        Token::StartTag { name, attributes, .. } if name == "html" => {
            actions.merge_into_html_node(attributes);
            Outcome::Done
        }
        Token::Eof => Outcome::Done,
        _ => {
            actions.set_current_insertion_mode(InsertionMode::InBody);
            Outcome::Reprocess
        }
    }
}

