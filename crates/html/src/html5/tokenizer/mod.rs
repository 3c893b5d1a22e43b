//! HTML5 tokenizer.
//!
//! A synchronous, non-streaming scanner implementing the WHATWG tokenization
//! state machine over a full in-memory `&str`. Tokens and parse errors are
//! pushed to a [`TokenSink`] as they're produced; the sink may answer back
//! with a state override (used by the tree builder to switch the tokenizer
//! into RCDATA/RAWTEXT/script-data mode after seeing `<title>`, `<textarea>`,
//! `<script>`, and friends — see `TokenSink::process_token`).

pub mod entities;
pub mod states;

use super::shared::{Attribute, Location, ParseError, ParseErrorKind, Token};
use entities::{c1_control_replacement, is_noncharacter, longest_named_match};
use states::State;

/// Receives tokens and parse errors as the tokenizer produces them.
pub trait TokenSink {
    /// Handle one token. Returning `Some(state)` switches the tokenizer into
    /// that state immediately after this token is processed — the hook the
    /// tree builder uses to select RCDATA/RAWTEXT/script-data/PLAINTEXT
    /// parsing for elements whose content model demands it.
    fn process_token(&mut self, token: Token) -> Option<State>;

    fn parse_error(&mut self, _error: ParseError) {}
}

/// A [`TokenSink`] that only collects tokens and errors, for tests and for
/// callers that want tokens without driving a tree builder.
#[derive(Default)]
pub struct TokenCollector {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

impl TokenSink for TokenCollector {
    fn process_token(&mut self, token: Token) -> Option<State> {
        self.tokens.push(token);
        None
    }

    fn parse_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}

#[derive(Default)]
struct TagBuilder {
    is_end: bool,
    name: String,
    self_closing: bool,
    attributes: Vec<Attribute>,
    attr_name: String,
    attr_value: String,
}

#[derive(Default)]
struct DoctypeBuilder {
    name: Option<String>,
    public_id: Option<String>,
    system_id: Option<String>,
    force_quirks: bool,
}

pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    state: State,
    return_state: State,
    location: Location,
    tag: Option<TagBuilder>,
    doctype: Option<DoctypeBuilder>,
    comment: String,
    temp_buffer: String,
    char_ref_code: u32,
    last_start_tag_name: Option<String>,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            pos: 0,
            state: State::Data,
            return_state: State::Data,
            location: Location::START,
            tag: None,
            doctype: None,
            comment: String::new(),
            temp_buffer: String::new(),
            char_ref_code: 0,
            last_start_tag_name: None,
        }
    }

    /// Switch the tokenizer's state from outside the main loop (the tree
    /// builder's hook into content-model-dependent tokenization).
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn run<S: TokenSink>(&mut self, sink: &mut S) {
        loop {
            if self.step(sink) {
                break;
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.location.line += 1;
            self.location.column = 1;
        } else {
            self.location.column += 1;
        }
        Some(ch)
    }

    fn reconsume(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
        if self.location.column > 1 {
            self.location.column -= 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_str(&self, len: usize) -> String {
        self.input
            .get(self.pos..(self.pos + len).min(self.input.len()))
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }

    fn eat_prefix_case_insensitive(&mut self, prefix: &str) -> bool {
        let candidate = self.peek_str(prefix.chars().count());
        if candidate.eq_ignore_ascii_case(prefix) {
            for _ in 0..prefix.chars().count() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    fn error(&mut self, sink: &mut impl TokenSink, kind: ParseErrorKind) {
        sink.parse_error(ParseError {
            kind,
            location: self.location,
        });
    }

    fn emit(&mut self, sink: &mut impl TokenSink, token: Token) {
        log::trace!(target: "html5.tokenizer", "emit {token:?}");
        if let Some(next) = sink.process_token(token) {
            self.state = next;
        }
    }

    fn emit_char(&mut self, sink: &mut impl TokenSink, c: char) {
        if self.is_in_attribute_return_state() {
            if let Some(tag) = &mut self.tag {
                tag.attr_value.push(c);
            }
        } else {
            self.emit(sink, Token::Character(c));
        }
    }

    fn is_in_attribute_return_state(&self) -> bool {
        matches!(
            self.return_state,
            State::AttributeValueDoubleQuoted
                | State::AttributeValueSingleQuoted
                | State::AttributeValueUnquoted
        )
    }

    fn start_tag(&mut self, is_end: bool) {
        self.tag = Some(TagBuilder {
            is_end,
            ..Default::default()
        });
    }

    fn finish_attribute(&mut self, sink: &mut impl TokenSink) {
        let Some(tag) = &mut self.tag else { return };
        if tag.attr_name.is_empty() {
            return;
        }
        let name = std::mem::take(&mut tag.attr_name);
        let value = std::mem::take(&mut tag.attr_value);
        if tag.attributes.iter().any(|a| a.name == name) {
            self.error(sink, ParseErrorKind::DuplicateAttribute);
            return;
        }
        tag.attributes.push(Attribute { name, value });
    }

    fn emit_tag(&mut self, sink: &mut impl TokenSink) {
        let Some(tag) = self.tag.take() else { return };
        if tag.is_end {
            if !tag.attributes.is_empty() {
                self.error(sink, ParseErrorKind::EndTagWithAttributes);
            }
            if tag.self_closing {
                self.error(sink, ParseErrorKind::EndTagWithTrailingSolidus);
            }
            self.emit(sink, Token::EndTag { name: tag.name });
        } else {
            self.last_start_tag_name = Some(tag.name.clone());
            self.emit(
                sink,
                Token::StartTag {
                    name: tag.name,
                    self_closing: tag.self_closing,
                    attributes: tag.attributes,
                },
            );
        }
    }

    fn is_appropriate_end_tag(&self) -> bool {
        let Some(tag) = &self.tag else { return false };
        self.last_start_tag_name.as_deref() == Some(tag.name.as_str())
    }

    fn emit_doctype(&mut self, sink: &mut impl TokenSink) {
        let Some(d) = self.doctype.take() else { return };
        self.emit(
            sink,
            Token::Doctype {
                name: d.name,
                public_id: d.public_id,
                system_id: d.system_id,
                force_quirks: d.force_quirks,
            },
        );
    }

    fn flush_temp_buffer_as_characters(&mut self, sink: &mut impl TokenSink) {
        let buffer = std::mem::take(&mut self.temp_buffer);
        for c in buffer.chars() {
            self.emit_char(sink, c);
        }
    }

    fn flush_raw_end_tag_attempt(&mut self, sink: &mut impl TokenSink, content_state: State) {
        self.emit_char(sink, '<');
        self.emit_char(sink, '/');
        let buffer = std::mem::take(&mut self.temp_buffer);
        for c in buffer.chars() {
            self.emit_char(sink, c);
        }
        self.reconsume();
        self.state = content_state;
    }

    /// Run one state-machine transition. Returns `true` once the EOF token
    /// has been emitted and tokenization is complete.
    fn step(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.state {
            State::Data => self.step_data(sink, State::Data),
            State::Rcdata => self.step_data(sink, State::Rcdata),
            State::Rawtext => self.step_data(sink, State::Rawtext),
            State::ScriptData => self.step_data(sink, State::ScriptData),
            State::Plaintext => self.step_plaintext(sink),
            State::TagOpen => self.step_tag_open(sink),
            State::EndTagOpen => self.step_end_tag_open(sink),
            State::TagName => self.step_tag_name(sink),
            State::RcdataLessThanSign => {
                self.step_raw_less_than_sign(State::RcdataEndTagOpen, State::Rcdata)
            }
            State::RcdataEndTagOpen => {
                self.step_raw_end_tag_open(State::RcdataEndTagName, State::Rcdata)
            }
            State::RcdataEndTagName => self.step_raw_end_tag_name(sink, State::Rcdata),
            State::RawtextLessThanSign => {
                self.step_raw_less_than_sign(State::RawtextEndTagOpen, State::Rawtext)
            }
            State::RawtextEndTagOpen => {
                self.step_raw_end_tag_open(State::RawtextEndTagName, State::Rawtext)
            }
            State::RawtextEndTagName => self.step_raw_end_tag_name(sink, State::Rawtext),
            State::ScriptDataLessThanSign => {
                self.step_raw_less_than_sign(State::ScriptDataEndTagOpen, State::ScriptData)
            }
            State::ScriptDataEndTagOpen => {
                self.step_raw_end_tag_open(State::ScriptDataEndTagName, State::ScriptData)
            }
            State::ScriptDataEndTagName => self.step_raw_end_tag_name(sink, State::ScriptData),
            State::BeforeAttributeName => self.step_before_attribute_name(sink),
            State::AttributeName => self.step_attribute_name(sink),
            State::AfterAttributeName => self.step_after_attribute_name(sink),
            State::BeforeAttributeValue => self.step_before_attribute_value(sink),
            State::AttributeValueDoubleQuoted => self.step_attribute_value_quoted(sink, '"'),
            State::AttributeValueSingleQuoted => self.step_attribute_value_quoted(sink, '\''),
            State::AttributeValueUnquoted => self.step_attribute_value_unquoted(sink),
            State::AfterAttributeValueQuoted => self.step_after_attribute_value_quoted(sink),
            State::SelfClosingStartTag => self.step_self_closing_start_tag(sink),
            State::BogusComment => self.step_bogus_comment(sink),
            State::MarkupDeclarationOpen => self.step_markup_declaration_open(sink),
            State::CommentStart => self.step_comment_start(sink),
            State::CommentStartDash => self.step_comment_start_dash(sink),
            State::Comment => self.step_comment(sink),
            State::CommentLessThanSign => self.step_comment_less_than_sign(),
            State::CommentLessThanSignBang => self.step_comment_less_than_sign_bang(),
            State::CommentLessThanSignBangDash => self.step_comment_less_than_sign_bang_dash(),
            State::CommentLessThanSignBangDashDash => {
                self.step_comment_less_than_sign_bang_dash_dash(sink)
            }
            State::CommentEndDash => self.step_comment_end_dash(sink),
            State::CommentEnd => self.step_comment_end(sink),
            State::CommentEndBang => self.step_comment_end_bang(sink),
            State::Doctype => self.step_doctype(sink),
            State::BeforeDoctypeName => self.step_before_doctype_name(sink),
            State::DoctypeName => self.step_doctype_name(sink),
            State::AfterDoctypeName => self.step_after_doctype_name(sink),
            State::AfterDoctypePublicKeyword => self.step_after_doctype_public_keyword(sink),
            State::BeforeDoctypePublicIdentifier => {
                self.step_before_doctype_public_identifier(sink)
            }
            State::DoctypePublicIdentifierDoubleQuoted => {
                self.step_doctype_public_identifier_quoted(sink, '"')
            }
            State::DoctypePublicIdentifierSingleQuoted => {
                self.step_doctype_public_identifier_quoted(sink, '\'')
            }
            State::AfterDoctypePublicIdentifier => self.step_after_doctype_public_identifier(sink),
            State::BetweenDoctypePublicAndSystemIdentifiers => {
                self.step_between_doctype_public_and_system_identifiers(sink)
            }
            State::AfterDoctypeSystemKeyword => self.step_after_doctype_system_keyword(sink),
            State::BeforeDoctypeSystemIdentifier => {
                self.step_before_doctype_system_identifier(sink)
            }
            State::DoctypeSystemIdentifierDoubleQuoted => {
                self.step_doctype_system_identifier_quoted(sink, '"')
            }
            State::DoctypeSystemIdentifierSingleQuoted => {
                self.step_doctype_system_identifier_quoted(sink, '\'')
            }
            State::AfterDoctypeSystemIdentifier => self.step_after_doctype_system_identifier(sink),
            State::BogusDoctype => self.step_bogus_doctype(sink),
            State::CharacterReference => self.step_character_reference(),
            State::NamedCharacterReference => self.step_named_character_reference(sink),
            State::AmbiguousAmpersand => self.step_ambiguous_ampersand(sink),
            State::NumericCharacterReference | State::NumericCharacterReferenceStart => {
                self.step_numeric_character_reference_start()
            }
            State::HexadecimalCharacterReferenceStart => {
                self.step_hex_character_reference_start(sink)
            }
            State::DecimalCharacterReferenceStart => {
                self.step_decimal_character_reference_start(sink)
            }
            State::HexadecimalCharacterReference => self.step_hex_character_reference(sink),
            State::DecimalCharacterReference => self.step_decimal_character_reference(sink),
            State::NumericCharacterReferenceEnd => self.step_numeric_character_reference_end(sink),
        }
    }

    fn step_data(&mut self, sink: &mut impl TokenSink, own_state: State) -> bool {
        match self.bump() {
            Some('&') if own_state == State::Data || own_state == State::Rcdata => {
                self.return_state = own_state;
                self.temp_buffer.clear();
                self.temp_buffer.push('&');
                self.state = State::CharacterReference;
            }
            Some('<') => {
                self.state = match own_state {
                    State::Data => State::TagOpen,
                    State::Rcdata => State::RcdataLessThanSign,
                    State::Rawtext => State::RawtextLessThanSign,
                    State::ScriptData => State::ScriptDataLessThanSign,
                    other => other,
                };
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                self.emit_char(sink, '\u{FFFD}');
            }
            Some(c) => self.emit_char(sink, c),
            None => {
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_plaintext(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                self.emit_char(sink, '\u{FFFD}');
            }
            Some(c) => self.emit_char(sink, c),
            None => {
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_tag_open(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('!') => self.state = State::MarkupDeclarationOpen,
            Some('/') => self.state = State::EndTagOpen,
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag(false);
                self.reconsume();
                self.state = State::TagName;
            }
            Some('?') => {
                self.error(sink, ParseErrorKind::UnexpectedQuestionMarkInsteadOfTagName);
                self.comment.clear();
                self.reconsume();
                self.state = State::BogusComment;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::InvalidFirstCharacterOfTagName);
                self.emit_char(sink, '<');
                self.reconsume();
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofBeforeTagName);
                self.emit_char(sink, '<');
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_end_tag_open(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag(true);
                self.reconsume();
                self.state = State::TagName;
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingEndTagName);
                self.state = State::Data;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::InvalidFirstCharacterOfTagName);
                self.comment.clear();
                self.reconsume();
                self.state = State::BogusComment;
            }
            None => {
                self.error(sink, ParseErrorKind::EofBeforeTagName);
                self.emit_char(sink, '<');
                self.emit_char(sink, '/');
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_tag_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => self.state = State::BeforeAttributeName,
            Some('/') => self.state = State::SelfClosingStartTag,
            Some('>') => {
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(tag) = &mut self.tag {
                    tag.name.push(c.to_ascii_lowercase());
                }
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(tag) = &mut self.tag {
                    tag.name.push('\u{FFFD}');
                }
            }
            Some(c) => {
                if let Some(tag) = &mut self.tag {
                    tag.name.push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    /// Shared body of `RcdataLessThanSign`/`RawtextLessThanSign`/`ScriptDataLessThanSign`:
    /// only a `/` commits to an end-tag attempt, anything else falls back to a literal `<`.
    fn step_raw_less_than_sign(&mut self, open_state: State, content_state: State) -> bool {
        match self.peek() {
            Some('/') => {
                self.bump();
                self.temp_buffer.clear();
                self.state = open_state;
            }
            _ => {
                self.state = content_state;
            }
        }
        false
    }

    /// Shared body of the `*EndTagOpen` states: an alphabetic char starts building an
    /// end tag, anything else means the `</` was not actually a tag and must be
    /// reconsumed as literal content.
    fn step_raw_end_tag_open(&mut self, name_state: State, content_state: State) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.start_tag(true);
                self.state = name_state;
            }
            _ => {
                self.state = content_state;
            }
        }
        false
    }

    fn step_raw_end_tag_name(&mut self, sink: &mut impl TokenSink, content_state: State) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() && self.is_appropriate_end_tag() => {
                self.state = State::BeforeAttributeName;
            }
            Some('/') if self.is_appropriate_end_tag() => {
                self.state = State::SelfClosingStartTag;
            }
            Some('>') if self.is_appropriate_end_tag() => {
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(tag) = &mut self.tag {
                    tag.name.push(c.to_ascii_lowercase());
                }
                self.temp_buffer.push(c);
            }
            Some(c) if c.is_ascii_lowercase() => {
                if let Some(tag) = &mut self.tag {
                    tag.name.push(c);
                }
                self.temp_buffer.push(c);
            }
            _ => {
                self.tag = None;
                self.flush_raw_end_tag_attempt(sink, content_state);
            }
        }
        false
    }

    fn step_before_attribute_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('/') | Some('>') => {
                self.reconsume();
                self.state = State::AfterAttributeName;
            }
            Some('=') => {
                self.error(sink, ParseErrorKind::UnexpectedEqualsSignBeforeAttributeName);
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.clear();
                    tag.attr_name.push('=');
                    tag.attr_value.clear();
                }
                self.state = State::AttributeName;
            }
            Some(_) => {
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.clear();
                    tag.attr_value.clear();
                }
                self.reconsume();
                self.state = State::AttributeName;
            }
            None => {
                self.reconsume();
                self.state = State::AfterAttributeName;
            }
        }
        false
    }

    fn step_attribute_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() || c == '/' || c == '>' => {
                self.reconsume();
                self.state = State::AfterAttributeName;
            }
            Some('=') => self.state = State::BeforeAttributeValue,
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.push(c.to_ascii_lowercase());
                }
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.push('\u{FFFD}');
                }
            }
            Some(c @ ('"' | '\'' | '<')) => {
                self.error(sink, ParseErrorKind::UnexpectedCharacterInAttributeName);
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.push(c);
                }
            }
            Some(c) => {
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.push(c);
                }
            }
            None => {
                self.reconsume();
                self.state = State::AfterAttributeName;
            }
        }
        false
    }

    fn step_after_attribute_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('/') => {
                self.finish_attribute(sink);
                self.state = State::SelfClosingStartTag;
            }
            Some('=') => {
                self.state = State::BeforeAttributeValue;
            }
            Some('>') => {
                self.finish_attribute(sink);
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(_) => {
                self.finish_attribute(sink);
                if let Some(tag) = &mut self.tag {
                    tag.attr_name.clear();
                    tag.attr_value.clear();
                }
                self.reconsume();
                self.state = State::AttributeName;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_before_attribute_value(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('"') => self.state = State::AttributeValueDoubleQuoted,
            Some('\'') => self.state = State::AttributeValueSingleQuoted,
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingAttributeValue);
                self.finish_attribute(sink);
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(_) => {
                self.reconsume();
                self.state = State::AttributeValueUnquoted;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_attribute_value_quoted(&mut self, sink: &mut impl TokenSink, quote: char) -> bool {
        match self.bump() {
            Some(c) if c == quote => self.state = State::AfterAttributeValueQuoted,
            Some('&') => {
                self.return_state = self.state;
                self.temp_buffer.clear();
                self.temp_buffer.push('&');
                self.state = State::CharacterReference;
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(tag) = &mut self.tag {
                    tag.attr_value.push('\u{FFFD}');
                }
            }
            Some(c) => {
                if let Some(tag) = &mut self.tag {
                    tag.attr_value.push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_attribute_value_unquoted(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {
                self.finish_attribute(sink);
                self.state = State::BeforeAttributeName;
            }
            Some('&') => {
                self.return_state = self.state;
                self.temp_buffer.clear();
                self.temp_buffer.push('&');
                self.state = State::CharacterReference;
            }
            Some('>') => {
                self.finish_attribute(sink);
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(tag) = &mut self.tag {
                    tag.attr_value.push('\u{FFFD}');
                }
            }
            Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                self.error(
                    sink,
                    ParseErrorKind::UnexpectedCharacterInUnquotedAttributeValue,
                );
                if let Some(tag) = &mut self.tag {
                    tag.attr_value.push(c);
                }
            }
            Some(c) => {
                if let Some(tag) = &mut self.tag {
                    tag.attr_value.push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_after_attribute_value_quoted(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {
                self.finish_attribute(sink);
                self.state = State::BeforeAttributeName;
            }
            Some('/') => {
                self.finish_attribute(sink);
                self.state = State::SelfClosingStartTag;
            }
            Some('>') => {
                self.finish_attribute(sink);
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingWhitespaceBetweenAttributes);
                self.finish_attribute(sink);
                self.reconsume();
                self.state = State::BeforeAttributeName;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_self_closing_start_tag(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('>') => {
                if let Some(tag) = &mut self.tag {
                    tag.self_closing = true;
                }
                self.emit_tag(sink);
                self.state = State::Data;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::UnexpectedSolidusInTag);
                self.reconsume();
                self.state = State::BeforeAttributeName;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInTag);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_bogus_comment(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('>') => {
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.state = State::Data;
            }
            Some('\0') => self.comment.push('\u{FFFD}'),
            Some(c) => self.comment.push(c),
            None => {
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_markup_declaration_open(&mut self, sink: &mut impl TokenSink) -> bool {
        if self.eat_prefix_case_insensitive("--") {
            self.comment.clear();
            self.state = State::CommentStart;
        } else if self.eat_prefix_case_insensitive("DOCTYPE") {
            self.state = State::Doctype;
        } else if self.eat_prefix_case_insensitive("[CDATA[") {
            // Foreign content (SVG/MathML) is out of scope; fall back to the
            // tokenizer's own same-as-HTML-content handling for CDATA sections.
            self.error(sink, ParseErrorKind::CdataInHtmlContent);
            self.comment.clear();
            self.state = State::BogusComment;
        } else {
            self.error(sink, ParseErrorKind::IncorrectlyOpenedComment);
            self.comment.clear();
            self.state = State::BogusComment;
        }
        false
    }

    fn step_comment_start(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('-') => self.state = State::CommentStartDash,
            Some('>') => {
                self.error(sink, ParseErrorKind::AbruptClosingOfEmptyComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.state = State::Data;
            }
            _ => {
                self.reconsume();
                self.state = State::Comment;
            }
        }
        false
    }

    fn step_comment_start_dash(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('-') => self.state = State::CommentEnd,
            Some('>') => {
                self.error(sink, ParseErrorKind::AbruptClosingOfEmptyComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.state = State::Data;
            }
            Some(_) => {
                self.comment.push('-');
                self.reconsume();
                self.state = State::Comment;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_comment(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('<') => {
                self.comment.push('<');
                self.state = State::CommentLessThanSign;
            }
            Some('-') => self.state = State::CommentEndDash,
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                self.comment.push('\u{FFFD}');
            }
            Some(c) => self.comment.push(c),
            None => {
                self.error(sink, ParseErrorKind::EofInComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_comment_less_than_sign(&mut self) -> bool {
        match self.peek() {
            Some('!') => {
                self.bump();
                self.comment.push('!');
                self.state = State::CommentLessThanSignBang;
            }
            Some('<') => {
                self.bump();
                self.comment.push('<');
            }
            _ => self.state = State::Comment,
        }
        false
    }

    fn step_comment_less_than_sign_bang(&mut self) -> bool {
        match self.peek() {
            Some('-') => {
                self.bump();
                self.state = State::CommentLessThanSignBangDash;
            }
            _ => self.state = State::Comment,
        }
        false
    }

    fn step_comment_less_than_sign_bang_dash(&mut self) -> bool {
        match self.peek() {
            Some('-') => {
                self.bump();
                self.state = State::CommentLessThanSignBangDashDash;
            }
            _ => self.state = State::CommentEndDash,
        }
        false
    }

    fn step_comment_less_than_sign_bang_dash_dash(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.peek() {
            Some('>') | None => self.state = State::CommentEnd,
            Some(_) => {
                self.error(sink, ParseErrorKind::NestedComment);
                self.state = State::CommentEnd;
            }
        }
        false
    }

    fn step_comment_end_dash(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('-') => self.state = State::CommentEnd,
            Some(_) => {
                self.comment.push('-');
                self.reconsume();
                self.state = State::Comment;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_comment_end(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('>') => {
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.state = State::Data;
            }
            Some('!') => self.state = State::CommentEndBang,
            Some('-') => self.comment.push('-'),
            Some(_) => {
                self.comment.push_str("--");
                self.reconsume();
                self.state = State::Comment;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_comment_end_bang(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('-') => {
                self.comment.push_str("--!");
                self.state = State::CommentEndDash;
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::IncorrectlyClosedComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.state = State::Data;
            }
            Some(_) => {
                self.comment.push_str("--!");
                self.reconsume();
                self.state = State::Comment;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInComment);
                self.emit(sink, Token::Comment(std::mem::take(&mut self.comment)));
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_doctype(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => self.state = State::BeforeDoctypeName,
            Some('>') => {
                self.reconsume();
                self.state = State::BeforeDoctypeName;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                self.emit(
                    sink,
                    Token::Doctype {
                        name: None,
                        public_id: None,
                        system_id: None,
                        force_quirks: true,
                    },
                );
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingWhitespaceBeforeDoctypeName);
                self.reconsume();
                self.state = State::BeforeDoctypeName;
            }
        }
        false
    }

    fn step_before_doctype_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some(c) if c.is_ascii_uppercase() => {
                self.doctype = Some(DoctypeBuilder {
                    name: Some(c.to_ascii_lowercase().to_string()),
                    ..Default::default()
                });
                self.state = State::DoctypeName;
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                self.doctype = Some(DoctypeBuilder {
                    name: Some('\u{FFFD}'.to_string()),
                    ..Default::default()
                });
                self.state = State::DoctypeName;
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingDoctypeName);
                self.emit(
                    sink,
                    Token::Doctype {
                        name: None,
                        public_id: None,
                        system_id: None,
                        force_quirks: true,
                    },
                );
                self.state = State::Data;
            }
            Some(c) => {
                self.doctype = Some(DoctypeBuilder {
                    name: Some(c.to_string()),
                    ..Default::default()
                });
                self.state = State::DoctypeName;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                self.emit(
                    sink,
                    Token::Doctype {
                        name: None,
                        public_id: None,
                        system_id: None,
                        force_quirks: true,
                    },
                );
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_doctype_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => self.state = State::AfterDoctypeName,
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some(c) if c.is_ascii_uppercase() => {
                if let Some(d) = &mut self.doctype {
                    d.name
                        .get_or_insert_with(String::new)
                        .push(c.to_ascii_lowercase());
                }
            }
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(d) = &mut self.doctype {
                    d.name.get_or_insert_with(String::new).push('\u{FFFD}');
                }
            }
            Some(c) => {
                if let Some(d) = &mut self.doctype {
                    d.name.get_or_insert_with(String::new).push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_after_doctype_name(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.reconsume();
                if self.eat_prefix_case_insensitive("PUBLIC") {
                    self.state = State::AfterDoctypePublicKeyword;
                } else if self.eat_prefix_case_insensitive("SYSTEM") {
                    self.state = State::AfterDoctypeSystemKeyword;
                } else {
                    self.error(sink, ParseErrorKind::InvalidCharacterSequenceAfterDoctypeName);
                    if let Some(d) = &mut self.doctype {
                        d.force_quirks = true;
                    }
                    self.bump();
                    self.state = State::BogusDoctype;
                }
            }
        }
        false
    }

    fn step_after_doctype_public_keyword(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {
                self.state = State::BeforeDoctypePublicIdentifier;
            }
            Some(q @ ('"' | '\'')) => {
                self.error(
                    sink,
                    ParseErrorKind::MissingWhitespaceAfterDoctypePublicKeyword,
                );
                if let Some(d) = &mut self.doctype {
                    d.public_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypePublicIdentifierDoubleQuoted
                } else {
                    State::DoctypePublicIdentifierSingleQuoted
                };
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingDoctypePublicIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypePublicIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_before_doctype_public_identifier(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some(q @ ('"' | '\'')) => {
                if let Some(d) = &mut self.doctype {
                    d.public_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypePublicIdentifierDoubleQuoted
                } else {
                    State::DoctypePublicIdentifierSingleQuoted
                };
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingDoctypePublicIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypePublicIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_doctype_public_identifier_quoted(
        &mut self,
        sink: &mut impl TokenSink,
        quote: char,
    ) -> bool {
        match self.bump() {
            Some(c) if c == quote => self.state = State::AfterDoctypePublicIdentifier,
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(d) = &mut self.doctype {
                    d.public_id.get_or_insert_with(String::new).push('\u{FFFD}');
                }
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::AbruptDoctypePublicIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some(c) => {
                if let Some(d) = &mut self.doctype {
                    d.public_id.get_or_insert_with(String::new).push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_after_doctype_public_identifier(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {
                self.state = State::BetweenDoctypePublicAndSystemIdentifiers;
            }
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some(q @ ('"' | '\'')) => {
                self.error(
                    sink,
                    ParseErrorKind::MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
                );
                if let Some(d) = &mut self.doctype {
                    d.system_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypeSystemIdentifierDoubleQuoted
                } else {
                    State::DoctypeSystemIdentifierSingleQuoted
                };
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_between_doctype_public_and_system_identifiers(
        &mut self,
        sink: &mut impl TokenSink,
    ) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some(q @ ('"' | '\'')) => {
                if let Some(d) = &mut self.doctype {
                    d.system_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypeSystemIdentifierDoubleQuoted
                } else {
                    State::DoctypeSystemIdentifierSingleQuoted
                };
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_after_doctype_system_keyword(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {
                self.state = State::BeforeDoctypeSystemIdentifier;
            }
            Some(q @ ('"' | '\'')) => {
                self.error(
                    sink,
                    ParseErrorKind::MissingWhitespaceAfterDoctypeSystemKeyword,
                );
                if let Some(d) = &mut self.doctype {
                    d.system_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypeSystemIdentifierDoubleQuoted
                } else {
                    State::DoctypeSystemIdentifierSingleQuoted
                };
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_before_doctype_system_identifier(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some(q @ ('"' | '\'')) => {
                if let Some(d) = &mut self.doctype {
                    d.system_id = Some(String::new());
                }
                self.state = if q == '"' {
                    State::DoctypeSystemIdentifierDoubleQuoted
                } else {
                    State::DoctypeSystemIdentifierSingleQuoted
                };
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::MissingDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(sink, ParseErrorKind::MissingQuoteBeforeDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_doctype_system_identifier_quoted(
        &mut self,
        sink: &mut impl TokenSink,
        quote: char,
    ) -> bool {
        match self.bump() {
            Some(c) if c == quote => self.state = State::AfterDoctypeSystemIdentifier,
            Some('\0') => {
                self.error(sink, ParseErrorKind::UnexpectedNullCharacter);
                if let Some(d) = &mut self.doctype {
                    d.system_id.get_or_insert_with(String::new).push('\u{FFFD}');
                }
            }
            Some('>') => {
                self.error(sink, ParseErrorKind::AbruptDoctypeSystemIdentifier);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some(c) => {
                if let Some(d) = &mut self.doctype {
                    d.system_id.get_or_insert_with(String::new).push(c);
                }
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_after_doctype_system_identifier(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_whitespace() => {}
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            None => {
                self.error(sink, ParseErrorKind::EofInDoctype);
                if let Some(d) = &mut self.doctype {
                    d.force_quirks = true;
                }
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
            Some(_) => {
                self.error(
                    sink,
                    ParseErrorKind::UnexpectedCharacterAfterDoctypeSystemIdentifier,
                );
                self.reconsume();
                self.state = State::BogusDoctype;
            }
        }
        false
    }

    fn step_bogus_doctype(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some('>') => {
                self.emit_doctype(sink);
                self.state = State::Data;
            }
            Some('\0') => self.error(sink, ParseErrorKind::UnexpectedNullCharacter),
            Some(_) => {}
            None => {
                self.emit_doctype(sink);
                self.emit(sink, Token::Eof);
                return true;
            }
        }
        false
    }

    fn step_character_reference(&mut self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_alphanumeric() => {
                self.state = State::NamedCharacterReference;
            }
            Some('#') => {
                self.bump();
                self.temp_buffer.push('#');
                self.state = State::NumericCharacterReferenceStart;
            }
            _ => self.state = self.return_state,
        }
        false
    }

    fn step_named_character_reference(&mut self, sink: &mut impl TokenSink) -> bool {
        let rest: String = self.input[self.pos..].iter().collect();
        if let Some((len, chars)) = longest_named_match(&rest) {
            let consumed: Vec<char> = self.input[self.pos..self.pos + len].to_vec();
            for c in &consumed {
                self.bump();
                self.temp_buffer.push(*c);
            }
            let ends_with_semicolon = consumed.last() == Some(&';');
            let next_is_equals_or_alnum =
                matches!(self.peek(), Some(c) if c == '=' || c.is_ascii_alphanumeric());
            if self.is_in_attribute_return_state() && !ends_with_semicolon && next_is_equals_or_alnum
            {
                self.flush_temp_buffer_as_characters(sink);
            } else {
                if !ends_with_semicolon {
                    self.error(sink, ParseErrorKind::MissingSemicolonAfterCharacterReference);
                }
                self.temp_buffer.clear();
                for c in chars {
                    self.emit_char(sink, *c);
                }
            }
            self.state = self.return_state;
        } else {
            self.flush_temp_buffer_as_characters(sink);
            self.state = State::AmbiguousAmpersand;
        }
        false
    }

    fn step_ambiguous_ampersand(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_alphanumeric() => self.emit_char(sink, c),
            Some(';') => {
                self.error(sink, ParseErrorKind::UnknownNamedCharacterReference);
                self.reconsume();
                self.state = self.return_state;
            }
            _ => {
                self.reconsume();
                self.state = self.return_state;
            }
        }
        false
    }

    fn step_numeric_character_reference_start(&mut self) -> bool {
        self.char_ref_code = 0;
        match self.peek() {
            Some('x') | Some('X') => {
                let c = self.bump().unwrap();
                self.temp_buffer.push(c);
                self.state = State::HexadecimalCharacterReferenceStart;
            }
            _ => self.state = State::DecimalCharacterReferenceStart,
        }
        false
    }

    fn step_hex_character_reference_start(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_hexdigit() => self.state = State::HexadecimalCharacterReference,
            _ => {
                self.error(
                    sink,
                    ParseErrorKind::AbsenceOfDigitsInNumericCharacterReference,
                );
                self.flush_temp_buffer_as_characters(sink);
                self.state = self.return_state;
            }
        }
        false
    }

    fn step_decimal_character_reference_start(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => self.state = State::DecimalCharacterReference,
            _ => {
                self.error(
                    sink,
                    ParseErrorKind::AbsenceOfDigitsInNumericCharacterReference,
                );
                self.flush_temp_buffer_as_characters(sink);
                self.state = self.return_state;
            }
        }
        false
    }

    fn step_hex_character_reference(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_hexdigit() => {
                self.char_ref_code = self
                    .char_ref_code
                    .saturating_mul(16)
                    .saturating_add(c.to_digit(16).unwrap());
            }
            Some(';') => self.state = State::NumericCharacterReferenceEnd,
            _ => {
                self.error(sink, ParseErrorKind::MissingSemicolonAfterCharacterReference);
                self.reconsume();
                self.state = State::NumericCharacterReferenceEnd;
            }
        }
        false
    }

    fn step_decimal_character_reference(&mut self, sink: &mut impl TokenSink) -> bool {
        match self.bump() {
            Some(c) if c.is_ascii_digit() => {
                self.char_ref_code = self
                    .char_ref_code
                    .saturating_mul(10)
                    .saturating_add(c.to_digit(10).unwrap());
            }
            Some(';') => self.state = State::NumericCharacterReferenceEnd,
            _ => {
                self.error(sink, ParseErrorKind::MissingSemicolonAfterCharacterReference);
                self.reconsume();
                self.state = State::NumericCharacterReferenceEnd;
            }
        }
        false
    }

    fn step_numeric_character_reference_end(&mut self, sink: &mut impl TokenSink) -> bool {
        let code = self.char_ref_code;
        let resolved = if code == 0 {
            self.error(sink, ParseErrorKind::NullCharacterReference);
            '\u{FFFD}'
        } else if code > 0x10FFFF {
            self.error(sink, ParseErrorKind::CharacterReferenceOutsideUnicodeRange);
            '\u{FFFD}'
        } else if (0xD800..=0xDFFF).contains(&code) {
            self.error(sink, ParseErrorKind::SurrogateCharacterReference);
            '\u{FFFD}'
        } else if let Some(replacement) = c1_control_replacement(code) {
            self.error(sink, ParseErrorKind::ControlCharacterReference);
            replacement
        } else if is_noncharacter(code) {
            self.error(sink, ParseErrorKind::NoncharacterCharacterReference);
            char::from_u32(code).unwrap_or('\u{FFFD}')
        } else if code == 0x0D || (code < 0x20 && code != 0x09 && code != 0x0A) || code == 0x7F {
            self.error(sink, ParseErrorKind::ControlCharacterReference);
            char::from_u32(code).unwrap_or('\u{FFFD}')
        } else {
            char::from_u32(code).unwrap_or('\u{FFFD}')
        };
        self.temp_buffer.clear();
        self.emit_char(sink, resolved);
        self.state = self.return_state;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(source: &str) -> TokenCollector {
        let mut sink = TokenCollector::default();
        Tokenizer::new(source).run(&mut sink);
        sink
    }

    #[test]
    fn plain_text_emits_one_character_token_per_codepoint() {
        let sink = tokenize("hi");
        assert_eq!(
            sink.tokens,
            vec![Token::Character('h'), Token::Character('i'), Token::Eof]
        );
    }

    #[test]
    fn simple_start_and_end_tag() {
        let sink = tokenize("<p>hi</p>");
        assert_eq!(
            sink.tokens[0],
            Token::StartTag {
                name: "p".into(),
                self_closing: false,
                attributes: vec![],
            }
        );
        assert_eq!(sink.tokens.last().unwrap(), &Token::Eof);
        assert!(sink.tokens.contains(&Token::EndTag { name: "p".into() }));
    }

    #[test]
    fn attribute_parsing_lowercases_names_and_keeps_values() {
        let sink = tokenize("<a HREF='x' title=\"y\" disabled>");
        let Token::StartTag { attributes, .. } = &sink.tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(
            attributes,
            &vec![
                Attribute {
                    name: "href".into(),
                    value: "x".into()
                },
                Attribute {
                    name: "title".into(),
                    value: "y".into()
                },
                Attribute {
                    name: "disabled".into(),
                    value: "".into()
                },
            ]
        );
    }

    #[test]
    fn duplicate_attribute_is_dropped_and_reported() {
        let sink = tokenize("<a x=\"1\" x=\"2\">");
        let Token::StartTag { attributes, .. } = &sink.tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(attributes, &vec![Attribute { name: "x".into(), value: "1".into() }]);
        assert!(sink
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::DuplicateAttribute));
    }

    #[test]
    fn named_character_reference_decodes_with_semicolon() {
        let sink = tokenize("&amp;");
        assert_eq!(sink.tokens, vec![Token::Character('&'), Token::Eof]);
    }

    #[test]
    fn missing_semicolon_is_reported_but_still_decodes() {
        let sink = tokenize("&amp rest");
        assert!(sink
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::MissingSemicolonAfterCharacterReference));
        assert_eq!(sink.tokens[0], Token::Character('&'));
    }

    #[test]
    fn unknown_named_reference_falls_back_to_ambiguous_ampersand() {
        let sink = tokenize("&notareference;");
        // The literal text is reproduced as individual character tokens.
        let text: String = sink
            .tokens
            .iter()
            .take_while(|t| **t != Token::Eof)
            .map(|t| match t {
                Token::Character(c) => *c,
                _ => panic!("unexpected token"),
            })
            .collect();
        assert_eq!(text, "&notareference;");
    }

    #[test]
    fn decimal_and_hex_numeric_references() {
        let sink = tokenize("&#65;&#x42;");
        assert_eq!(
            sink.tokens,
            vec![Token::Character('A'), Token::Character('B'), Token::Eof]
        );
    }

    #[test]
    fn null_numeric_reference_becomes_replacement_character() {
        let sink = tokenize("&#0;");
        assert_eq!(sink.tokens[0], Token::Character('\u{FFFD}'));
        assert!(sink
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::NullCharacterReference));
    }

    #[test]
    fn comment_is_captured_verbatim() {
        let sink = tokenize("<!-- hello -->");
        assert_eq!(sink.tokens[0], Token::Comment(" hello ".into()));
    }

    #[test]
    fn doctype_name_is_lowercased() {
        let sink = tokenize("<!DOCTYPE HTML>");
        assert_eq!(
            sink.tokens[0],
            Token::Doctype {
                name: Some("html".into()),
                public_id: None,
                system_id: None,
                force_quirks: false,
            }
        );
    }

    #[test]
    fn doctype_with_public_and_system_identifiers() {
        let sink = tokenize(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">",
        );
        assert_eq!(
            sink.tokens[0],
            Token::Doctype {
                name: Some("html".into()),
                public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
                system_id: Some("http://www.w3.org/TR/html4/strict.dtd".into()),
                force_quirks: false,
            }
        );
    }

    #[test]
    fn null_character_in_data_is_replaced_and_reported() {
        let sink = tokenize("a\0b");
        assert_eq!(
            sink.tokens,
            vec![
                Token::Character('a'),
                Token::Character('\u{FFFD}'),
                Token::Character('b'),
                Token::Eof,
            ]
        );
        assert!(sink
            .errors
            .iter()
            .any(|e| e.kind == ParseErrorKind::UnexpectedNullCharacter));
    }

    #[test]
    fn rawtext_end_tag_must_match_last_start_tag_name() {
        struct ScriptDataSink {
            collector: TokenCollector,
        }
        impl TokenSink for ScriptDataSink {
            fn process_token(&mut self, token: Token) -> Option<State> {
                let switch = matches!(&token, Token::StartTag { name, .. } if name == "script")
                    .then_some(State::ScriptData);
                self.collector.tokens.push(token);
                switch
            }
        }
        let mut sink = ScriptDataSink {
            collector: TokenCollector::default(),
        };
        Tokenizer::new("<script>var x = 1 < 2;</script>after").run(&mut sink);
        assert!(sink
            .collector
            .tokens
            .contains(&Token::EndTag { name: "script".into() }));
        // The `<` inside the script body must not have been treated as a tag.
        assert!(!sink
            .collector
            .tokens
            .iter()
            .any(|t| matches!(t, Token::StartTag { name, .. } if name == "2")));
    }

    #[test]
    fn eof_in_tag_still_emits_a_single_trailing_eof_token() {
        let sink = tokenize("<div class=");
        assert_eq!(sink.tokens.last(), Some(&Token::Eof));
        assert_eq!(sink.tokens.iter().filter(|t| **t == Token::Eof).count(), 1);
    }
}
