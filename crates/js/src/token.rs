//! The ~55 token kinds produced by the tokenizer, plus the 38 reserved words.

/// A single lexical token.
///
/// `PartialEq`/`Eq` let tests compare token streams directly; `Clone` is
/// needed because the parser walks a borrowed slice but occasionally needs
/// to pull an owned value (e.g. an identifier's name) out of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    IntLiteral(i32),
    StringLiteral(String),
    Identifier(String),
    Comment(String),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Period,
    Equals,
    Plus,
    Asterisk,
    Eof,

    // Reserved words, https://tc39.es/ecma262/#prod-ReservedWord
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    InstanceOf,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    TypeOf,
    Var,
    Void,
    While,
    With,
    Yield,
}

/// Reserved-word text -> token, checked after an identifier is lexed in full.
pub(crate) const RESERVED_WORDS: &[(&str, Token)] = &[
    ("await", Token::Await),
    ("break", Token::Break),
    ("case", Token::Case),
    ("catch", Token::Catch),
    ("class", Token::Class),
    ("const", Token::Const),
    ("continue", Token::Continue),
    ("debugger", Token::Debugger),
    ("default", Token::Default),
    ("delete", Token::Delete),
    ("do", Token::Do),
    ("else", Token::Else),
    ("enum", Token::Enum),
    ("export", Token::Export),
    ("extends", Token::Extends),
    ("false", Token::False),
    ("finally", Token::Finally),
    ("for", Token::For),
    ("function", Token::Function),
    ("if", Token::If),
    ("import", Token::Import),
    ("in", Token::In),
    ("instanceof", Token::InstanceOf),
    ("new", Token::New),
    ("null", Token::Null),
    ("return", Token::Return),
    ("super", Token::Super),
    ("switch", Token::Switch),
    ("this", Token::This),
    ("throw", Token::Throw),
    ("true", Token::True),
    ("try", Token::Try),
    ("typeof", Token::TypeOf),
    ("var", Token::Var),
    ("void", Token::Void),
    ("while", Token::While),
    ("with", Token::With),
    ("yield", Token::Yield),
];
