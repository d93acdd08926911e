use std::fmt;

/// Position of a character in some source string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePosition {
    /// Byte offset of the character in the source.
    pub idx: usize,
    /// 1-based line number.
    pub lineno: usize,
    /// 1-based column number.
    pub colno: usize,
}

impl SourcePosition {
    pub fn new(idx: usize, lineno: usize, colno: usize) -> SourcePosition {
        SourcePosition { idx, lineno, colno }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.lineno, self.colno)
    }
}

/// A syntactically relevant piece of text: the kind of terminal it
/// represents, the matched text, and where its first character sits in
/// the source. Tokens produced synthetically (end-of-input, recovery)
/// carry no position.
#[derive(Clone, Debug)]
pub struct Token {
    pub name: String,
    pub value: String,
    pub source_pos: Option<SourcePosition>,
}

impl Token {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Token {
        Token {
            name: name.into(),
            value: value.into(),
            source_pos: None,
        }
    }

    pub fn with_pos(
        name: impl Into<String>,
        value: impl Into<String>,
        source_pos: SourcePosition,
    ) -> Token {
        Token {
            name: name.into(),
            value: value.into(),
            source_pos: Some(source_pos),
        }
    }
}

// Positions are bookkeeping, not identity
impl PartialEq for Token {
    fn eq(&self, other: &Token) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?})", self.name, self.value)
    }
}
