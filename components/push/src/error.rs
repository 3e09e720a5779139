use std::fmt;

/// Category of a parser failure
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Syntax error in tag, reference, or declaration structure
    MalformedMarkup,
    /// End tag without matching start tag, or element left open at the end
    UnbalancedElement,
    /// Undecodable byte sequence or unsupported encoding name
    EncodingError,
    /// Misuse of the parser API
    InvalidArgument,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCode::MalformedMarkup => "malformed markup",
            ErrorCode::UnbalancedElement => "unbalanced element",
            ErrorCode::EncodingError => "encoding error",
            ErrorCode::InvalidArgument => "invalid argument",
        })
    }
}

/// Fatal parsing error
#[derive(Clone, Debug, PartialEq)]
pub enum XmlError {
    /// Input ended inside a construct; more input may complete it
    UnexpectedEof,
    /// Input ended inside a construct and no more input follows
    UnclosedToken,
    IllegalNameStartChar(char),
    IllegalChar(char),
    UnexpectedCharacter(char),
    ExpectedWhitespace,
    ExpectedEquals,
    ExpectedAttrValue,
    ExpectedElementEnd,
    ExpectedElementStart,
    ExpectToken(&'static str),
    IllegalAttributeValue(&'static str),
    LtInAttributeValue,
    InvalidCharacterReference(String),
    IllegalReference,
    UnknownEntity(String),
    IllegalCDataSectionEnd,
    CommentDoubleHyphen,
    /// Processing Instruction target should not be `xml` (case-insensitive)
    InvalidPITarget,
    MisplacedDocType,
    JunkAfterDocElement,
    NoRootElement,
    WrongETagName {
        expected_name: String,
        found: String,
    },
    ETagWithoutStart(String),
    OpenElementAtEof(String),
    UnsupportedEncoding(String),
    Decoding(&'static str),
    ParsingFinished,
}

impl XmlError {
    pub fn code(&self) -> ErrorCode {
        match self {
            XmlError::WrongETagName { .. }
            | XmlError::ETagWithoutStart(_)
            | XmlError::OpenElementAtEof(_) => ErrorCode::UnbalancedElement,
            XmlError::UnsupportedEncoding(_) | XmlError::Decoding(_) => ErrorCode::EncodingError,
            _ => ErrorCode::MalformedMarkup,
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::UnexpectedEof => write!(f, "unexpected end of input"),
            XmlError::UnclosedToken => write!(f, "unclosed token"),
            XmlError::IllegalNameStartChar(c) => {
                write!(f, "not well-formed: {:?} cannot start a name", c)
            }
            XmlError::IllegalChar(c) => write!(f, "not well-formed: illegal character {:?}", c),
            XmlError::UnexpectedCharacter(c) => write!(f, "syntax error: unexpected {:?}", c),
            XmlError::ExpectedWhitespace => write!(f, "not well-formed: expected whitespace"),
            XmlError::ExpectedEquals => write!(f, "not well-formed: expected '='"),
            XmlError::ExpectedAttrValue => write!(f, "not well-formed: expected quoted value"),
            XmlError::ExpectedElementEnd => write!(f, "not well-formed: expected '>'"),
            XmlError::ExpectedElementStart => write!(f, "not well-formed: invalid markup"),
            XmlError::ExpectToken(token) => write!(f, "not well-formed: expected {}", token),
            XmlError::IllegalAttributeValue(msg) => write!(f, "not well-formed: {}", msg),
            XmlError::LtInAttributeValue => write!(f, "not well-formed: '<' in attribute value"),
            XmlError::InvalidCharacterReference(code) => {
                write!(f, "reference to invalid character number '{}'", code)
            }
            XmlError::IllegalReference => write!(f, "not well-formed: invalid reference"),
            XmlError::UnknownEntity(name) => write!(f, "undefined entity '{}'", name),
            XmlError::IllegalCDataSectionEnd => {
                write!(f, "not well-formed: ']]>' in character data")
            }
            XmlError::CommentDoubleHyphen => write!(f, "not well-formed: '--' in comment"),
            XmlError::InvalidPITarget => {
                write!(f, "reserved processing instruction target 'xml'")
            }
            XmlError::MisplacedDocType => write!(f, "misplaced document type declaration"),
            XmlError::JunkAfterDocElement => write!(f, "junk after document element"),
            XmlError::NoRootElement => write!(f, "no element found"),
            XmlError::WrongETagName {
                expected_name,
                found,
            } => write!(
                f,
                "mismatched tag: expected </{}> but found </{}>",
                expected_name, found
            ),
            XmlError::ETagWithoutStart(name) => {
                write!(f, "end tag </{}> without matching start tag", name)
            }
            XmlError::OpenElementAtEof(name) => write!(f, "unclosed element <{}>", name),
            XmlError::UnsupportedEncoding(name) => write!(f, "unknown encoding '{}'", name),
            XmlError::Decoding(encoding) => {
                write!(f, "invalid byte sequence for encoding {}", encoding)
            }
            XmlError::ParsingFinished => write!(f, "parsing finished"),
        }
    }
}

impl std::error::Error for XmlError {}

/// Location inside the decoded document
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Characters from the start of the document
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column in characters
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Position {
    pub(crate) fn advance_over(&mut self, text: &str) {
        for c in text.chars() {
            self.offset += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

/// Recorded failure of a [`PushParser`](crate::PushParser)
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorInfo {
    reason: XmlError,
    description: String,
    position: Position,
}

impl ErrorInfo {
    pub(crate) fn new(reason: XmlError, position: Position) -> Self {
        Self {
            description: reason.to_string(),
            reason,
            position,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.reason.code()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reason(&self) -> &XmlError {
        &self.reason
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.description, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for ErrorInfo {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// Usage fault reported directly to the caller
///
/// Never recorded as parser error state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidArgument(&'static str);

impl InvalidArgument {
    pub(crate) fn new(message: &'static str) -> Self {
        Self(message)
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument: {}", self.0)
    }
}

impl std::error::Error for InvalidArgument {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(
            ErrorCode::UnbalancedElement,
            XmlError::OpenElementAtEof("a".to_string()).code()
        );
        assert_eq!(
            ErrorCode::EncodingError,
            XmlError::UnsupportedEncoding("x".to_string()).code()
        );
        assert_eq!(ErrorCode::MalformedMarkup, XmlError::UnclosedToken.code());
        assert_eq!(
            ErrorCode::InvalidArgument,
            InvalidArgument::new("late").code()
        );
    }

    #[test]
    fn position_counts_lines() {
        let mut pos = Position::default();
        pos.advance_over("<a>\n  ä");
        assert_eq!(
            Position {
                offset: 7,
                line: 2,
                column: 4
            },
            pos
        );
    }

    #[test]
    fn info_display() {
        let info = ErrorInfo::new(XmlError::NoRootElement, Position::default());
        assert_eq!("no element found at line 1, column 1", info.to_string());
        assert_eq!(ErrorCode::MalformedMarkup, info.code());
    }
}
