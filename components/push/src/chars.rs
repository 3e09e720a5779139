//! XML character classes
//!
//! See https://www.w3.org/TR/xml/#charsets and https://www.w3.org/TR/xml/#NT-Name

pub trait XmlChar {
    /// `Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`
    fn is_xml_char(self) -> bool;
    /// `S ::= (#x20 | #x9 | #xD | #xA)+`
    fn is_xml_whitespace(self) -> bool;
    fn is_xml_name_start_char(self) -> bool;
    fn is_xml_name_char(self) -> bool;
}

impl XmlChar for char {
    #[inline]
    fn is_xml_char(self) -> bool {
        matches!(
            self,
            '\u{9}'
                | '\u{A}'
                | '\u{D}'
                | '\u{20}'..='\u{D7FF}'
                | '\u{E000}'..='\u{FFFD}'
                | '\u{10000}'..='\u{10FFFF}'
        )
    }

    #[inline]
    fn is_xml_whitespace(self) -> bool {
        matches!(self, ' ' | '\t' | '\r' | '\n')
    }

    fn is_xml_name_start_char(self) -> bool {
        if self.is_ascii() {
            return (self as u8).is_xml_name_start_char();
        }

        matches!(
            self,
            '\u{C0}'..='\u{D6}'
                | '\u{D8}'..='\u{F6}'
                | '\u{F8}'..='\u{2FF}'
                | '\u{370}'..='\u{37D}'
                | '\u{37F}'..='\u{1FFF}'
                | '\u{200C}'..='\u{200D}'
                | '\u{2070}'..='\u{218F}'
                | '\u{2C00}'..='\u{2FEF}'
                | '\u{3001}'..='\u{D7FF}'
                | '\u{F900}'..='\u{FDCF}'
                | '\u{FDF0}'..='\u{FFFD}'
                | '\u{10000}'..='\u{EFFFF}'
        )
    }

    fn is_xml_name_char(self) -> bool {
        if self.is_ascii() {
            return (self as u8).is_xml_name_char();
        }

        self.is_xml_name_start_char()
            || matches!(self, '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
    }
}

/// Fast path for bytes of ASCII-compatible input
pub trait XmlAsciiChar {
    fn is_xml_whitespace(self) -> bool;
    fn is_xml_name_start_char(self) -> bool;
    fn is_xml_name_char(self) -> bool;
}

impl XmlAsciiChar for u8 {
    #[inline]
    fn is_xml_whitespace(self) -> bool {
        matches!(self, b' ' | b'\t' | b'\r' | b'\n')
    }

    #[inline]
    fn is_xml_name_start_char(self) -> bool {
        matches!(self, b':' | b'_' | b'A'..=b'Z' | b'a'..=b'z')
    }

    #[inline]
    fn is_xml_name_char(self) -> bool {
        self.is_xml_name_start_char() || matches!(self, b'-' | b'.' | b'0'..=b'9')
    }
}
