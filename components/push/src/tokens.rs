//! Token parsers for XML 1.0 constructs
//!
//! Every parser reports [`XmlError::UnexpectedEof`] when the buffer ends inside
//! the construct, so the caller can wait for more input instead of failing.

use std::borrow::Cow;

use memchr::{memchr, memmem};

use crate::chars::{XmlAsciiChar, XmlChar};
use crate::parser::core::{kleene, map_error, optional, raw};
use crate::parser::string::{char_, chars, lit};
use crate::parser::{Cursor, Parser};
use crate::{XmlDecl, XmlError};

// Common

#[inline]
pub fn xml_lit<'a>(literal: &'static str) -> impl Parser<'a, Attribute = (), Error = XmlError> {
    map_error(lit(literal), move |_| XmlError::ExpectToken(literal))
}

/// Whether the input continues with `literal`
///
/// Fails with `UnexpectedEof` if the input ends inside a prefix of `literal`.
pub fn has_next_lit(cursor: Cursor, literal: &str) -> Result<bool, XmlError> {
    let rest = cursor.rest();
    if rest.starts_with(literal) {
        Ok(true)
    } else if literal.starts_with(rest) {
        Err(XmlError::UnexpectedEof)
    } else {
        Ok(false)
    }
}

pub fn skip_whitespace(cursor: Cursor) -> (bool, Cursor) {
    let size = cursor
        .rest_bytes()
        .iter()
        .take_while(|c| c.is_xml_whitespace())
        .count();
    (size > 0, cursor.advance(size))
}

fn expect_token<'a>(cursor: Cursor<'a>, token: &'static str) -> Result<((), Cursor<'a>), XmlError> {
    if !cursor.has_next_str(token) {
        Err(XmlError::ExpectToken(token))
    } else {
        Ok(((), cursor.advance(token.len())))
    }
}

pub fn check_chars(chars: &str) -> Result<(), XmlError> {
    match chars.chars().find(|c| !c.is_xml_char()) {
        Some(c) => Err(XmlError::IllegalChar(c)),
        None => Ok(()),
    }
}

/// Chars up to (excluding) a terminator
struct TerminatedChars(&'static str);

impl<'a> Parser<'a> for TerminatedChars {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        let pos = memmem::find(cursor.rest_bytes(), self.0.as_bytes())
            .ok_or(XmlError::UnexpectedEof)?;
        let res = cursor.advance2(pos);
        check_chars(res.0)?;
        Ok(res)
    }
}

// 2.3 Common Syntactic Constructs

/// White Space
///
/// ```text
/// S ::= (#x20 | #x9 | #xD | #xA)+
/// ```
///
pub struct SToken;

impl<'a> Parser<'a> for SToken {
    type Attribute = ();
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        match skip_whitespace(cursor) {
            (true, cursor) => Ok(((), cursor)),
            (false, cursor) if cursor.is_at_end() => Err(XmlError::UnexpectedEof),
            (false, _) => Err(XmlError::ExpectedWhitespace),
        }
    }
}

/// Name
///
/// ```text
/// Name ::= NameStartChar (NameChar)*
/// ```
///
/// A name running up to the end of the buffer is incomplete.
pub struct NameToken;

impl<'a> Parser<'a> for NameToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        let mut chars = cursor.rest().char_indices();

        match chars.next() {
            Some((_, c)) if c.is_xml_name_start_char() => {}
            Some((_, c)) => return Err(XmlError::IllegalNameStartChar(c)),
            None => return Err(XmlError::UnexpectedEof),
        }

        match chars.find(|(_, c)| !c.is_xml_name_char()) {
            Some((i, _)) => Ok(cursor.advance2(i)),
            None => Err(XmlError::UnexpectedEof),
        }
    }
}

/// ```text
/// Eq ::= S? '=' S?
/// ```
pub struct EqToken;

impl<'a> Parser<'a> for EqToken {
    type Attribute = ();
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        let (_, cursor) = skip_whitespace(cursor);
        match cursor.next_byte(0) {
            Some(b'=') => Ok(((), skip_whitespace(cursor.advance(1)).1)),
            Some(_) => Err(XmlError::ExpectedEquals),
            None => Err(XmlError::UnexpectedEof),
        }
    }
}

/// Attribute value
///
/// ```text
/// AttValue ::= '"' ([^<&"] | Reference)* '"' |  "'" ([^<&'] | Reference)* "'"
/// ```
///
/// Yields the normalized value: references are resolved and every white space
/// character (`\r\n` counting as one) becomes a space.
pub struct AttValueToken;

impl<'a> Parser<'a> for AttValueToken {
    type Attribute = Cow<'a, str>;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        let quote = match cursor.next_byte(0) {
            Some(quote @ (b'"' | b'\'')) => quote,
            Some(_) => return Err(XmlError::ExpectedAttrValue),
            None => return Err(XmlError::UnexpectedEof),
        };

        let start = cursor.advance(1);
        let end = memchr(quote, start.rest_bytes()).ok_or(XmlError::UnexpectedEof)?;
        let (raw_value, _) = start.advance2(end);
        Ok((normalize_attr_value(raw_value)?, start.advance(end + 1)))
    }
}

fn normalize_attr_value(raw_value: &str) -> Result<Cow<'_, str>, XmlError> {
    if !raw_value
        .bytes()
        .any(|c| matches!(c, b'&' | b'<' | b'\t' | b'\n' | b'\r'))
    {
        check_chars(raw_value)?;
        return Ok(Cow::Borrowed(raw_value));
    }

    let mut value = String::with_capacity(raw_value.len());
    let mut cursor = Cursor::new(raw_value);
    while let Some(c) = cursor.next_char() {
        match c {
            '<' => return Err(XmlError::LtInAttributeValue),
            '&' => {
                // the closing quote is known, so a cut reference is malformed
                let (c, next) = ReferenceToken.parse(cursor).map_err(|err| match err {
                    XmlError::UnexpectedEof => XmlError::IllegalReference,
                    err => err,
                })?;
                value.push(c);
                cursor = next;
                continue;
            }
            '\r' if cursor.next_byte(1) == Some(b'\n') => {
                value.push(' ');
                cursor = cursor.advance(2);
                continue;
            }
            '\t' | '\n' | '\r' => value.push(' '),
            c if !c.is_xml_char() => return Err(XmlError::IllegalChar(c)),
            c => value.push(c),
        }
        cursor = cursor.advance(c.len_utf8());
    }

    Ok(Cow::Owned(value))
}

// 2.5 Comments

/// ```text
/// Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'
/// ```
pub struct CommentToken;

impl<'a> Parser<'a> for CommentToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("<!--").parse(cursor)?;
        let pos = memmem::find(cursor.rest_bytes(), b"--").ok_or(XmlError::UnexpectedEof)?;
        let (comment, cursor) = cursor.advance2(pos);
        match cursor.next_byte(2) {
            Some(b'>') => {}
            Some(_) => return Err(XmlError::CommentDoubleHyphen),
            None => return Err(XmlError::UnexpectedEof),
        }
        check_chars(comment)?;
        Ok((comment, cursor.advance(3)))
    }
}

// 2.6 Processing Instructions

/// Processing Instruction
///
/// ```text
/// PI ::= '<?' PITarget (S (Char* - (Char* '?>' Char*)))? '?>'
/// PITarget ::= Name - (('X' | 'x') ('M' | 'm') ('L' | 'l'))
/// ```
pub struct PIToken;

impl<'a> Parser<'a> for PIToken {
    type Attribute = (&'a str, &'a str);
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("<?").parse(cursor)?;
        let (target, cursor) = NameToken.parse(cursor)?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(XmlError::InvalidPITarget);
        }

        if has_next_lit(cursor, "?>")? {
            return Ok(((target, ""), cursor.advance(2)));
        }

        let (_, cursor) = SToken.parse(cursor)?;
        let (data, cursor) = TerminatedChars("?>").parse(cursor)?;
        Ok(((target, data), cursor.advance(2)))
    }
}

// 2.7 CDATA Sections

/// CDATA Section
///
/// ```text
/// CDSect  ::= CDStart CData CDEnd
/// CDStart ::= '<![CDATA['
/// CData   ::= (Char* - (Char* ']]>' Char*))
/// CDEnd   ::= ']]>'
/// ```
pub struct CDataToken;

impl<'a> Parser<'a> for CDataToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("<![CDATA[").parse(cursor)?;
        let (chars, cursor) = TerminatedChars("]]>").parse(cursor)?;
        Ok((chars, cursor.advance(3)))
    }
}

// 2.8 Prolog and Document Type Declaration

/// XML declaration, complete up to `?>`
pub fn parse_xml_decl(cursor: Cursor) -> Result<(XmlDecl, Cursor), XmlError> {
    let end = memmem::find(cursor.rest_bytes(), b"?>").ok_or(XmlError::UnexpectedEof)?;
    let (decl_str, after) = cursor.advance2(end + 2);
    let (decl, rest) = XmlDeclToken
        .parse(Cursor::new(decl_str))
        .map_err(|err| match err {
            XmlError::UnexpectedEof => XmlError::ExpectToken("?>"),
            err => err,
        })?;
    if !rest.is_at_end() {
        return Err(XmlError::ExpectToken("?>"));
    }
    Ok((decl, after))
}

/// ```text
/// XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'
/// ```
pub struct XmlDeclToken;

impl<'a> Parser<'a> for XmlDeclToken {
    type Attribute = XmlDecl;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("<?xml").parse(cursor)?;
        let (version, cursor) = VersionInfoToken.parse(cursor)?;
        let (encoding, cursor) = optional(EncodingDeclToken).parse(cursor)?;
        let (standalone, cursor) = optional(SDDeclToken).parse(cursor)?;
        let (_, cursor) = optional(SToken).parse(cursor)?;
        let (_, cursor) = xml_lit("?>").parse(cursor)?;

        Ok((XmlDecl::new(Some(version), encoding, standalone), cursor))
    }
}

/// Value in single or double quotes
fn quoted<'a, P>(cursor: Cursor<'a>, value: P) -> Result<(&'a str, Cursor<'a>), XmlError>
where
    P: Parser<'a, Attribute = &'a str, Error = XmlError>,
{
    let quote = match cursor.next_byte(0) {
        Some(b'\'') => "\'",
        Some(b'"') => "\"",
        _ => return Err(XmlError::ExpectToken("' or \"")),
    };
    let (value, cursor) = value.parse(cursor.advance(1))?;
    let (_, cursor) = expect_token(cursor, quote)?;
    Ok((value, cursor))
}

/// ```text
/// VersionInfo ::= S 'version' Eq ("'" VersionNum "'" | '"' VersionNum '"')
/// ```
pub struct VersionInfoToken;

impl<'a> Parser<'a> for VersionInfoToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = SToken.parse(cursor)?;
        let (_, cursor) = expect_token(cursor, "version")?;
        let (_, cursor) = EqToken.parse(cursor)?;
        quoted(cursor, VersionNumToken)
    }
}

/// ```text
/// VersionNum ::= '1.' [0-9]+
/// ```
pub struct VersionNumToken;

impl<'a> Parser<'a> for VersionNumToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        map_error(
            raw((lit("1."), chars(|c: char| c.is_ascii_digit()))),
            |_| XmlError::ExpectToken("1.[0-9]+"),
        )
        .parse(cursor)
    }
}

/// Document type declaration, skipped without interpretation
///
/// ```text
/// doctypedecl ::= '<!DOCTYPE' S Name (S ExternalID)? S? ('[' intSubset ']' S?)? '>'
/// ```
pub struct DocTypeToken;

impl<'a> Parser<'a> for DocTypeToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("<!DOCTYPE").parse(cursor)?;
        let (_, cursor) = SToken.parse(cursor)?;
        let (name, cursor) = NameToken.parse(cursor)?;

        let bytes = cursor.rest_bytes();
        let mut quote = None;
        let mut depth = 0usize;
        let mut i = 0;
        while let Some(&c) = bytes.get(i) {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    b'"' | b'\'' => quote = Some(c),
                    b'[' => depth += 1,
                    b']' if depth == 0 => return Err(XmlError::UnexpectedCharacter(']')),
                    b']' => depth -= 1,
                    b'<' if bytes[i..].starts_with(b"<!--") => {
                        let end = memmem::find(&bytes[i + 4..], b"-->")
                            .ok_or(XmlError::UnexpectedEof)?;
                        i += 4 + end + 3;
                        continue;
                    }
                    b'<' if bytes[i..].starts_with(b"<?") => {
                        let end = memmem::find(&bytes[i + 2..], b"?>")
                            .ok_or(XmlError::UnexpectedEof)?;
                        i += 2 + end + 2;
                        continue;
                    }
                    b'>' if depth == 0 => return Ok((name, cursor.advance(i + 1))),
                    _ => {}
                },
            }
            i += 1;
        }

        Err(XmlError::UnexpectedEof)
    }
}

// 2.9 Standalone Document Declaration

/// ```text
/// SDDecl ::= S 'standalone' Eq (("'" ('yes' | 'no') "'") | ('"' ('yes' | 'no') '"'))
/// ```
pub struct SDDeclToken;

impl<'a> Parser<'a> for SDDeclToken {
    type Attribute = bool;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = SToken.parse(cursor)?;
        let (_, cursor) = expect_token(cursor, "standalone")?;
        let (_, cursor) = EqToken.parse(cursor)?;
        let (yes_no, cursor) = quoted(
            cursor,
            map_error(raw(chars(|c: char| c.is_ascii_alphabetic())), |_| {
                XmlError::ExpectToken("'yes' | 'no'")
            }),
        )?;

        match yes_no {
            "yes" => Ok((true, cursor)),
            "no" => Ok((false, cursor)),
            _ => Err(XmlError::IllegalAttributeValue("Expected yes or no")),
        }
    }
}

// 4.1 Character and Entity References

/// Character Reference
///
/// `CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'`
pub struct CharRefToken;

impl<'a> Parser<'a> for CharRefToken {
    type Attribute = char;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("&#").parse(cursor)?;
        let (radix, cursor) = match cursor.next_byte(0) {
            Some(b'x') => (16, cursor.advance(1)),
            Some(_) => (10, cursor),
            None => return Err(XmlError::UnexpectedEof),
        };

        let digits = cursor
            .rest_bytes()
            .iter()
            .take_while(|c| c.is_ascii_digit() || (radix == 16 && c.is_ascii_hexdigit()))
            .count();
        let (code, cursor) = cursor.advance2(digits);
        match cursor.next_byte(0) {
            Some(_) if code.is_empty() => return Err(XmlError::IllegalReference),
            Some(b';') => {}
            Some(_) => return Err(XmlError::InvalidCharacterReference(code.to_string())),
            None => return Err(XmlError::UnexpectedEof),
        }

        u32::from_str_radix(code, radix)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| c.is_xml_char())
            .map(|c| (c, cursor.advance(1)))
            .ok_or_else(|| XmlError::InvalidCharacterReference(code.to_string()))
    }
}

/// Entity Reference
///
/// `EntityRef ::= '&' Name ';'`
pub struct EntityRefToken;

impl<'a> Parser<'a> for EntityRefToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = xml_lit("&").parse(cursor)?;
        let (name, cursor) = NameToken.parse(cursor).map_err(|err| match err {
            XmlError::IllegalNameStartChar(_) => XmlError::IllegalReference,
            err => err,
        })?;
        match cursor.next_byte(0) {
            Some(b';') => Ok((name, cursor.advance(1))),
            Some(_) => Err(XmlError::IllegalReference),
            None => Err(XmlError::UnexpectedEof),
        }
    }
}

/// Character or predefined entity reference, resolved
///
/// Documents are not processed against a DTD, so only the five predefined
/// entities exist.
pub struct ReferenceToken;

impl<'a> Parser<'a> for ReferenceToken {
    type Attribute = char;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        match cursor.next_byte(1) {
            Some(b'#') => CharRefToken.parse(cursor),
            Some(_) => {
                let (name, next) = EntityRefToken.parse(cursor)?;
                let c = match name {
                    "lt" => '<',
                    "gt" => '>',
                    "amp" => '&',
                    "apos" => '\'',
                    "quot" => '"',
                    _ => return Err(XmlError::UnknownEntity(name.to_string())),
                };
                Ok((c, next))
            }
            None => Err(XmlError::UnexpectedEof),
        }
    }
}

// 4.3.3 Character Encoding in Entities

/// ```text
/// EncodingDecl ::= S 'encoding' Eq ('"' EncName '"' | "'" EncName "'" )
/// ```
pub struct EncodingDeclToken;

impl<'a> Parser<'a> for EncodingDeclToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        let (_, cursor) = SToken.parse(cursor)?;
        let (_, cursor) = expect_token(cursor, "encoding")?;
        let (_, cursor) = EqToken.parse(cursor)?;
        quoted(cursor, EncNameToken)
    }
}

/// ```text
/// EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*
/// ```
pub struct EncNameToken;

impl<'a> Parser<'a> for EncNameToken {
    type Attribute = &'a str;
    type Error = XmlError;

    fn parse(&self, cursor: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), XmlError> {
        map_error(
            raw((
                char_(|c: char| c.is_ascii_alphabetic()),
                kleene(char_(|c: char| {
                    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
                })),
            )),
            |_| XmlError::ExpectToken("Encoding name: [a-zA-Z][a-zA-Z0-9._-]+"),
        )
        .parse(cursor)
    }
}
