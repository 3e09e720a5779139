use std::borrow::Cow;

use memchr::{memchr, memchr2, memmem, memrchr};

use crate::chars::XmlChar;
use crate::cow::CowStrBuilder;
use crate::dispatch::{Dispatcher, XmlHandler};
use crate::encoding::EncodingManager;
use crate::parser::{Cursor, Parser};
use crate::push::ParserOptions;
use crate::tokens::{
    check_chars, has_next_lit, parse_xml_decl, skip_whitespace, AttValueToken, CDataToken,
    CommentToken, DocTypeToken, EqToken, NameToken, PIToken, ReferenceToken,
};
use crate::{Attributes, XmlError, XmlEvent};

/// Part of the document the engine is in
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DocumentState {
    /// Nothing consumed yet, an XML declaration may follow
    XmlDecl,
    /// Before the root element
    Prolog,
    /// Inside the root element
    Element,
    /// After the root element
    Epilog,
}

/// Failure with the byte offset of the construct that caused it
#[derive(Debug, PartialEq)]
pub(crate) struct EngineError {
    pub reason: XmlError,
    pub offset: usize,
}

/// Tokenizer and well-formedness checker
///
/// Works on the decoded residue of the buffer. Every call consumes the
/// longest prefix made of complete constructs and reports their events.
pub(crate) struct Engine {
    state: DocumentState,
    stack: Vec<String>,
    seen_doctype: bool,
    split_text: bool,
}

impl Engine {
    pub fn new(options: &ParserOptions) -> Self {
        Self {
            state: DocumentState::XmlDecl,
            stack: Vec::new(),
            seen_doctype: false,
            split_text: options.split_text,
        }
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Consume complete constructs of `text`, returns the consumed length
    pub fn run<H: XmlHandler>(
        &mut self,
        text: &str,
        is_final: bool,
        encoding: &mut EncodingManager,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<usize, EngineError> {
        let mut cursor = Cursor::new(text);
        loop {
            match self.step(cursor, is_final, encoding, dispatcher) {
                Ok(Some(next)) => cursor = next,
                Ok(None) => return Ok(cursor.offset()),
                Err(XmlError::UnexpectedEof) if !is_final => return Ok(cursor.offset()),
                Err(XmlError::UnexpectedEof) => {
                    return Err(EngineError {
                        reason: XmlError::UnclosedToken,
                        offset: cursor.offset(),
                    })
                }
                Err(reason) => {
                    return Err(EngineError {
                        reason,
                        offset: cursor.offset(),
                    })
                }
            }
        }
    }

    fn step<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        is_final: bool,
        encoding: &mut EncodingManager,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Option<Cursor<'a>>, XmlError> {
        if cursor.is_at_end() {
            if is_final {
                self.finish()?;
            }
            return Ok(None);
        }

        match self.state {
            DocumentState::XmlDecl => self.parse_document_start(cursor, encoding, dispatcher),
            DocumentState::Element => {
                if cursor.has_next_byte(b'<') {
                    self.parse_markup(cursor, dispatcher).map(Some)
                } else {
                    self.parse_text(cursor, is_final, dispatcher)
                }
            }
            DocumentState::Prolog | DocumentState::Epilog => self.parse_misc(cursor, dispatcher),
        }
    }

    fn finish(&self) -> Result<(), XmlError> {
        if let Some(name) = self.stack.last() {
            return Err(XmlError::OpenElementAtEof(name.clone()));
        }
        match self.state {
            DocumentState::Epilog => Ok(()),
            _ => Err(XmlError::NoRootElement),
        }
    }

    fn parse_document_start<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        encoding: &mut EncodingManager,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Option<Cursor<'a>>, XmlError> {
        let cursor = if cursor.has_next_str("\u{FEFF}") {
            cursor.advance('\u{FEFF}'.len_utf8())
        } else {
            cursor
        };
        if cursor.is_at_end() {
            return Ok(Some(cursor));
        }

        if has_next_lit(cursor, "<?xml")? {
            let c = cursor.next_byte(5).ok_or(XmlError::UnexpectedEof)?;
            if c.is_ascii() && (c as char).is_xml_whitespace() {
                let (decl, cursor) = parse_xml_decl(cursor)?;
                if let Some(label) = decl.encoding() {
                    encoding.observe_declaration(label)?;
                }
                self.state = DocumentState::Prolog;
                dispatcher.dispatch(XmlEvent::XmlDecl(decl));
                return Ok(Some(cursor));
            }
        }

        self.state = DocumentState::Prolog;
        Ok(Some(cursor))
    }

    fn parse_misc<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Option<Cursor<'a>>, XmlError> {
        let (skipped, cursor) = skip_whitespace(cursor);
        if skipped {
            return Ok(Some(cursor));
        }

        match cursor.next_char() {
            Some('<') => self.parse_markup(cursor, dispatcher).map(Some),
            Some(_) if self.state == DocumentState::Epilog => Err(XmlError::JunkAfterDocElement),
            Some(c) => Err(XmlError::UnexpectedCharacter(c)),
            None => Ok(None),
        }
    }

    /// Construct starting with `<`
    fn parse_markup<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Cursor<'a>, XmlError> {
        match cursor.next_byte(1) {
            Some(b'?') => {
                let ((target, data), cursor) = PIToken.parse(cursor)?;
                dispatcher.dispatch(XmlEvent::pi(target, normalize_newlines(data)));
                Ok(cursor)
            }
            Some(b'!') => self.parse_declaration(cursor, dispatcher),
            Some(b'/') => self.parse_etag(cursor, dispatcher),
            Some(_) => self.parse_stag(cursor, dispatcher),
            None => Err(XmlError::UnexpectedEof),
        }
    }

    /// Construct starting with `<!`
    fn parse_declaration<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Cursor<'a>, XmlError> {
        if has_next_lit(cursor, "<!--")? {
            let (comment, cursor) = CommentToken.parse(cursor)?;
            dispatcher.dispatch(XmlEvent::comment(normalize_newlines(comment)));
            Ok(cursor)
        } else if has_next_lit(cursor, "<![CDATA[")? {
            if self.state != DocumentState::Element {
                return Err(XmlError::ExpectedElementStart);
            }
            let (chars, cursor) = CDataToken.parse(cursor)?;
            if !chars.is_empty() {
                dispatcher.dispatch(XmlEvent::characters(normalize_newlines(chars)));
            }
            Ok(cursor)
        } else if has_next_lit(cursor, "<!DOCTYPE")? {
            if self.state != DocumentState::Prolog || self.seen_doctype {
                return Err(XmlError::MisplacedDocType);
            }
            let (_, cursor) = DocTypeToken.parse(cursor)?;
            self.seen_doctype = true;
            Ok(cursor)
        } else {
            Err(XmlError::ExpectedElementStart)
        }
    }

    fn parse_stag<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Cursor<'a>, XmlError> {
        if self.state == DocumentState::Epilog {
            return Err(XmlError::JunkAfterDocElement);
        }

        let (name, mut cursor) = NameToken.parse(cursor.advance(1))?;
        let mut attributes = Attributes::new();
        loop {
            let (got_whitespace, next) = skip_whitespace(cursor);
            cursor = next;

            match cursor.next_byte(0) {
                Some(b'>') => {
                    self.start_element(name, attributes, false, dispatcher);
                    return Ok(cursor.advance(1));
                }
                Some(b'/') => {
                    return match cursor.next_byte(1) {
                        Some(b'>') => {
                            self.start_element(name, attributes, true, dispatcher);
                            Ok(cursor.advance(2))
                        }
                        Some(_) => Err(XmlError::ExpectedElementEnd),
                        None => Err(XmlError::UnexpectedEof),
                    };
                }
                Some(_) if !got_whitespace => return Err(XmlError::ExpectedWhitespace),
                Some(_) => {
                    let (attr_name, next) = NameToken.parse(cursor)?;
                    let (_, next) = EqToken.parse(next)?;
                    let (value, next) = AttValueToken.parse(next)?;
                    attributes.insert(attr_name, value);
                    cursor = next;
                }
                None => return Err(XmlError::UnexpectedEof),
            }
        }
    }

    fn start_element<H: XmlHandler>(
        &mut self,
        name: &str,
        attributes: Attributes,
        empty: bool,
        dispatcher: &mut Dispatcher<H>,
    ) {
        dispatcher.dispatch(XmlEvent::stag(name, attributes));
        if empty {
            dispatcher.dispatch(XmlEvent::etag(name));
            if self.stack.is_empty() {
                self.state = DocumentState::Epilog;
            }
        } else {
            self.stack.push(name.to_string());
            self.state = DocumentState::Element;
        }
    }

    fn parse_etag<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Cursor<'a>, XmlError> {
        let (name, cursor) = NameToken.parse(cursor.advance(2))?;
        let (_, cursor) = skip_whitespace(cursor);
        match cursor.next_byte(0) {
            Some(b'>') => {}
            Some(_) => return Err(XmlError::ExpectedElementEnd),
            None => return Err(XmlError::UnexpectedEof),
        }

        match self.stack.last() {
            Some(expected_name) if expected_name == name => {}
            Some(expected_name) => {
                return Err(XmlError::WrongETagName {
                    expected_name: expected_name.clone(),
                    found: name.to_string(),
                })
            }
            None => return Err(XmlError::ETagWithoutStart(name.to_string())),
        }

        self.stack.pop();
        if self.stack.is_empty() {
            self.state = DocumentState::Epilog;
        }
        dispatcher.dispatch(XmlEvent::etag(name));
        Ok(cursor.advance(1))
    }

    /// Character data up to the next markup
    ///
    /// A run is reported once `<` terminates it. With `split_text` its
    /// complete prefix is reported at the end of each chunk as well.
    fn parse_text<'a, H: XmlHandler>(
        &mut self,
        cursor: Cursor<'a>,
        is_final: bool,
        dispatcher: &mut Dispatcher<H>,
    ) -> Result<Option<Cursor<'a>>, XmlError> {
        let rest = cursor.rest_bytes();
        let end = match memchr(b'<', rest) {
            Some(end) => end,
            None if is_final => rest.len(),
            None if self.split_text => flushable_len(rest),
            None => return Ok(None),
        };
        if end == 0 {
            return Ok(None);
        }

        let (chars, cursor) = cursor.advance2(end);
        dispatcher.dispatch(XmlEvent::Characters(normalize_text(chars)?));
        Ok(Some(cursor))
    }
}

/// Length of the part of an unterminated text run that cannot change
/// meaning with more input
fn flushable_len(text: &[u8]) -> usize {
    let mut end = text.len();
    if let Some(amp) = memrchr(b'&', text) {
        if memchr(b';', &text[amp..]).is_none() {
            end = amp;
        }
    }

    let text = &text[..end];
    if text.ends_with(b"\r") {
        return end - 1;
    }
    let brackets = text.iter().rev().take(2).take_while(|&&c| c == b']').count();
    end - brackets
}

/// Resolve references and normalize line ends of character data
fn normalize_text(raw: &str) -> Result<Cow<'_, str>, XmlError> {
    if memmem::find(raw.as_bytes(), b"]]>").is_some() {
        return Err(XmlError::IllegalCDataSectionEnd);
    }

    let mut builder = CowStrBuilder::default();
    let mut cursor = Cursor::new(raw);
    loop {
        let end = memchr2(b'&', b'\r', cursor.rest_bytes()).unwrap_or(cursor.rest().len());
        let (chars, next) = cursor.advance2(end);
        check_chars(chars)?;
        builder.push_borrow_str(chars);
        cursor = next;

        match cursor.next_byte(0) {
            Some(b'&') => {
                let (c, next) = ReferenceToken.parse(cursor).map_err(|err| match err {
                    XmlError::UnexpectedEof => XmlError::IllegalReference,
                    err => err,
                })?;
                builder.push_char(c);
                cursor = next;
            }
            Some(_) => {
                builder.push_borrow_str("\n");
                let len = if cursor.next_byte(1) == Some(b'\n') { 2 } else { 1 };
                cursor = cursor.advance(len);
            }
            None => return Ok(builder.build()),
        }
    }
}

/// `\r\n` and single `\r` become `\n`
fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if memchr(b'\r', raw.as_bytes()).is_none() {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
}
