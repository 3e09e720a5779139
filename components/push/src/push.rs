use log::{debug, trace};

use crate::buffer::Buffer;
use crate::dispatch::{Dispatcher, XmlHandler};
use crate::encoding::{resolve_label, EncodingManager, EncodingOrigin};
use crate::engine::Engine;
use crate::{ErrorInfo, InvalidArgument, Position, XmlError};

/// Chunk of a document
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input<'i> {
    /// Already decoded text, bypasses the encoding
    Text(&'i str),
    /// Raw bytes in the active encoding
    Bytes(&'i [u8]),
}

impl<'i> Input<'i> {
    pub fn len(&self) -> usize {
        match self {
            Input::Text(text) => text.len(),
            Input::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'i> From<&'i str> for Input<'i> {
    fn from(text: &'i str) -> Self {
        Input::Text(text)
    }
}

impl<'i> From<&'i String> for Input<'i> {
    fn from(text: &'i String) -> Self {
        Input::Text(text)
    }
}

impl<'i> From<&'i [u8]> for Input<'i> {
    fn from(bytes: &'i [u8]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'i> From<&'i Vec<u8>> for Input<'i> {
    fn from(bytes: &'i Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'i, const N: usize> From<&'i [u8; N]> for Input<'i> {
    fn from(bytes: &'i [u8; N]) -> Self {
        Input::Bytes(bytes)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParserState {
    Ready,
    /// Terminal, see [`PushParser::error`]
    Failed,
}

/// Configuration of a [`PushParser`]
#[derive(Clone, Debug, Default)]
pub struct ParserOptions {
    pub(crate) encoding: Option<String>,
    pub(crate) split_text: bool,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoding of byte input, used when the document does not name one
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Report the complete part of a text run at the end of every chunk
    ///
    /// One text node may then arrive as several consecutive events, which
    /// depend on the chunking of the input.
    pub fn split_text(mut self, split_text: bool) -> Self {
        self.split_text = split_text;
        self
    }
}

/// Incremental XML parser
///
/// Feed the document in chunks of any size with [`parse`](Self::parse); the
/// events of all complete constructs are delivered to the handler before
/// each call returns. After the first error the parser stays failed.
pub struct PushParser<H> {
    buffer: Buffer,
    encoding: EncodingManager,
    engine: Engine,
    dispatcher: Dispatcher<H>,
    error: Option<ErrorInfo>,
    started: bool,
    finished: bool,
}

impl<H: XmlHandler> PushParser<H> {
    pub fn new(handler: H) -> Self {
        Self::with_options(ParserOptions::default(), handler)
    }

    /// Parser for byte input in the encoding `label`
    ///
    /// An unknown label leaves the parser failed with an encoding error.
    pub fn with_encoding(label: &str, handler: H) -> Self {
        Self::with_options(ParserOptions::default().encoding(label), handler)
    }

    pub fn with_options(options: ParserOptions, handler: H) -> Self {
        let mut error = None;
        let initial = match options.encoding.as_deref() {
            Some(label) => {
                let encoding = resolve_label(label);
                if encoding.is_none() {
                    let info = ErrorInfo::new(
                        XmlError::UnsupportedEncoding(label.to_string()),
                        Position::default(),
                    );
                    debug!("parser failed: {}", info);
                    error = Some(info);
                }
                encoding
            }
            None => None,
        };

        Self {
            buffer: Buffer::new(),
            encoding: EncodingManager::new(initial),
            engine: Engine::new(&options),
            dispatcher: Dispatcher::new(handler),
            error,
            started: false,
            finished: false,
        }
    }

    /// Parse the next chunk, `is_final` marks the end of the document
    ///
    /// Returns `false` if the parser failed, now or before.
    pub fn parse<'i>(&mut self, input: impl Into<Input<'i>>, is_final: bool) -> bool {
        if self.error.is_some() {
            return false;
        }

        let input = input.into();
        if self.finished {
            if input.is_empty() {
                return true;
            }
            let position = self.buffer.position_at(0);
            self.fail(XmlError::ParsingFinished, position);
            return false;
        }

        self.started = true;
        trace!(
            "parsing {} bytes (final: {}), {} events so far",
            input.len(),
            is_final,
            self.dispatcher.events()
        );

        let fed = match input {
            Input::Text(text) => self.buffer.push_text(text, &mut self.encoding),
            Input::Bytes(bytes) => self.buffer.push_bytes(bytes, is_final, &mut self.encoding),
        };

        // constructs decoded before an encoding error are still reported
        let result = self.engine.run(
            self.buffer.text(),
            is_final && fed.is_ok(),
            &mut self.encoding,
            &mut self.dispatcher,
        );
        match result {
            Ok(consumed) => self.buffer.consume(consumed),
            Err(err) => {
                let position = self.buffer.position_at(err.offset);
                self.fail(err.reason, position);
                return false;
            }
        }

        if let Err(reason) = fed {
            let position = self.buffer.position_at(self.buffer.text().len());
            self.fail(reason, position);
            return false;
        }

        self.finished = is_final;
        true
    }

    /// Override the encoding of byte input
    ///
    /// Only possible before the first chunk is parsed and while the parser
    /// has not failed. Returns `Ok(false)` for an unknown label, which leaves
    /// the encoding unchanged.
    pub fn set_encoding(&mut self, label: &str) -> Result<bool, InvalidArgument> {
        if self.started {
            return Err(InvalidArgument::new(
                "encoding cannot be changed after parsing started",
            ));
        }
        if self.error.is_some() {
            return Err(InvalidArgument::new(
                "encoding cannot be changed after the parser failed",
            ));
        }
        Ok(self.encoding.set_override(label))
    }

    fn fail(&mut self, reason: XmlError, position: Position) {
        let info = ErrorInfo::new(reason, position);
        debug!("parser failed: {}", info);
        self.error = Some(info);
    }

    /// Recorded failure, `None` while the parser is ready
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn state(&self) -> ParserState {
        match self.error {
            Some(_) => ParserState::Failed,
            None => ParserState::Ready,
        }
    }

    /// Name of the active encoding and where it came from
    pub fn encoding(&self) -> (&'static str, EncodingOrigin) {
        let (encoding, origin) = self.encoding.current();
        (encoding.name(), origin)
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.engine.depth()
    }

    /// Whether the final chunk was parsed successfully
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn handler(&self) -> &H {
        self.dispatcher.handler()
    }

    pub fn handler_mut(&mut self) -> &mut H {
        self.dispatcher.handler_mut()
    }

    pub fn into_handler(self) -> H {
        self.dispatcher.into_handler()
    }
}
