use encoding_rs::{Decoder, DecoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use log::debug;
use memchr::memmem;

use crate::parser::Cursor;
use crate::tokens::parse_xml_decl;
use crate::XmlError;

/// Where the active encoding came from
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncodingOrigin {
    /// Nothing chosen, UTF-8
    Default,
    /// Given when the parser was created
    Declared,
    /// Set with [`PushParser::set_encoding`](crate::PushParser::set_encoding)
    Overridden,
    /// Byte order mark or XML declaration of the document
    Detected,
}

/// Byte patterns that identify an encoding at the document start
///
/// The first three are byte order marks, the others `<?` in UTF-16.
fn signatures() -> [(&'static [u8], &'static Encoding); 5] {
    [
        (b"\xEF\xBB\xBF", UTF_8),
        (b"\xFF\xFE", UTF_16LE),
        (b"\xFE\xFF", UTF_16BE),
        (b"<\x00?\x00", UTF_16LE),
        (b"\x00<\x00?", UTF_16BE),
    ]
}

/// Resolve a label with the WHATWG label table
pub fn resolve_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label_no_replacement(label.trim().as_bytes())
}

/// Encoding named in the XML declaration at the start of `decl`
fn declared_encoding(decl: &[u8]) -> Option<&'static Encoding> {
    let decl = std::str::from_utf8(decl).ok()?;
    let (decl, _) = parse_xml_decl(Cursor::new(decl)).ok()?;
    // a document that got here as bytes of an ASCII-compatible encoding
    // cannot actually be UTF-16
    resolve_label(decl.encoding()?).map(Encoding::output_encoding)
}

/// Resolves the active encoding and decodes raw bytes
pub(crate) struct EncodingManager {
    initial: Option<&'static Encoding>,
    overridden: Option<&'static Encoding>,
    declared: Option<&'static Encoding>,
    active: Option<(&'static Encoding, EncodingOrigin)>,
    decoder: Option<Decoder>,
}

impl EncodingManager {
    pub fn new(initial: Option<&'static Encoding>) -> Self {
        Self {
            initial,
            overridden: None,
            declared: None,
            active: None,
            decoder: None,
        }
    }

    /// Force `label` for all input, returns `false` if it is unknown
    pub fn set_override(&mut self, label: &str) -> bool {
        match resolve_label(label) {
            Some(encoding) => {
                debug!("encoding overridden with {}", encoding.name());
                self.overridden = Some(encoding);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.active.is_some()
    }

    /// Encoding in use, or the one that would be used for the next bytes
    pub fn current(&self) -> (&'static Encoding, EncodingOrigin) {
        self.active
            .or_else(|| self.overridden.map(|enc| (enc, EncodingOrigin::Overridden)))
            .or_else(|| self.declared.map(|enc| (enc, EncodingOrigin::Detected)))
            .or_else(|| self.initial.map(|enc| (enc, EncodingOrigin::Declared)))
            .unwrap_or((UTF_8, EncodingOrigin::Default))
    }

    /// Try to choose the encoding from the document start in `raw`
    ///
    /// Returns `false` while `raw` is too short to decide and more bytes
    /// can follow.
    pub fn resolve(&mut self, raw: &[u8], last: bool) -> bool {
        let resolved = match self.sniff(raw, last) {
            Some(resolved) => resolved,
            None => return false,
        };

        let (encoding, origin) = resolved;
        debug!("resolved encoding {} ({:?})", encoding.name(), origin);
        self.decoder = Some(match origin {
            EncodingOrigin::Overridden => encoding.new_decoder_with_bom_removal(),
            _ => encoding.new_decoder(),
        });
        self.active = Some(resolved);
        true
    }

    fn sniff(&self, raw: &[u8], last: bool) -> Option<(&'static Encoding, EncodingOrigin)> {
        if let Some(encoding) = self.overridden {
            return Some((encoding, EncodingOrigin::Overridden));
        }

        for (signature, encoding) in signatures() {
            if raw.starts_with(signature) {
                return Some((encoding, EncodingOrigin::Detected));
            }
            if !last && signature.starts_with(raw) {
                return None;
            }
        }

        if raw.starts_with(b"<?xml") {
            match memmem::find(raw, b"?>") {
                Some(end) => {
                    if let Some(encoding) = declared_encoding(&raw[..end + 2]) {
                        return Some((encoding, EncodingOrigin::Detected));
                    }
                }
                None if !last => return None,
                None => {}
            }
        } else if !last && b"<?xml".starts_with(raw) {
            return None;
        }

        Some(self.current())
    }

    /// Check the encoding label of an XML declaration seen in the text
    ///
    /// Without an explicit override an unknown label is fatal, a known one
    /// applies to bytes supplied before the encoding is resolved.
    pub fn observe_declaration(&mut self, label: &str) -> Result<(), XmlError> {
        if self.overridden.is_some() {
            return Ok(());
        }

        let encoding =
            resolve_label(label).ok_or_else(|| XmlError::UnsupportedEncoding(label.to_string()))?;
        if self.active.is_none() {
            self.declared = Some(encoding.output_encoding());
        }
        Ok(())
    }

    /// Decode `bytes` into `out`
    ///
    /// On malformed input everything before the bad sequence is still
    /// appended to `out`.
    pub fn decode(&mut self, bytes: &[u8], last: bool, out: &mut String) -> Result<(), XmlError> {
        if self.decoder.is_none() {
            match self.active {
                Some((encoding, _)) => {
                    self.decoder = Some(encoding.new_decoder_without_bom_handling())
                }
                None => return Ok(()),
            }
        }

        let result = match self.decoder.as_mut() {
            Some(decoder) => decode_into(decoder, bytes, last, out),
            None => Ok(()),
        };
        if last {
            self.decoder = None;
        }
        result
    }

    /// Terminate the byte stream before text input
    ///
    /// Fails if a multi-byte sequence is incomplete.
    pub fn finish(&mut self, out: &mut String) -> Result<(), XmlError> {
        match self.decoder.take() {
            Some(mut decoder) => decode_into(&mut decoder, &[], true, out),
            None => Ok(()),
        }
    }
}

fn decode_into(
    decoder: &mut Decoder,
    mut bytes: &[u8],
    last: bool,
    out: &mut String,
) -> Result<(), XmlError> {
    loop {
        let needed = decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len());
        out.reserve(needed);

        let (result, read) = decoder.decode_to_string_without_replacement(bytes, out, last);
        bytes = &bytes[read..];
        match result {
            DecoderResult::InputEmpty => return Ok(()),
            DecoderResult::OutputFull => continue,
            DecoderResult::Malformed(_, _) => {
                return Err(XmlError::Decoding(decoder.encoding().name()))
            }
        }
    }
}
