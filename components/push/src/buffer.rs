use crate::encoding::EncodingManager;
use crate::{Position, XmlError};

/// Input not yet consumed by the engine
///
/// Bytes stay in `raw` until their encoding is known, afterwards they are
/// decoded straight into `text`.
#[derive(Default)]
pub(crate) struct Buffer {
    raw: Vec<u8>,
    text: String,
    position: Position,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_bytes(
        &mut self,
        bytes: &[u8],
        last: bool,
        encoding: &mut EncodingManager,
    ) -> Result<(), XmlError> {
        if encoding.is_resolved() {
            return encoding.decode(bytes, last, &mut self.text);
        }

        self.raw.extend_from_slice(bytes);
        if !encoding.resolve(&self.raw, last) {
            return Ok(());
        }
        let raw = std::mem::take(&mut self.raw);
        encoding.decode(&raw, last, &mut self.text)
    }

    /// Append text, ending any byte input that came before
    pub fn push_text(&mut self, text: &str, encoding: &mut EncodingManager) -> Result<(), XmlError> {
        if !self.raw.is_empty() {
            self.push_bytes(&[], true, encoding)?;
        }
        encoding.finish(&mut self.text)?;
        self.text.push_str(text);
        Ok(())
    }

    /// Drop the first `len` bytes of the text
    pub fn consume(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.position.advance_over(&self.text[..len]);
        self.text.drain(..len);
    }

    /// Absolute document position of byte `index` of the text
    pub fn position_at(&self, index: usize) -> Position {
        let mut position = self.position;
        let end = index.min(self.text.len());
        if let Some(text) = self.text.get(..end) {
            position.advance_over(text);
        }
        position
    }
}
