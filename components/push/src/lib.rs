//! Incremental push parser for XML
//!
//! Input is fed in arbitrary chunks of text or bytes via [`PushParser::parse`].
//! Complete constructs are reported to an [`XmlHandler`] as soon as they are
//! recognized, incomplete ones are kept until the next chunk arrives.
//!
//! ```
//! use xrs_push::{PushParser, XmlEvent};
//!
//! let mut parser = PushParser::new(Vec::new());
//! assert!(parser.parse("<greeting lang='en'>Hel", false));
//! assert!(parser.parse(&b"lo</greeting>"[..], true));
//!
//! let events = parser.into_handler();
//! assert_eq!(events[1], XmlEvent::characters("Hello"));
//! ```

use std::borrow::Cow;
use std::fmt;

pub use dispatch::{Callbacks, XmlHandler};
pub use encoding::EncodingOrigin;
pub use error::{ErrorCode, ErrorInfo, InvalidArgument, Position, XmlError};
pub use push::{Input, ParserOptions, ParserState, PushParser};

mod buffer;
pub mod chars;
mod cow;
mod dispatch;
mod encoding;
mod engine;
mod error;
pub mod parser;
mod push;
mod tokens;

/// XML Declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDecl {
    version: Option<String>,
    encoding: Option<String>,
    standalone: Option<bool>,
}

impl XmlDecl {
    pub fn new(version: Option<&str>, encoding: Option<&str>, standalone: Option<bool>) -> Self {
        Self {
            version: version.map(str::to_string),
            encoding: encoding.map(str::to_string),
            standalone,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// `Some(true)` for `standalone="yes"`, `None` if not specified
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone == Some(true)
    }
}

/// Attribute
#[derive(Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value with references resolved and whitespace normalized
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// Attributes of a start tag in document order
///
/// Inserting a name again replaces the value but keeps the position of the
/// first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the replaced value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value)),
            None => {
                self.0.push(Attribute { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// Event of the push parser
#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent<'a> {
    XmlDecl(XmlDecl),
    StartElement {
        name: Cow<'a, str>,
        attributes: Attributes,
    },
    EndElement(Cow<'a, str>),
    Characters(Cow<'a, str>),
    PI {
        target: Cow<'a, str>,
        data: Cow<'a, str>,
    },
    Comment(Cow<'a, str>),
}

impl<'a> XmlEvent<'a> {
    pub fn decl(version: &'a str, encoding: Option<&'a str>, standalone: Option<bool>) -> Self {
        XmlEvent::XmlDecl(XmlDecl::new(Some(version), encoding, standalone))
    }

    pub fn stag(name: impl Into<Cow<'a, str>>, attributes: Attributes) -> Self {
        XmlEvent::StartElement {
            name: name.into(),
            attributes,
        }
    }

    pub fn etag(name: impl Into<Cow<'a, str>>) -> Self {
        XmlEvent::EndElement(name.into())
    }

    pub fn characters(chars: impl Into<Cow<'a, str>>) -> Self {
        XmlEvent::Characters(chars.into())
    }

    pub fn comment(comment: impl Into<Cow<'a, str>>) -> Self {
        XmlEvent::Comment(comment.into())
    }

    pub fn pi(target: impl Into<Cow<'a, str>>, data: impl Into<Cow<'a, str>>) -> Self {
        XmlEvent::PI {
            target: target.into(),
            data: data.into(),
        }
    }

    pub fn into_owned(self) -> XmlEvent<'static> {
        match self {
            XmlEvent::XmlDecl(decl) => XmlEvent::XmlDecl(decl),
            XmlEvent::StartElement { name, attributes } => XmlEvent::StartElement {
                name: Cow::Owned(name.into_owned()),
                attributes,
            },
            XmlEvent::EndElement(name) => XmlEvent::EndElement(Cow::Owned(name.into_owned())),
            XmlEvent::Characters(chars) => XmlEvent::Characters(Cow::Owned(chars.into_owned())),
            XmlEvent::PI { target, data } => XmlEvent::PI {
                target: Cow::Owned(target.into_owned()),
                data: Cow::Owned(data.into_owned()),
            },
            XmlEvent::Comment(comment) => XmlEvent::Comment(Cow::Owned(comment.into_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_attribute_keeps_position() {
        let mut attrs = Attributes::new();
        assert_eq!(None, attrs.insert("a", "1"));
        assert_eq!(None, attrs.insert("b", "x"));
        assert_eq!(Some("1".to_string()), attrs.insert("a", "2"));

        assert_eq!(Some("2"), attrs.get("a"));
        assert_eq!(
            vec![("a", "2"), ("b", "x")],
            attrs
                .iter()
                .map(|attr| (attr.name(), attr.value()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn owned_event() {
        let text = String::from("abc");
        let evt = XmlEvent::characters(text.as_str()).into_owned();
        drop(text);
        assert_eq!(XmlEvent::characters("abc"), evt);
    }
}
