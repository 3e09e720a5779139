use crate::{Attributes, XmlDecl, XmlEvent};

/// Receiver of parser events
///
/// All methods default to doing nothing, so a handler only implements the
/// events it is interested in.
pub trait XmlHandler {
    fn start_element(&mut self, _name: &str, _attributes: &Attributes) {}

    fn end_element(&mut self, _name: &str) {}

    fn text(&mut self, _text: &str) {}

    fn processing_instruction(&mut self, _target: &str, _data: &str) {}

    fn comment(&mut self, _comment: &str) {}

    fn xml_decl(&mut self, _decl: &XmlDecl) {}
}

/// Collects owned events
impl XmlHandler for Vec<XmlEvent<'static>> {
    fn start_element(&mut self, name: &str, attributes: &Attributes) {
        self.push(XmlEvent::stag(name.to_string(), attributes.clone()));
    }

    fn end_element(&mut self, name: &str) {
        self.push(XmlEvent::etag(name.to_string()));
    }

    fn text(&mut self, text: &str) {
        self.push(XmlEvent::characters(text.to_string()));
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.push(XmlEvent::pi(target.to_string(), data.to_string()));
    }

    fn comment(&mut self, comment: &str) {
        self.push(XmlEvent::comment(comment.to_string()));
    }

    fn xml_decl(&mut self, decl: &XmlDecl) {
        self.push(XmlEvent::XmlDecl(decl.clone()));
    }
}

impl<H: XmlHandler + ?Sized> XmlHandler for &mut H {
    fn start_element(&mut self, name: &str, attributes: &Attributes) {
        (**self).start_element(name, attributes)
    }

    fn end_element(&mut self, name: &str) {
        (**self).end_element(name)
    }

    fn text(&mut self, text: &str) {
        (**self).text(text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        (**self).processing_instruction(target, data)
    }

    fn comment(&mut self, comment: &str) {
        (**self).comment(comment)
    }

    fn xml_decl(&mut self, decl: &XmlDecl) {
        (**self).xml_decl(decl)
    }
}

/// Handler built from closures, one optional slot per event kind
///
/// ```
/// use xrs_push::{Callbacks, PushParser};
///
/// let mut names = Vec::new();
/// let callbacks = Callbacks::new().on_start_element(|name, _| names.push(name.to_string()));
/// let mut parser = PushParser::new(callbacks);
/// assert!(parser.parse("<a><b/></a>", true));
/// drop(parser);
/// assert_eq!(vec!["a", "b"], names);
/// ```
#[derive(Default)]
pub struct Callbacks<'h> {
    start_element: Option<Box<dyn FnMut(&str, &Attributes) + 'h>>,
    end_element: Option<Box<dyn FnMut(&str) + 'h>>,
    text: Option<Box<dyn FnMut(&str) + 'h>>,
    processing_instruction: Option<Box<dyn FnMut(&str, &str) + 'h>>,
    comment: Option<Box<dyn FnMut(&str) + 'h>>,
    xml_decl: Option<Box<dyn FnMut(&XmlDecl) + 'h>>,
}

impl<'h> Callbacks<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start_element(mut self, f: impl FnMut(&str, &Attributes) + 'h) -> Self {
        self.start_element = Some(Box::new(f));
        self
    }

    pub fn on_end_element(mut self, f: impl FnMut(&str) + 'h) -> Self {
        self.end_element = Some(Box::new(f));
        self
    }

    pub fn on_text(mut self, f: impl FnMut(&str) + 'h) -> Self {
        self.text = Some(Box::new(f));
        self
    }

    pub fn on_processing_instruction(mut self, f: impl FnMut(&str, &str) + 'h) -> Self {
        self.processing_instruction = Some(Box::new(f));
        self
    }

    pub fn on_comment(mut self, f: impl FnMut(&str) + 'h) -> Self {
        self.comment = Some(Box::new(f));
        self
    }

    pub fn on_xml_decl(mut self, f: impl FnMut(&XmlDecl) + 'h) -> Self {
        self.xml_decl = Some(Box::new(f));
        self
    }
}

impl<'h> XmlHandler for Callbacks<'h> {
    fn start_element(&mut self, name: &str, attributes: &Attributes) {
        if let Some(f) = &mut self.start_element {
            f(name, attributes)
        }
    }

    fn end_element(&mut self, name: &str) {
        if let Some(f) = &mut self.end_element {
            f(name)
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(f) = &mut self.text {
            f(text)
        }
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        if let Some(f) = &mut self.processing_instruction {
            f(target, data)
        }
    }

    fn comment(&mut self, comment: &str) {
        if let Some(f) = &mut self.comment {
            f(comment)
        }
    }

    fn xml_decl(&mut self, decl: &XmlDecl) {
        if let Some(f) = &mut self.xml_decl {
            f(decl)
        }
    }
}

/// Delivers events to the handler in the order they are recognized
pub(crate) struct Dispatcher<H> {
    handler: H,
    events: u64,
}

impl<H: XmlHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler, events: 0 }
    }

    pub fn dispatch(&mut self, event: XmlEvent) {
        self.events += 1;
        match event {
            XmlEvent::XmlDecl(decl) => self.handler.xml_decl(&decl),
            XmlEvent::StartElement { name, attributes } => {
                self.handler.start_element(&name, &attributes)
            }
            XmlEvent::EndElement(name) => self.handler.end_element(&name),
            XmlEvent::Characters(text) => self.handler.text(&text),
            XmlEvent::PI { target, data } => self.handler.processing_instruction(&target, &data),
            XmlEvent::Comment(comment) => self.handler.comment(&comment),
        }
    }

    /// Number of events delivered so far
    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Depth {
        current: usize,
        max: usize,
    }

    impl XmlHandler for Depth {
        fn start_element(&mut self, _name: &str, _attributes: &Attributes) {
            self.current += 1;
            self.max = self.max.max(self.current);
        }

        fn end_element(&mut self, _name: &str) {
            self.current -= 1;
        }
    }

    #[test]
    fn partial_handler() {
        let mut dispatcher = Dispatcher::new(Depth::default());
        dispatcher.dispatch(XmlEvent::stag("a", Attributes::new()));
        dispatcher.dispatch(XmlEvent::characters("x"));
        dispatcher.dispatch(XmlEvent::stag("b", Attributes::new()));
        dispatcher.dispatch(XmlEvent::etag("b"));
        dispatcher.dispatch(XmlEvent::etag("a"));
        assert_eq!(5, dispatcher.events());
        assert_eq!(2, dispatcher.handler().max);
        assert_eq!(0, dispatcher.handler().current);
    }

    #[test]
    fn collects_events() {
        let mut events: Vec<XmlEvent<'static>> = Vec::new();
        let mut dispatcher = Dispatcher::new(&mut events);
        dispatcher.dispatch(XmlEvent::comment("c"));
        dispatcher.dispatch(XmlEvent::pi("t", ""));
        drop(dispatcher);
        assert_eq!(vec![XmlEvent::comment("c"), XmlEvent::pi("t", "")], events);
    }

    #[test]
    fn callbacks() {
        let mut texts = Vec::new();
        let mut ends = 0;
        {
            let mut callbacks = Callbacks::new()
                .on_text(|text| texts.push(text.to_string()))
                .on_end_element(|_| ends += 1);
            callbacks.text("a");
            callbacks.comment("ignored");
            callbacks.end_element("x");
        }
        assert_eq!(vec!["a"], texts);
        assert_eq!(1, ends);
    }
}
