use xrs_push::{
    Attributes, EncodingOrigin, ErrorCode, ErrorInfo, Input, ParserOptions, PushParser, XmlEvent,
};

const DOCUMENT: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n",
    "<!DOCTYPE feed [\r\n  <!ENTITY ignored \"x\">\r\n]>\r\n",
    "<!-- generated -->\r\n",
    "<feed xmlns=\"http://www.w3.org/2005/Atom\" xml:lang='de'>\r\n",
    "  <title type=\"text\">Grüße &amp; Küsse</title>\r\n",
    "  <?render mode=\"fast\"?>\r\n",
    "  <entry id=\"1\" note=\"a&#x9;b&lt;c\"><![CDATA[<raw> & ]] stuff]]></entry>\r\n",
    "  <empty/>\r\n",
    "  <text>€ 100 &#8364; 🎉</text>\r\n",
    "</feed>\r\n",
    "<!-- trailer -->",
);

type Events = Vec<XmlEvent<'static>>;

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs.iter().copied().collect()
}

fn document_events() -> Events {
    vec![
        XmlEvent::decl("1.0", Some("UTF-8"), None),
        XmlEvent::comment(" generated "),
        XmlEvent::stag(
            "feed",
            attrs(&[("xmlns", "http://www.w3.org/2005/Atom"), ("xml:lang", "de")]),
        ),
        XmlEvent::characters("\n  "),
        XmlEvent::stag("title", attrs(&[("type", "text")])),
        XmlEvent::characters("Grüße & Küsse"),
        XmlEvent::etag("title"),
        XmlEvent::characters("\n  "),
        XmlEvent::pi("render", "mode=\"fast\""),
        XmlEvent::characters("\n  "),
        XmlEvent::stag("entry", attrs(&[("id", "1"), ("note", "a\tb<c")])),
        XmlEvent::characters("<raw> & ]] stuff"),
        XmlEvent::etag("entry"),
        XmlEvent::characters("\n  "),
        XmlEvent::stag("empty", Attributes::new()),
        XmlEvent::etag("empty"),
        XmlEvent::characters("\n  "),
        XmlEvent::stag("text", Attributes::new()),
        XmlEvent::characters("€ 100 € 🎉"),
        XmlEvent::etag("text"),
        XmlEvent::characters("\n"),
        XmlEvent::etag("feed"),
        XmlEvent::comment(" trailer "),
    ]
}

/// Feed `chunks`, the last one as final
fn parse_chunks(options: ParserOptions, chunks: &[Input]) -> (PushParser<Events>, bool) {
    let mut parser = PushParser::with_options(options, Vec::new());
    let mut ok = true;
    for (i, chunk) in chunks.iter().enumerate() {
        ok = parser.parse(*chunk, i + 1 == chunks.len());
    }
    (parser, ok)
}

fn parse_text_split(input: &str, at: usize) -> (PushParser<Events>, bool) {
    let (first, second) = input.split_at(at);
    parse_chunks(
        ParserOptions::default(),
        &[Input::Text(first), Input::Text(second)],
    )
}

fn parse_bytes_split(input: &[u8], at: usize) -> (PushParser<Events>, bool) {
    let (first, second) = input.split_at(at);
    parse_chunks(
        ParserOptions::default(),
        &[Input::Bytes(first), Input::Bytes(second)],
    )
}

fn char_boundaries(input: &str) -> impl Iterator<Item = usize> + '_ {
    (0..=input.len()).filter(move |&i| input.is_char_boundary(i))
}

fn merge_text(events: Events) -> Events {
    let mut merged: Events = Vec::with_capacity(events.len());
    for evt in events {
        if let XmlEvent::Characters(text) = &evt {
            if let Some(XmlEvent::Characters(last)) = merged.last_mut() {
                last.to_mut().push_str(text);
                continue;
            }
        }
        merged.push(evt);
    }
    merged
}

fn error_summary(error: Option<&ErrorInfo>) -> Option<(ErrorCode, usize, usize)> {
    error.map(|err| (err.code(), err.line(), err.column()))
}

#[test]
fn whole_document() {
    let (parser, ok) = parse_chunks(ParserOptions::default(), &[Input::Text(DOCUMENT)]);
    assert!(ok, "{:?}", parser.error());
    assert_eq!(document_events(), parser.into_handler());
}

#[test]
fn text_split_at_every_position() {
    for at in char_boundaries(DOCUMENT) {
        let (parser, ok) = parse_text_split(DOCUMENT, at);
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(document_events(), parser.into_handler(), "split at {}", at);
    }
}

#[test]
fn bytes_split_at_every_position() {
    let input = DOCUMENT.as_bytes();
    for at in 0..=input.len() {
        let (parser, ok) = parse_bytes_split(input, at);
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(document_events(), parser.into_handler(), "split at {}", at);
    }
}

#[test]
fn byte_at_a_time() {
    let mut parser = PushParser::new(Vec::new());
    for byte in DOCUMENT.as_bytes() {
        assert!(parser.parse(std::slice::from_ref(byte), false));
    }
    assert!(parser.parse(&b""[..], true));
    assert_eq!(document_events(), parser.into_handler());
}

#[test]
fn three_chunks() {
    let boundaries: Vec<usize> = char_boundaries(DOCUMENT).step_by(7).collect();
    for (n, &i) in boundaries.iter().enumerate() {
        for &j in &boundaries[n..] {
            let chunks = [
                Input::Text(&DOCUMENT[..i]),
                Input::Text(&DOCUMENT[i..j]),
                Input::Text(&DOCUMENT[j..]),
            ];
            let (parser, ok) = parse_chunks(ParserOptions::default(), &chunks);
            assert!(ok, "split at {}, {}", i, j);
            assert_eq!(document_events(), parser.into_handler(), "split at {}, {}", i, j);
        }
    }
}

#[test]
fn mixed_text_and_bytes() {
    for at in char_boundaries(DOCUMENT) {
        let chunks = [
            Input::Bytes(DOCUMENT[..at].as_bytes()),
            Input::Text(&DOCUMENT[at..]),
        ];
        let (parser, ok) = parse_chunks(ParserOptions::default(), &chunks);
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(document_events(), parser.into_handler(), "split at {}", at);
    }
}

#[test]
fn split_text_option_merges_to_same_events() {
    for at in char_boundaries(DOCUMENT) {
        let (first, second) = DOCUMENT.split_at(at);
        let (parser, ok) = parse_chunks(
            ParserOptions::default().split_text(true),
            &[Input::Text(first), Input::Text(second)],
        );
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(
            merge_text(document_events()),
            merge_text(parser.into_handler()),
            "split at {}",
            at
        );
    }
}

#[test]
fn split_text_option_reports_early() {
    let mut parser = PushParser::with_options(ParserOptions::new().split_text(true), Vec::new());
    assert!(parser.parse("<a>first &amp; sec", false));
    assert_eq!(
        vec![
            XmlEvent::stag("a", Attributes::new()),
            XmlEvent::characters("first & sec"),
        ],
        *parser.handler()
    );
    assert!(parser.parse("ond</a>", true));
    assert_eq!(XmlEvent::characters("ond"), parser.handler()[2]);
}

#[test]
fn declared_single_byte_encoding() {
    let input: &[u8] = b"<?xml version='1.0' encoding='ISO-8859-1'?><r a='\xE9'>caf\xE9 \xA4</r>";
    let expected = vec![
        XmlEvent::decl("1.0", Some("ISO-8859-1"), None),
        XmlEvent::stag("r", attrs(&[("a", "é")])),
        XmlEvent::characters("café ¤"),
        XmlEvent::etag("r"),
    ];
    for at in 0..=input.len() {
        let (parser, ok) = parse_bytes_split(input, at);
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(("windows-1252", EncodingOrigin::Detected), parser.encoding());
        assert_eq!(expected, parser.into_handler(), "split at {}", at);
    }
}

#[test]
fn utf16_with_byte_order_mark() {
    let text = "<?xml version='1.0' encoding='UTF-16'?><r>ä€𝄞</r>";
    let mut input = vec![0xFF, 0xFE];
    input.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));

    let expected = vec![
        XmlEvent::decl("1.0", Some("UTF-16"), None),
        XmlEvent::stag("r", Attributes::new()),
        XmlEvent::characters("ä€𝄞"),
        XmlEvent::etag("r"),
    ];
    for at in 0..=input.len() {
        let (parser, ok) = parse_bytes_split(&input, at);
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(("UTF-16LE", EncodingOrigin::Detected), parser.encoding());
        assert_eq!(expected, parser.into_handler(), "split at {}", at);
    }
}

#[test]
fn utf16_big_endian_without_byte_order_mark() {
    let text = "<?xml version='1.0'?><r/>";
    let input: Vec<u8> = text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect();
    let (parser, ok) = parse_bytes_split(&input, 1);
    assert!(ok, "{:?}", parser.error());
    assert_eq!("UTF-16BE", parser.encoding().0);
    assert_eq!(3, parser.into_handler().len());
}

#[test]
fn constructor_encoding() {
    let mut parser = PushParser::with_encoding("latin1", Vec::new());
    assert_eq!(("windows-1252", EncodingOrigin::Declared), parser.encoding());
    assert!(parser.parse(&b"<r>\xFC</r>"[..], true));
    assert_eq!(XmlEvent::characters("ü"), parser.handler()[1]);
}

#[test]
fn document_encoding_beats_constructor_encoding() {
    let input: &[u8] = b"<?xml version='1.0' encoding='UTF-8'?><a>\xC3\xA4</a>";
    for at in 0..=input.len() {
        let (first, second) = input.split_at(at);
        let (parser, ok) = parse_chunks(
            ParserOptions::new().encoding("latin1"),
            &[Input::Bytes(first), Input::Bytes(second)],
        );
        assert!(ok, "split at {}: {:?}", at, parser.error());
        assert_eq!(("UTF-8", EncodingOrigin::Detected), parser.encoding());
        assert_eq!(XmlEvent::characters("ä"), parser.handler()[2], "split at {}", at);
    }
}

#[test]
fn errors_do_not_depend_on_chunking() {
    let cases = [
        ("<a><b>text</c></a>", ErrorCode::UnbalancedElement),
        ("<a>\n  <b>\n</a>", ErrorCode::UnbalancedElement),
        ("<a x='1' y=\"<\"/>", ErrorCode::MalformedMarkup),
        ("<a>&unknown;</a>", ErrorCode::MalformedMarkup),
        ("<a><!-- x -- y --></a>", ErrorCode::MalformedMarkup),
        ("<a>", ErrorCode::UnbalancedElement),
        ("<?xml version='1.0' encoding='klingon'?><a/>", ErrorCode::EncodingError),
    ];

    for (input, code) in cases {
        let (whole, ok) = parse_chunks(ParserOptions::default(), &[Input::Text(input)]);
        assert!(!ok, "{:?}", input);
        let expected = error_summary(whole.error());
        assert_eq!(Some(code), expected.map(|(code, _, _)| code), "{:?}", input);
        let events = whole.into_handler();

        for at in char_boundaries(input) {
            let (parser, ok) = parse_text_split(input, at);
            assert!(!ok, "{:?} split at {}", input, at);
            assert_eq!(expected, error_summary(parser.error()), "{:?} split at {}", input, at);
            assert_eq!(events, parser.into_handler(), "{:?} split at {}", input, at);
        }
    }
}

#[test]
fn undecodable_bytes() {
    let input: &[u8] = b"<a>ok\xC3\x28</a>";
    for at in 0..=input.len() {
        let (parser, ok) = parse_bytes_split(input, at);
        assert!(!ok, "split at {}", at);
        assert_eq!(ErrorCode::EncodingError, parser.error().unwrap().code());
        assert_eq!(vec![XmlEvent::stag("a", Attributes::new())], parser.into_handler());
    }
}

#[test]
fn truncated_multibyte_sequence_at_end() {
    let mut parser = PushParser::new(Vec::new());
    assert!(parser.parse(&b"<a>\xE2\x82"[..], false));
    assert!(!parser.parse(&b""[..], true));
    assert_eq!(ErrorCode::EncodingError, parser.error().unwrap().code());
}

#[test]
fn declaration_before_first_element() {
    let mut parser = PushParser::new(Vec::new());
    assert!(parser.parse("<?xml version='1.0'?><!--c--><root/>", true));
    let events = parser.into_handler();
    let decl = events
        .iter()
        .position(|evt| matches!(evt, XmlEvent::XmlDecl(_)))
        .unwrap();
    let start = events
        .iter()
        .position(|evt| matches!(evt, XmlEvent::StartElement { .. }))
        .unwrap();
    assert!(decl < start);
    assert_eq!(
        1,
        events
            .iter()
            .filter(|evt| matches!(evt, XmlEvent::XmlDecl(_)))
            .count()
    );
}

#[test]
fn duplicate_attributes() {
    let mut parser = PushParser::new(Vec::new());
    assert!(parser.parse("<e a=\"1\" a=\"2\"/>", true));
    assert_eq!(
        XmlEvent::stag("e", attrs(&[("a", "2")])),
        parser.handler()[0]
    );
}

#[test]
fn unbalanced_and_sticky() {
    let mut parser = PushParser::new(Vec::new());
    assert!(!parser.parse("<a><b></a>", true));
    let error = parser.error().cloned();
    assert!(error.is_some());

    let events = parser.handler().len();
    assert!(!parser.parse("<c/>", true));
    assert!(!parser.parse(&b"</b>"[..], false));
    assert_eq!(events, parser.handler().len());
    assert_eq!(error.as_ref(), parser.error());
}

#[test]
fn open_element_at_end() {
    let mut parser = PushParser::new(Vec::new());
    assert!(!parser.parse("<a>", true));
    assert_eq!(ErrorCode::UnbalancedElement, parser.error().unwrap().code());
}

#[test]
fn nesting_round_trip() {
    let depth = 40;
    let mut input = String::new();
    for i in 0..depth {
        input.push_str(&format!("<n{} level=\"{}\">t{}", i, i, i));
    }
    for i in (0..depth).rev() {
        input.push_str(&format!("</n{}>", i));
    }

    let mut parser = PushParser::new(Vec::new());
    for chunk in input.as_bytes().chunks(13) {
        assert!(parser.parse(chunk, false));
    }
    assert!(parser.parse("", true));
    assert_eq!(0, parser.depth());

    let mut output = String::new();
    for evt in parser.into_handler() {
        match evt {
            XmlEvent::StartElement { name, attributes } => {
                output.push('<');
                output.push_str(&name);
                for attr in &attributes {
                    output.push_str(&format!(" {}=\"{}\"", attr.name(), attr.value()));
                }
                output.push('>');
            }
            XmlEvent::EndElement(name) => output.push_str(&format!("</{}>", name)),
            XmlEvent::Characters(text) => output.push_str(&text),
            evt => panic!("unexpected event {:?}", evt),
        }
    }
    assert_eq!(input, output);
}
