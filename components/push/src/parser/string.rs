use crate::parser::{Cursor, Parser};

pub fn lit(lit: &'static str) -> Lit {
    Lit { lit }
}

pub struct Lit {
    lit: &'static str,
}

impl<'a> Parser<'a> for Lit {
    type Attribute = ();
    type Error = ();

    fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        if !cur.has_next_str(self.lit) {
            Err(())
        } else {
            Ok(((), cur.advance(self.lit.len())))
        }
    }
}

/// Exactly one char matching `predicate`
pub fn char_<P: Fn(char) -> bool>(predicate: P) -> Char<P> {
    Char { predicate }
}

pub struct Char<P: Fn(char) -> bool> {
    predicate: P,
}

impl<'a, P: Fn(char) -> bool> Parser<'a> for Char<P> {
    type Attribute = ();
    type Error = ();

    fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        match cur.next_char() {
            Some(c) if (self.predicate)(c) => Ok(((), cur.advance(c.len_utf8()))),
            _ => Err(()),
        }
    }
}

/// One or more chars matching `predicate`
pub fn chars<P: Fn(char) -> bool>(predicate: P) -> Chars<P> {
    Chars { predicate }
}

pub struct Chars<P: Fn(char) -> bool> {
    predicate: P,
}

impl<'a, P: Fn(char) -> bool> Parser<'a> for Chars<P> {
    type Attribute = ();
    type Error = ();

    fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        let len = cur
            .rest()
            .char_indices()
            .find(|(_, c)| !(self.predicate)(*c))
            .map(|(i, _)| i)
            .unwrap_or_else(|| cur.rest().len());
        if len == 0 {
            Err(())
        } else {
            Ok(((), cur.advance(len)))
        }
    }
}
