use std::marker::PhantomData;

use crate::parser::{Cursor, Parser};

/// Return the consumed input of `parser` instead of its attribute
#[inline]
pub fn raw<'a, T: 'a + Parser<'a>>(parser: T) -> Raw<'a, T> {
    Raw(parser, PhantomData)
}

pub struct Raw<'a, T: Parser<'a>>(T, PhantomData<&'a T>);

impl<'a, T: Parser<'a>> Parser<'a> for Raw<'a, T> {
    type Attribute = &'a str;
    type Error = T::Error;

    fn parse(&self, start: Cursor<'a>) -> Result<(&'a str, Cursor<'a>), T::Error> {
        let (_, end) = self.0.parse(start)?;
        Ok(start.advance2(end.offset() - start.offset()))
    }
}

pub fn optional<'a, T: Parser<'a>>(parser: T) -> Optional<T> {
    Optional(parser)
}

pub struct Optional<T>(T);

impl<'a, T: Parser<'a>> Parser<'a> for Optional<T> {
    type Attribute = Option<T::Attribute>;
    type Error = T::Error;

    fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), T::Error> {
        match self.0.parse(cur) {
            Ok((attr, cur)) => Ok((Some(attr), cur)),
            Err(_) => Ok((None, cur)),
        }
    }
}

pub fn kleene<'a, T: Parser<'a>>(parser: T) -> Kleene<T> {
    Kleene(parser)
}

pub struct Kleene<T>(T);

impl<'a, T: Parser<'a>> Parser<'a> for Kleene<T> {
    type Attribute = Vec<T::Attribute>;
    type Error = T::Error;

    fn parse(&self, mut cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), T::Error> {
        let mut res = vec![];
        while let Ok((attr, cursor)) = self.0.parse(cur) {
            cur = cursor;
            res.push(attr);
        }
        Ok((res, cur))
    }
}

pub fn map_error<'a, T: Parser<'a>, E, F: Fn(T::Error) -> E>(
    parser: T,
    f: F,
) -> MapError<'a, T, E, F> {
    MapError(parser, f, PhantomData)
}

pub struct MapError<'a, T: Parser<'a>, E, F: Fn(T::Error) -> E>(T, F, PhantomData<&'a E>);

impl<'a, T: Parser<'a>, E, F: Fn(T::Error) -> E> Parser<'a> for MapError<'a, T, E, F> {
    type Attribute = T::Attribute;
    type Error = E;

    fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
        self.0.parse(cur).map_err(&self.1)
    }
}

macro_rules! def_seq {
    ($($i:tt: $t:ident),+ $(,)?) => {
        impl<
                'a,
                $($t: Parser<'a, Error = E>),*,
                E,
            > Parser<'a> for ($($t),*,)
        {
            type Attribute = ($($t::Attribute),*,);
            type Error = E;

            #[allow(non_snake_case)]
            fn parse(&self, cur: Cursor<'a>) -> Result<(Self::Attribute, Cursor<'a>), Self::Error> {
                $(let ($t, cur) = self.$i.parse(cur)?;)*
                Ok((($($t),*,), cur))
            }
        }
    };
}

def_seq!(0: T1, 1: T2);
def_seq!(0: T1, 1: T2, 2: T3);
