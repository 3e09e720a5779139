use std::borrow::Cow;

/// String that stays borrowed from the input while only one slice is pushed
#[derive(Default)]
pub(crate) struct CowStrBuilder<'a>(Cow<'a, str>);

impl<'a> CowStrBuilder<'a> {
    pub fn build(self) -> Cow<'a, str> {
        self.0
    }

    pub fn push_borrow_str(&mut self, string: &'a str) {
        if string.is_empty() {
            return;
        }

        if self.0.is_empty() {
            self.0 = Cow::Borrowed(string);
            return;
        }

        self.to_mut().push_str(string);
    }

    pub fn push_char(&mut self, c: char) {
        self.to_mut().push(c);
    }

    fn to_mut(&mut self) -> &mut String {
        if let Cow::Borrowed(borrowed) = self.0 {
            let mut owned = String::with_capacity(borrowed.len() + 16);
            owned.push_str(borrowed);
            self.0 = Cow::Owned(owned);
        }
        self.0.to_mut()
    }
}
