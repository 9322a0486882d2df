//! Statement lexer - splits text into whitespace words and quote-aware fields

use std::{iter::Peekable, str::CharIndices};

/// A whitespace separated word with its byte span in the statement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// The word starts inside a quoted literal
    pub quoted: bool,
}

impl Word<'_> {
    /// Case-insensitive keyword match
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: input.char_indices().peekable(),
        }
    }

    /// Splits the input on whitespace, keeping byte offsets and marking
    /// words that begin inside single or double quotes
    pub fn words(mut self) -> Vec<Word<'a>> {
        let mut words = Vec::new();
        let mut quote: Option<char> = None;
        loop {
            self.next_while(|c| c.is_whitespace());
            let Some(&(start, _)) = self.iter.peek() else {
                break;
            };
            let quoted = quote.is_some();
            while let Some(c) = self.next_if(|c| !c.is_whitespace()) {
                quote = match quote {
                    Some(q) if c == q => None,
                    None if c == '\'' || c == '"' => Some(c),
                    q => q,
                };
            }
            let end = self.offset();
            words.push(Word {
                text: &self.input[start..end],
                start,
                end,
                quoted,
            });
        }
        words
    }

    /// Splits the input on `separator` outside single or double quotes.
    /// Fields are trimmed; blank fields are dropped.
    pub fn fields(mut self, separator: char) -> Vec<&'a str> {
        let mut fields = Vec::new();
        let mut start = 0;
        let mut quote: Option<char> = None;
        while let Some((pos, c)) = self.iter.next() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == separator => {
                    fields.push(self.input[start..pos].trim());
                    start = pos + c.len_utf8();
                }
                None => {}
            }
        }
        fields.push(self.input[start..].trim());
        fields.retain(|f| !f.is_empty());
        fields
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&&(_, c)| predicate(c))?;
        self.iter.next().map(|(_, c)| c)
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) {
        while self.next_if(&predicate).is_some() {}
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        self.iter.peek().map_or(self.input.len(), |&(pos, _)| pos)
    }
}
