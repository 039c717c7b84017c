use super::DiffBlock;
use super::classify::{LineClass, Token};
use super::text::{Span, without_trailing_line_break};

#[derive(Debug, Clone, Copy)]
enum State {
    /// Before the first SEARCH-open line; stray prose is skipped.
    Preamble,
    Search {
        body_start: usize,
    },
    /// Separator seen, REPLACE-open not yet.
    AwaitReplace {
        search: Span,
    },
    Replace {
        search: Span,
        body_start: usize,
    },
}

/// Why the accumulated text cannot be read as SEARCH/REPLACE blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    TokenBeforeSearch(Token),
    NestedSearch,
    ReplaceInsideSearch,
    MissingReplace,
}

/// Line-at-a-time state machine over the raw diff text.
pub struct BlockBuilder<'a> {
    raw: &'a str,
    /// No more text will arrive, so an unterminated last line is final.
    at_end: bool,
    state: State,
    out: Vec<DiffBlock>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            at_end: false,
            state: State::Preamble,
            out: vec![],
        }
    }

    /// Builder for the complete stream
    pub fn at_end(raw: &'a str) -> Self {
        Self {
            at_end: true,
            ..Self::new(raw)
        }
    }

    fn token(&self, c: &LineClass<'_>) -> Option<Token> {
        if self.at_end {
            c.token
        } else {
            c.settled_token()
        }
    }

    pub fn push(&mut self, c: &LineClass<'_>) -> Result<(), Malformed> {
        let line = c.line.span;

        match self.state {
            State::Preamble => match self.token(c) {
                Some(Token::SearchOpen) => {
                    self.state = State::Search {
                        body_start: line.end,
                    };
                }
                Some(token) => return Err(Malformed::TokenBeforeSearch(token)),
                None => {}
            },
            State::Search { body_start } => match self.token(c) {
                Some(Token::Separator) => {
                    self.state = State::AwaitReplace {
                        search: self.content_before(body_start, line.start),
                    };
                }
                Some(Token::SearchOpen) => return Err(Malformed::NestedSearch),
                Some(Token::ReplaceOpen) => return Err(Malformed::ReplaceInsideSearch),
                None => {}
            },
            State::AwaitReplace { search } => {
                if c.token == Some(Token::ReplaceOpen) {
                    self.state = State::Replace {
                        search,
                        body_start: line.end,
                    };
                } else if !(c.is_blank || c.may_become_replace_open()) {
                    return Err(Malformed::MissingReplace);
                }
            }
            State::Replace { search, body_start } => {
                if self.token(c) == Some(Token::SearchOpen) {
                    let replace = self.content_before(body_start, line.start);
                    self.emit(search, replace, true, true);
                    self.state = State::Search {
                        body_start: line.end,
                    };
                }
            }
        }

        Ok(())
    }

    /// Close the open block, if any, at end of the accumulated input.
    ///
    /// Built with [`BlockBuilder::at_end`], a search section that never got
    /// its separator is still reported, without `replace_open`, so the
    /// caller can tell the stream was cut short. A bare trailing SEARCH line
    /// is dropped.
    pub fn finish(mut self) -> Vec<DiffBlock> {
        let empty = Span {
            start: self.raw.len(),
            end: self.raw.len(),
        };
        match self.state {
            State::Preamble => {}
            State::Search { body_start } => {
                let search = Span {
                    start: body_start,
                    end: self.raw.len(),
                };
                if self.at_end && !self.raw[search.start..search.end].trim().is_empty() {
                    self.emit(search, empty, false, false);
                }
            }
            State::AwaitReplace { search } => self.emit(search, empty, false, false),
            State::Replace { search, body_start } => {
                let replace = Span {
                    start: body_start,
                    end: self.raw.len(),
                };
                self.emit(search, replace, false, true);
            }
        }
        self.out
    }

    fn content_before(&self, body_start: usize, token_start: usize) -> Span {
        without_trailing_line_break(
            self.raw,
            Span {
                start: body_start,
                end: token_start,
            },
        )
    }

    fn emit(&mut self, search: Span, replace: Span, complete: bool, replace_open: bool) {
        self.out.push(DiffBlock {
            search_text: self.raw[search.start..search.end].to_string(),
            replace_text: self.raw[replace.start..replace.end].to_string(),
            replace_open,
            complete,
        });
    }
}
