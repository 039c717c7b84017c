use super::text::LineRef;

pub const SEARCH_OPEN: &str = "SEARCH";
pub const SEPARATOR: &str = "=======";
pub const REPLACE_OPEN: &str = "REPLACE";

/// Boundary tokens of the SEARCH/REPLACE wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    SearchOpen,
    Separator,
    ReplaceOpen,
}

/// A raw line plus what it means to the block builder.
#[derive(Debug, Clone, Copy)]
pub struct LineClass<'a> {
    pub line: LineRef<'a>,
    /// Set when the trimmed line is exactly one of the boundary tokens.
    pub token: Option<Token>,
    /// Whether the line break has arrived; a bare `SEARCH` at the very end
    /// of the stream may still turn into `SEARCHING` on the next chunk.
    pub terminated: bool,
    pub is_blank: bool,
}

impl LineClass<'_> {
    /// A token that is safe to act on: its line is complete.
    pub fn settled_token(&self) -> Option<Token> {
        if self.terminated { self.token } else { None }
    }

    /// Whether this unterminated line could still become `REPLACE`.
    pub fn may_become_replace_open(&self) -> bool {
        !self.terminated && REPLACE_OPEN.starts_with(self.line.trimmed())
    }
}

pub fn classify(line: LineRef<'_>) -> LineClass<'_> {
    let trimmed = line.trimmed();
    let token = match trimmed {
        SEARCH_OPEN => Some(Token::SearchOpen),
        SEPARATOR => Some(Token::Separator),
        REPLACE_OPEN => Some(Token::ReplaceOpen),
        _ => None,
    };

    LineClass {
        line,
        token,
        terminated: line.is_terminated(),
        is_blank: trimmed.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::text::lines_with_spans;
    use rstest::rstest;

    fn classify_str(text: &str) -> LineClass<'_> {
        classify(lines_with_spans(text).next().unwrap())
    }

    #[rstest]
    #[case("SEARCH\n", Some(Token::SearchOpen))]
    #[case("  SEARCH \r\n", Some(Token::SearchOpen))]
    #[case("=======\n", Some(Token::Separator))]
    #[case("REPLACE\n", Some(Token::ReplaceOpen))]
    #[case("\tREPLACE\n", Some(Token::ReplaceOpen))]
    #[case("SEARCHING\n", None)]
    #[case("========\n", None)]
    #[case("// SEARCH\n", None)]
    fn test_classify_tokens(#[case] line: &str, #[case] expected: Option<Token>) {
        assert_eq!(classify_str(line).token, expected);
    }

    #[test]
    fn test_unterminated_token_is_not_settled() {
        let class = classify_str("SEARCH");
        assert_eq!(class.token, Some(Token::SearchOpen));
        assert_eq!(class.settled_token(), None);
    }

    #[rstest]
    #[case("R", true)]
    #[case("REPL", true)]
    #[case("REPLACE", true)]
    #[case("  ", true)]
    #[case("REPLY", false)]
    #[case("REPL\n", false)]
    fn test_may_become_replace_open(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(classify_str(line).may_become_replace_open(), expected);
    }
}
