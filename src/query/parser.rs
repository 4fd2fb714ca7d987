//! Recursive-descent parser for tag queries
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ("or" and)*
//! and     := unary (["and"] unary)*
//! unary   := "not" unary | primary
//! primary := "(" or ")" | NAME [CMP VALUE]
//! ```

use super::{CompareOp, Comparison, KEYWORDS, ParseError, Query, TagClause, is_keyword, is_reserved};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word { text: String, quoted: bool },
    Open,
    Close,
    Op(CompareOp),
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word { text, quoted: false } if text.eq_ignore_ascii_case(keyword))
    }

    fn describe(&self) -> String {
        match self {
            Self::Word { text, .. } => format!("'{text}'"),
            Self::Open => "'('".to_string(),
            Self::Close => "')'".to_string(),
            Self::Op(op) => format!("'{op}'"),
        }
    }
}

/// Parse query text into a [`Query`]
///
/// # Examples
/// ```
/// use tagfs::query::{parse, Query, CompareOp};
///
/// let q = parse("photo and rating >= 4").unwrap();
/// assert_eq!(q, Query::and(Query::tag("photo"), Query::compare("rating", CompareOp::Ge, "4")));
/// ```
///
/// # Errors
///
/// Returns `ParseError` if the text is blank, has unbalanced parentheses,
/// an unterminated quote, or a token in an invalid position.
pub fn parse(text: &str) -> Result<Query, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyExpression);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let query = parser.parse_or()?;

    match parser.peek() {
        None => Ok(query),
        Some(Token::Close) => Err(ParseError::UnbalancedParens),
        Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut word = String::new();
                loop {
                    match chars.next() {
                        None => return Err(ParseError::UnterminatedQuote),
                        Some('"') => break,
                        Some('\\') => word.push(chars.next().ok_or(ParseError::UnterminatedQuote)?),
                        Some(other) => word.push(other),
                    }
                }
                tokens.push(Token::Word { text: word, quoted: true });
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.next_if_eq(&'=').is_some();
                let op = match (c, followed_by_eq) {
                    ('=', _) => CompareOp::Eq,
                    ('!', true) => CompareOp::Ne,
                    ('<', false) => CompareOp::Lt,
                    ('<', true) => CompareOp::Le,
                    ('>', false) => CompareOp::Gt,
                    ('>', true) => CompareOp::Ge,
                    _ => return Err(ParseError::UnexpectedToken(format!("'{c}'"))),
                };
                tokens.push(Token::Op(op));
            }
            '\\' => return Err(ParseError::UnexpectedToken("'\\'".to_string())),
            _ => {
                let mut word = String::new();
                while let Some(c) = chars.next_if(|c| !is_reserved(*c)) {
                    word.push(c);
                }
                tokens.push(Token::Word { text: word, quoted: false });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Whether the next token can begin an operand of an implicit `and`
    fn starts_operand(&self) -> bool {
        match self.peek() {
            Some(Token::Open) => true,
            Some(Token::Word { text, quoted }) => *quoted || !is_keyword(text) || text.eq_ignore_ascii_case("not"),
            _ => false,
        }
    }

    fn parse_or(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.advance();
            let right = self.parse_and()?;
            left = Query::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            if self.peek_keyword("and") {
                self.advance();
            } else if !self.starts_operand() {
                break;
            }
            let right = self.parse_unary()?;
            left = Query::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Query, ParseError> {
        if self.peek_keyword("not") {
            self.advance();
            return Ok(Query::not(self.parse_unary()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Query, ParseError> {
        match self.advance() {
            None => Err(end_of_query()),
            Some(Token::Open) => {
                if self.peek() == Some(&Token::Close) {
                    return Err(ParseError::EmptyExpression);
                }
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::Close) => Ok(inner),
                    None => Err(ParseError::UnbalancedParens),
                    Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
                }
            }
            Some(token @ Token::Word { .. }) if is_operator_word(&token) => {
                Err(ParseError::UnexpectedToken(token.describe()))
            }
            Some(Token::Word { text, .. }) => self.parse_clause(text),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
        }
    }

    fn parse_clause(&mut self, name: String) -> Result<Query, ParseError> {
        let Some(Token::Op(op)) = self.peek().cloned() else {
            return Ok(Query::Tag(TagClause { name, comparison: None }));
        };
        self.advance();

        match self.advance() {
            Some(token @ Token::Word { .. }) if is_operator_word(&token) => {
                Err(ParseError::UnexpectedToken(token.describe()))
            }
            Some(Token::Word { text, .. }) => Ok(Query::Tag(TagClause {
                name,
                comparison: Some(Comparison { op, value: text }),
            })),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
            None => Err(end_of_query()),
        }
    }
}

fn is_operator_word(token: &Token) -> bool {
    KEYWORDS.iter().any(|k| token.is_keyword(k))
}

fn end_of_query() -> ParseError {
    ParseError::UnexpectedToken("end of query".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Query {
        Query::tag(name)
    }

    fn round_trip(text: &str) {
        let parsed = parse(text).unwrap();
        let reparsed = parse(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed, "round trip of {text:?} via {parsed}");
    }

    #[test]
    fn test_single_tag() {
        assert_eq!(parse("photo").unwrap(), tag("photo"));
    }

    #[test]
    fn test_implicit_and() {
        assert_eq!(parse("a b").unwrap(), Query::and(tag("a"), tag("b")));
        assert_eq!(parse("a b").unwrap(), parse("a and b").unwrap());
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("a or b and not c").unwrap(),
            Query::or(tag("a"), Query::and(tag("b"), Query::not(tag("c"))))
        );
        assert_eq!(
            parse("(a or b) c").unwrap(),
            Query::and(Query::or(tag("a"), tag("b")), tag("c"))
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse("a or b or c").unwrap(),
            Query::or(Query::or(tag("a"), tag("b")), tag("c"))
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(parse("a AND NOT b").unwrap(), parse("a and not b").unwrap());
        assert_eq!(parse("a Or b").unwrap(), Query::or(tag("a"), tag("b")));
    }

    #[test]
    fn test_comparisons_with_and_without_spaces() {
        for op in CompareOp::ALL {
            let tight = parse(&format!("rating{}4", op.symbol())).unwrap();
            let spaced = parse(&format!("rating {} 4", op.symbol())).unwrap();
            assert_eq!(tight, Query::compare("rating", op, "4"));
            assert_eq!(tight, spaced);
        }
    }

    #[test]
    fn test_double_equals() {
        assert_eq!(parse("year==2024").unwrap(), Query::compare("year", CompareOp::Eq, "2024"));
    }

    #[test]
    fn test_quoted_names() {
        assert_eq!(parse("\"two words\"").unwrap(), tag("two words"));
        assert_eq!(parse("\"and\"").unwrap(), tag("and"));
        assert_eq!(parse(r#""say \"hi\"""#).unwrap(), tag("say \"hi\""));
        assert_eq!(
            parse("artist=\"The Band\"").unwrap(),
            Query::compare("artist", CompareOp::Eq, "The Band")
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(ParseError::EmptyExpression));
        assert_eq!(parse("   "), Err(ParseError::EmptyExpression));
        assert_eq!(parse("()"), Err(ParseError::EmptyExpression));
    }

    #[test]
    fn test_trailing_operator() {
        let expected = Err(ParseError::UnexpectedToken("end of query".into()));
        assert_eq!(parse("a and"), expected);
        assert_eq!(parse("a or"), expected);
        assert_eq!(parse("not"), expected);
        assert_eq!(parse("rating >="), expected);
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(parse("(a and b"), Err(ParseError::UnbalancedParens));
        assert_eq!(parse("a)"), Err(ParseError::UnbalancedParens));
    }

    #[test]
    fn test_unexpected_tokens() {
        assert_eq!(parse("and a"), Err(ParseError::UnexpectedToken("'and'".into())));
        assert_eq!(parse("a or or b"), Err(ParseError::UnexpectedToken("'or'".into())));
        assert_eq!(parse(">= 4"), Err(ParseError::UnexpectedToken("'>='".into())));
        assert_eq!(parse("a ! b"), Err(ParseError::UnexpectedToken("'!'".into())));
        assert_eq!(parse("(a and )"), Err(ParseError::UnexpectedToken("')'".into())));
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(parse("\"open"), Err(ParseError::UnterminatedQuote));
        assert_eq!(parse("\"open\\"), Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn test_round_trip() {
        for text in [
            "photo",
            "not photo",
            "a and b",
            "a or b",
            "a=1",
            "a!=1",
            "a<1",
            "a<=1",
            "a>1",
            "a>=1",
            "not (a or b) and c",
            "a or (b or c)",
            "\"with space\" and \"OR\"",
            "not not a",
            "title=\"a \\\"quoted\\\" value\"",
        ] {
            round_trip(text);
        }
    }

    #[test]
    fn test_round_trip_constructed_trees() {
        let trees = [
            Query::and(tag("a"), Query::and(tag("b"), tag("c"))),
            Query::not(Query::and(tag("a"), tag("b"))),
            Query::or(Query::and(tag("x"), tag("y")), Query::not(tag("z"))),
            Query::compare("rating", CompareOp::Ne, "not"),
        ];
        for tree in trees {
            assert_eq!(parse(&tree.to_string()).unwrap(), tree);
        }
    }
}
