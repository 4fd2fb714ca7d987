//! Unit tests for query error types

#[cfg(test)]
mod tests {
    use crate::db::DbError;
    use crate::query::error::{EvalError, ParseError};

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(
            ParseError::UnexpectedToken("end of query".into()).to_string(),
            "Unexpected end of query"
        );
        assert_eq!(ParseError::UnbalancedParens.to_string(), "Unbalanced parentheses");
        assert_eq!(ParseError::EmptyExpression.to_string(), "Empty expression");
        assert_eq!(ParseError::UnterminatedQuote.to_string(), "Unterminated quote");
    }

    #[test]
    fn test_eval_error_wraps_store_error() {
        let error: EvalError = DbError::UnknownTag("x".into()).into();
        assert!(matches!(error, EvalError::Store(_)));
        assert_eq!(error.to_string(), "No such tag: x");
    }

    #[test]
    fn test_unknown_tag_message() {
        let error = EvalError::UnknownTag("photo".into());
        assert_eq!(error.to_string(), "No such tag: photo");
    }
}
