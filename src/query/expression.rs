use crate::common::{MinirelError, Result};
use crate::row::Value;

use super::command::{CompareOp, LogicalOp, WhereExpr};
use super::tokenizer::{Token, TokenKind};

/// Precedence-climbing parser for WHERE expressions.
///
/// Grammar: conditions joined by AND/OR with the usual precedence (AND
/// binds tighter), parentheses for grouping. A condition is
/// `field op literal`; IS and IS NOT accept only NULL on the right, every
/// other operator rejects it.
pub struct ExpressionParser {
    tokens: Vec<Token>,
    pos: usize,
}

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;

impl ExpressionParser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<WhereExpr> {
        if self.tokens.is_empty() {
            return Err(MinirelError::InvalidWhereClause);
        }
        let expr = self.parse_binary(0)?;
        if self.pos != self.tokens.len() {
            return Err(MinirelError::InvalidWhereClause);
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<&Token> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or(MinirelError::UnexpectedEndOfExpression)?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<WhereExpr> {
        let mut left = self.parse_primary()?;

        while let Some(token) = self.peek() {
            let (op, precedence) = if token.is_keyword("AND") {
                (LogicalOp::And, PREC_AND)
            } else if token.is_keyword("OR") {
                (LogicalOp::Or, PREC_OR)
            } else {
                break;
            };

            if precedence < min_precedence {
                break;
            }

            self.pos += 1;
            let right = self.parse_binary(precedence + 1)?;
            left = WhereExpr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<WhereExpr> {
        if self.peek().map(|t| t.is_punctuation("(")) == Some(true) {
            self.pos += 1;
            let expr = self.parse_binary(0)?;
            let closing = self.advance()?;
            if !closing.is_punctuation(")") {
                return Err(MinirelError::UnexpectedToken {
                    found: closing.text.clone(),
                    expected: ")".to_string(),
                });
            }
            return Ok(expr);
        }

        let field = {
            let token = self.advance()?;
            if token.kind != TokenKind::Identifier {
                return Err(MinirelError::UnexpectedToken {
                    found: token.text.clone(),
                    expected: "column name".to_string(),
                });
            }
            token.text.clone()
        };

        let operator = self.parse_operator()?;
        let value = self.parse_value()?;

        match operator {
            CompareOp::IsNull | CompareOp::IsNotNull => {
                if !value.is_null() {
                    return Err(MinirelError::OperatorRequiresNull(
                        operator.as_str().to_string(),
                    ));
                }
            }
            _ => {
                if value.is_null() {
                    return Err(MinirelError::OperatorRejectsNull(
                        operator.as_str().to_string(),
                    ));
                }
            }
        }

        Ok(WhereExpr::Condition {
            field,
            operator,
            value,
        })
    }

    fn parse_operator(&mut self) -> Result<CompareOp> {
        let token = self.advance()?;

        if token.kind == TokenKind::Operator {
            return match token.text.as_str() {
                "=" => Ok(CompareOp::Eq),
                "<>" => Ok(CompareOp::NotEq),
                "<" => Ok(CompareOp::Lt),
                ">" => Ok(CompareOp::Gt),
                "<=" => Ok(CompareOp::LtEq),
                ">=" => Ok(CompareOp::GtEq),
                other => Err(MinirelError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "comparison operator".to_string(),
                }),
            };
        }

        if token.is_keyword("LIKE") {
            return Ok(CompareOp::Like);
        }

        if token.is_keyword("IS") {
            if self.peek().map(|t| t.is_keyword("NOT")) == Some(true) {
                self.pos += 1;
                return Ok(CompareOp::IsNotNull);
            }
            return Ok(CompareOp::IsNull);
        }

        Err(MinirelError::UnexpectedToken {
            found: token.text.clone(),
            expected: "comparison operator".to_string(),
        })
    }

    fn parse_value(&mut self) -> Result<Value> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Number => token
                .text
                .parse::<u32>()
                .map(Value::Number)
                .map_err(|_| MinirelError::ExpectedValue(token.text.clone())),
            TokenKind::String => Ok(Value::Text(token.text.clone())),
            TokenKind::Keyword if token.text == "NULL" => Ok(Value::Null),
            _ => Err(MinirelError::ExpectedValue(token.text.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tokenizer::tokenize;

    fn parse(input: &str) -> Result<WhereExpr> {
        ExpressionParser::new(tokenize(input).unwrap()).parse()
    }

    fn condition(field: &str, operator: CompareOp, value: Value) -> WhereExpr {
        WhereExpr::Condition {
            field: field.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn test_expression_single_condition() {
        assert_eq!(
            parse("age >= 18").unwrap(),
            condition("age", CompareOp::GtEq, Value::Number(18))
        );
    }

    #[test]
    fn test_expression_and_binds_tighter_than_or() {
        // a = 1 OR b = 2 AND c = 3  =>  a = 1 OR (b = 2 AND c = 3)
        let expr = parse("a = 1 OR b = 2 AND c = 3").unwrap();
        assert_eq!(
            expr,
            WhereExpr::Logical {
                op: LogicalOp::Or,
                left: Box::new(condition("a", CompareOp::Eq, Value::Number(1))),
                right: Box::new(WhereExpr::Logical {
                    op: LogicalOp::And,
                    left: Box::new(condition("b", CompareOp::Eq, Value::Number(2))),
                    right: Box::new(condition("c", CompareOp::Eq, Value::Number(3))),
                }),
            }
        );
    }

    #[test]
    fn test_expression_parentheses_override_precedence() {
        let expr = parse("(a = 1 OR b = 2) AND c = 3").unwrap();
        assert_eq!(
            expr,
            WhereExpr::Logical {
                op: LogicalOp::And,
                left: Box::new(WhereExpr::Logical {
                    op: LogicalOp::Or,
                    left: Box::new(condition("a", CompareOp::Eq, Value::Number(1))),
                    right: Box::new(condition("b", CompareOp::Eq, Value::Number(2))),
                }),
                right: Box::new(condition("c", CompareOp::Eq, Value::Number(3))),
            }
        );
    }

    #[test]
    fn test_expression_is_null_forms() {
        assert_eq!(
            parse("email IS NULL").unwrap(),
            condition("email", CompareOp::IsNull, Value::Null)
        );
        assert_eq!(
            parse("email IS NOT NULL").unwrap(),
            condition("email", CompareOp::IsNotNull, Value::Null)
        );
    }

    #[test]
    fn test_expression_is_requires_null() {
        assert!(matches!(
            parse("email IS 5"),
            Err(MinirelError::OperatorRequiresNull(_))
        ));
    }

    #[test]
    fn test_expression_comparison_rejects_null() {
        assert!(matches!(
            parse("email = NULL"),
            Err(MinirelError::OperatorRejectsNull(_))
        ));
    }

    #[test]
    fn test_expression_like() {
        assert_eq!(
            parse("name LIKE 'A%'").unwrap(),
            condition("name", CompareOp::Like, Value::Text("A%".into()))
        );
    }

    #[test]
    fn test_expression_trailing_tokens_rejected() {
        assert!(matches!(
            parse("a = 1 b"),
            Err(MinirelError::InvalidWhereClause)
        ));
    }

    #[test]
    fn test_expression_truncated() {
        assert!(matches!(
            parse("a ="),
            Err(MinirelError::UnexpectedEndOfExpression)
        ));
    }
}
