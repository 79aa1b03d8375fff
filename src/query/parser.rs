use crate::common::{MinirelError, Result};
use crate::row::{Column, DataType, Value};

use super::command::{Command, Limit, OrderBy, Projection, WhereExpr};
use super::expression::ExpressionParser;
use super::tokenizer::{tokenize, Token, TokenKind};

/// Parses one SQL statement into a Command. A single trailing semicolon is
/// tolerated.
pub fn parse(sql: &str) -> Result<Command> {
    let mut tokens = tokenize(sql)?;
    if tokens.last().map(|t| t.is_punctuation(";")) == Some(true) {
        tokens.pop();
    }

    Parser { tokens, pos: 0 }.parse_statement()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_statement(mut self) -> Result<Command> {
        let first = self.advance()?.clone();
        if first.kind != TokenKind::Keyword {
            return Err(MinirelError::UnexpectedToken {
                found: first.text,
                expected: "statement keyword".to_string(),
            });
        }

        let command = match first.text.as_str() {
            "CREATE TABLE" => self.parse_create_table()?,
            "INSERT INTO" => self.parse_insert()?,
            "SELECT" => self.parse_select()?,
            "UPDATE" => self.parse_update()?,
            "DELETE FROM" => self.parse_delete()?,
            other => {
                return Err(MinirelError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "statement keyword".to_string(),
                })
            }
        };

        if let Some(extra) = self.peek() {
            return Err(MinirelError::UnexpectedToken {
                found: extra.text.clone(),
                expected: "end of statement".to_string(),
            });
        }

        Ok(command)
    }

    // --- token helpers ---

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<&Token> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or(MinirelError::UnexpectedEndOfQuery)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_identifier(&mut self) -> Result<String> {
        let token = self.advance()?;
        if token.kind != TokenKind::Identifier {
            return Err(MinirelError::UnexpectedToken {
                found: token.text.clone(),
                expected: "identifier".to_string(),
            });
        }
        Ok(token.text.clone())
    }

    fn expect_punctuation(&mut self, text: &str) -> Result<()> {
        let token = self.advance()?;
        if !token.is_punctuation(text) {
            return Err(MinirelError::UnexpectedToken {
                found: token.text.clone(),
                expected: text.to_string(),
            });
        }
        Ok(())
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        let token = self.advance()?;
        if !token.is_keyword(word) {
            return Err(MinirelError::UnexpectedToken {
                found: token.text.clone(),
                expected: word.to_string(),
            });
        }
        Ok(())
    }

    fn consume_keyword(&mut self, word: &str) -> bool {
        if self.peek().map(|t| t.is_keyword(word)) == Some(true) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn consume_punctuation(&mut self, text: &str) -> bool {
        if self.peek().map(|t| t.is_punctuation(text)) == Some(true) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_literal(&mut self) -> Result<Value> {
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

    // --- statements ---

    fn parse_create_table(&mut self) -> Result<Command> {
        let table = self.expect_identifier()?;
        self.expect_punctuation("(")?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_definition()?);
            if self.consume_punctuation(",") {
                continue;
            }
            self.expect_punctuation(")")?;
            break;
        }

        Ok(Command::CreateTable { table, columns })
    }

    fn parse_column_definition(&mut self) -> Result<Column> {
        let name = self.expect_identifier()?;

        let type_token = self.advance()?;
        let data_type = match type_token.text.as_str() {
            "INT" => DataType::Number,
            "VARCHAR" => DataType::Text,
            other => return Err(MinirelError::UnknownColumnType(other.to_string())),
        };

        let mut column = Column::new(name, data_type);
        let mut explicit_null = false;

        loop {
            if self.consume_keyword("NOT") {
                self.expect_keyword("NULL")?;
                column.nullable = false;
            } else if self.consume_keyword("NULL") {
                explicit_null = true;
            } else if self.consume_keyword("PRIMARY KEY") {
                column.primary_key = true;
            } else if self.consume_keyword("AUTOINCREMENT") {
                column.auto_increment = true;
            } else if self.consume_keyword("UNIQUE") {
                column.unique = true;
            } else {
                break;
            }
        }

        if column.primary_key {
            if explicit_null {
                return Err(MinirelError::PrimaryKeyNullable);
            }
            column.nullable = false;
            column.unique = true;
        }

        if column.auto_increment && !(column.primary_key && data_type == DataType::Number) {
            return Err(MinirelError::InvalidAutoIncrement);
        }

        Ok(column)
    }

    fn parse_insert(&mut self) -> Result<Command> {
        let table = self.expect_identifier()?;

        let mut columns = Vec::new();
        if self.consume_punctuation("(") {
            loop {
                columns.push(self.expect_identifier()?);
                if self.consume_punctuation(",") {
                    continue;
                }
                self.expect_punctuation(")")?;
                break;
            }
        }

        self.expect_keyword("VALUES")?;

        let mut rows = Vec::new();
        loop {
            self.expect_punctuation("(")?;
            let mut row = Vec::new();
            loop {
                row.push(self.parse_literal()?);
                if self.consume_punctuation(",") {
                    continue;
                }
                self.expect_punctuation(")")?;
                break;
            }
            rows.push(row);
            if !self.consume_punctuation(",") {
                break;
            }
        }

        Ok(Command::Insert {
            table,
            columns,
            rows,
        })
    }

    fn parse_select(&mut self) -> Result<Command> {
        let projection = if self.peek().map(|t| t.text == "*") == Some(true) {
            self.pos += 1;
            Projection::All
        } else {
            let mut fields = vec![self.expect_identifier()?];
            while self.consume_punctuation(",") {
                fields.push(self.expect_identifier()?);
            }
            Projection::Columns(fields)
        };

        self.expect_keyword("FROM")?;
        let table = self.expect_identifier()?;

        let filter = self.parse_optional_where(&["ORDER BY", "LIMIT"])?;

        let order_by = if self.consume_keyword("ORDER BY") {
            let field = self.expect_identifier()?;
            let descending = if self.consume_keyword("DESC") {
                true
            } else {
                self.consume_keyword("ASC");
                false
            };
            Some(OrderBy { field, descending })
        } else {
            None
        };

        let limit = if self.consume_keyword("LIMIT") {
            let limit = self.parse_count()?;
            let offset = if self.consume_keyword("OFFSET") {
                self.parse_count()?
            } else {
                0
            };
            Some(Limit { limit, offset })
        } else {
            None
        };

        Ok(Command::Select {
            table,
            projection,
            filter,
            order_by,
            limit,
        })
    }

    fn parse_update(&mut self) -> Result<Command> {
        let table = self.expect_identifier()?;
        self.expect_keyword("SET")?;

        let mut assignments = Vec::new();
        loop {
            let field = self.expect_identifier()?;
            let eq = self.advance()?;
            if eq.kind != TokenKind::Operator || eq.text != "=" {
                return Err(MinirelError::UnexpectedToken {
                    found: eq.text.clone(),
                    expected: "=".to_string(),
                });
            }
            let value = self.parse_literal()?;
            assignments.push((field, value));

            if !self.consume_punctuation(",") {
                break;
            }
        }

        let filter = self.parse_optional_where(&[])?;

        Ok(Command::Update {
            table,
            assignments,
            filter,
        })
    }

    fn parse_delete(&mut self) -> Result<Command> {
        let table = self.expect_identifier()?;
        let filter = self.parse_optional_where(&[])?;
        Ok(Command::Delete { table, filter })
    }

    fn parse_count(&mut self) -> Result<usize> {
        let token = self.advance()?;
        if token.kind != TokenKind::Number {
            return Err(MinirelError::UnexpectedToken {
                found: token.text.clone(),
                expected: "number".to_string(),
            });
        }
        token
            .text
            .parse::<usize>()
            .map_err(|_| MinirelError::ExpectedValue(token.text.clone()))
    }

    /// Parses an optional WHERE clause. The expression tokens run until one
    /// of the given stop keywords or the end of the statement.
    fn parse_optional_where(&mut self, stop_words: &[&str]) -> Result<Option<WhereExpr>> {
        if !self.consume_keyword("WHERE") {
            return Ok(None);
        }

        let start = self.pos;
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Keyword
                && stop_words.contains(&token.text.as_str())
            {
                break;
            }
            self.pos += 1;
        }

        let expr_tokens = self.tokens[start..self.pos].to_vec();
        Ok(Some(ExpressionParser::new(expr_tokens).parse()?))
    }
}
