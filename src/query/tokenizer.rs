use crate::common::{MinirelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Operator,
    Punctuation,
}

/// One lexical token. Keywords and operators carry their canonical
/// uppercase spelling; identifiers and literals keep the input spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    pub fn is_punctuation(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }
}

/// Reserved words, multi-word phrases included. Matching is longest-first
/// so that e.g. "ORDER BY" never lexes as an identifier followed by "BY".
const RESERVED_WORDS: &[&str] = &[
    "CREATE TABLE",
    "INSERT INTO",
    "DELETE FROM",
    "PRIMARY KEY",
    "ORDER BY",
    "AUTOINCREMENT",
    "SELECT",
    "UPDATE",
    "VARCHAR",
    "VALUES",
    "OFFSET",
    "UNIQUE",
    "WHERE",
    "LIMIT",
    "FROM",
    "DESC",
    "NULL",
    "LIKE",
    "AND",
    "NOT",
    "SET",
    "ASC",
    "INT",
    "IS",
    "OR",
];

/// Two-character operators come first so "<=" is not lexed as "<", "=".
const OPERATORS: &[&str] = &["<=", ">=", "<>", "=", "<", ">", "*"];

const PUNCTUATION: &[char] = &['(', ')', ',', ';'];

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Eagerly tokenizes a full statement.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    'outer: while pos < chars.len() {
        let ch = chars[pos];

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        // Reserved words, case-insensitive, bounded by non-word characters.
        if ch.is_ascii_alphabetic() {
            for word in RESERVED_WORDS {
                if matches_word(&chars, pos, word) {
                    tokens.push(Token {
                        kind: TokenKind::Keyword,
                        text: (*word).to_string(),
                        position: pos,
                    });
                    pos += word.len();
                    continue 'outer;
                }
            }
        }

        if ch == '\'' {
            let start = pos;
            pos += 1;
            let mut text = String::new();
            loop {
                match chars.get(pos) {
                    Some('\'') => {
                        pos += 1;
                        break;
                    }
                    Some(&c) => {
                        text.push(c);
                        pos += 1;
                    }
                    None => {
                        return Err(MinirelError::UnterminatedString { position: start })
                    }
                }
            }
            tokens.push(Token {
                kind: TokenKind::String,
                text,
                position: start,
            });
            continue;
        }

        if ch.is_ascii_digit() {
            let start = pos;
            let mut text = String::new();
            while let Some(&c) = chars.get(pos) {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text,
                position: start,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = pos;
            let mut text = String::new();
            while let Some(&c) = chars.get(pos) {
                if !is_word_char(c) {
                    break;
                }
                text.push(c);
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Identifier,
                text,
                position: start,
            });
            continue;
        }

        for op in OPERATORS {
            if chars[pos..].starts_with(&op.chars().collect::<Vec<_>>()[..]) {
                tokens.push(Token {
                    kind: TokenKind::Operator,
                    text: (*op).to_string(),
                    position: pos,
                });
                pos += op.len();
                continue 'outer;
            }
        }

        if PUNCTUATION.contains(&ch) {
            tokens.push(Token {
                kind: TokenKind::Punctuation,
                text: ch.to_string(),
                position: pos,
            });
            pos += 1;
            continue;
        }

        return Err(MinirelError::UnexpectedCharacter { ch, position: pos });
    }

    Ok(tokens)
}

/// Checks whether the reserved word starts at `pos`, comparing
/// case-insensitively and requiring a word boundary after it. Interior
/// spaces of multi-word phrases match any single whitespace character.
fn matches_word(chars: &[char], pos: usize, word: &str) -> bool {
    let word_chars: Vec<char> = word.chars().collect();
    if pos + word_chars.len() > chars.len() {
        return false;
    }

    for (i, &wc) in word_chars.iter().enumerate() {
        let c = chars[pos + i];
        if wc == ' ' {
            if !c.is_whitespace() {
                return false;
            }
        } else if !c.eq_ignore_ascii_case(&wc) {
            return false;
        }
    }

    match chars.get(pos + word_chars.len()) {
        Some(&c) => !is_word_char(c),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).unwrap().into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_tokenize_select() {
        let tokens = tokenize("SELECT * FROM users WHERE id = 3;").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Operator,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Punctuation,
            ]
        );
    }

    #[test]
    fn test_tokenize_keywords_are_case_insensitive() {
        assert_eq!(
            texts("select name from users"),
            vec!["SELECT", "name", "FROM", "users"]
        );
    }

    #[test]
    fn test_tokenize_multi_word_keywords() {
        assert_eq!(
            texts("insert into t order by x"),
            vec!["INSERT INTO", "t", "ORDER BY", "x"]
        );
    }

    #[test]
    fn test_tokenize_keyword_prefix_stays_identifier() {
        // "ordering" must not lex as ORDER BY or OR.
        assert_eq!(texts("ordering"), vec!["ordering"]);
        assert_eq!(texts("selection"), vec!["selection"]);
    }

    #[test]
    fn test_tokenize_string_literal() {
        let tokens = tokenize("name = 'Ada Lovelace'").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[2].text, "Ada Lovelace");
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        assert!(matches!(
            tokenize("name = 'oops"),
            Err(MinirelError::UnterminatedString { position: 7 })
        ));
    }

    #[test]
    fn test_tokenize_two_char_operators() {
        assert_eq!(texts("a <= 1 AND b <> 2"), vec!["a", "<=", "1", "AND", "b", "<>", "2"]);
    }

    #[test]
    fn test_tokenize_unexpected_character() {
        assert!(matches!(
            tokenize("a ! b"),
            Err(MinirelError::UnexpectedCharacter { ch: '!', position: 2 })
        ));
    }
}
