mod command;
mod expression;
mod parser;
mod runner;
mod tokenizer;

pub use command::{Command, CompareOp, Limit, LogicalOp, OrderBy, Projection, WhereExpr};
pub use parser::parse;
pub use runner::{QueryOutput, QueryRunner};
pub use tokenizer::{tokenize, Token, TokenKind};
