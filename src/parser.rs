use crate::ast::{ComparisonOp, Expr, Operand};
use crate::error::{Error, Result};
use crate::tokenizer::{Spanned, Token, Tokenizer};

/// Recursive-descent parser for the filter language:
///
/// ```text
/// expr       := orExpr
/// orExpr     := andExpr ( "OR" andExpr )*
/// andExpr    := comparison ( "AND" comparison )*
/// comparison := "(" expr ")" | operand operator operand
/// ```
///
/// `AND` binds tighter than `OR`; both associate to the left.
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    /// Wraps a token stream. A stream that does not end in [Token::Eof] gets one appended.
    pub fn new(mut tokens: Vec<Spanned>) -> Self {
        if !matches!(tokens.last(), Some(Spanned { token: Token::Eof, .. })) {
            let position = tokens.last().map_or(0, |last| last.position + last.token.text().len());
            tokens.push(Spanned {
                token: Token::Eof,
                position,
            });
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// Tokenizes and parses `input` in one go.
    pub fn parse_str(input: &str) -> Result<Expr> {
        let tokens = Tokenizer::new(input).tokenize()?;
        Self::new(tokens).parse()
    }

    /// Parses the whole token stream as one expression.
    ///
    /// # Errors
    /// Returns a compile error naming the offending token and its position when the input
    /// is malformed (unbalanced parentheses, missing operand or operator, trailing input).
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_or()?;

        // Check we are at the end of the expression
        if !self.is_at_end() {
            let message = if matches!(self.current_token(), Token::RightParen) {
                "unbalanced ')'"
            } else {
                "unexpected token after expression"
            };
            return Err(self.error_here(message));
        }

        Ok(expr)
    }

    //helpers
    fn current(&self) -> &Spanned {
        &self.tokens[self.position]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let current = self.current();
        Error::compile(message, current.token.text(), current.position)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.current_token(), Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while matches!(self.current_token(), Token::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        if matches!(self.current_token(), Token::LeftParen) {
            let open = self.current().position;
            self.advance();
            let inner = self.parse_or()?;
            if !matches!(self.current_token(), Token::RightParen) {
                let current = self.current();
                return Err(Error::compile(
                    format!("expected ')' to close '(' at position {open}"),
                    current.token.text(),
                    current.position,
                ));
            }
            self.advance();
            return Ok(inner);
        }

        let left = self.consume_operand()?;
        let position = self.current().position;
        let op = self.consume_operator()?;
        let right = self.consume_operand()?;
        Ok(Expr::Comparison {
            left,
            op,
            right,
            position,
        })
    }

    fn consume_operand(&mut self) -> Result<Operand> {
        let current = self.current();
        let operand = match &current.token {
            Token::Word(text) => Operand {
                text: text.clone(),
                quoted: false,
                position: current.position,
            },
            Token::Quoted(text) => Operand {
                text: text.clone(),
                quoted: true,
                position: current.position,
            },
            _ => return Err(self.error_here("expected a column name or a literal")),
        };
        self.advance();
        Ok(operand)
    }

    fn consume_operator(&mut self) -> Result<ComparisonOp> {
        let op = match self.current_token() {
            Token::Equal => ComparisonOp::Eq,
            Token::NotEqual => ComparisonOp::NotEq,
            Token::Greater => ComparisonOp::Gt,
            Token::GreaterEqual => ComparisonOp::GtEq,
            Token::Lower => ComparisonOp::Lt,
            Token::LowerEqual => ComparisonOp::LtEq,
            Token::Match => ComparisonOp::Match,
            _ => return Err(self.error_here("expected a comparison operator")),
        };
        self.advance();
        Ok(op)
    }
}
