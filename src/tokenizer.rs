use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- Keywords (case-sensitive) ---
    And,
    Or,

    // --- Operands ---
    /// An unquoted word: a column name or a literal such as `42`, `2021-05-01`, `true`.
    Word(String),
    /// A literal or column name between single or double quotes (e.g. `'Alice'`).
    Quoted(String),

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Lower,
    /// `<=`
    LowerEqual,
    /// `~=`, regular-expression match
    Match,

    // --- Special ---
    /// Represents the end of input.
    Eof,
}

impl Token {
    /// Source-like rendering used in error messages.
    pub fn text(&self) -> String {
        match self {
            Self::And => "AND".into(),
            Self::Or => "OR".into(),
            Self::Word(w) => w.clone(),
            Self::Quoted(q) => format!("'{q}'"),
            Self::LeftParen => "(".into(),
            Self::RightParen => ")".into(),
            Self::Equal => "=".into(),
            Self::NotEqual => "!=".into(),
            Self::Greater => ">".into(),
            Self::GreaterEqual => ">=".into(),
            Self::Lower => "<".into(),
            Self::LowerEqual => "<=".into(),
            Self::Match => "~=".into(),
            Self::Eof => "end of input".into(),
        }
    }
}

/// A token with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// A lexical scanner that converts a filter expression into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens ending with [Token::Eof].
    ///
    /// # Errors
    /// Returns a compile error naming the offending character if an unsupported character
    /// is met or a quoted literal is not terminated.
    ///
    /// # Example
    /// ```
    /// # use colframe::tokenizer::{Tokenizer, Token};
    /// let tokens = Tokenizer::new("age >= 18").tokenize().unwrap();
    /// assert_eq!(tokens[1].token, Token::GreaterEqual);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let position = self.position;
            let token = self.next_token()?;
            tokens.push(Spanned { token, position });
        }

        tokens.push(Spanned {
            token: Token::Eof,
            position: self.input.len(),
        });
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '(' => {
                self.advance();
                Ok(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RightParen)
            }
            '=' => {
                self.advance();
                Ok(Token::Equal)
            }
            '>' => Ok(self.with_optional_equal(Token::Greater, Token::GreaterEqual)),
            '<' => Ok(self.with_optional_equal(Token::Lower, Token::LowerEqual)),
            '!' | '~' => {
                let start = self.position;
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    return Ok(if ch == '!' { Token::NotEqual } else { Token::Match });
                }
                Err(Error::compile(
                    format!("{ch:?} must be followed by '='"),
                    ch.to_string(),
                    start,
                ))
            }
            '\'' | '"' => self.read_quoted(ch),
            _ => Ok(self.read_word()),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn with_optional_equal(&mut self, bare: Token, with_equal: Token) -> Token {
        self.advance();
        if !self.is_at_end() && self.current_char() == '=' {
            self.advance();
            return with_equal;
        }
        bare
    }

    // --- Extraction Logic ---

    /// Reads an unquoted word up to whitespace, a parenthesis, an operator or a quote.
    /// `AND` and `OR` are keywords only in upper case.
    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while !self.is_at_end() && !is_delimiter(self.current_char()) {
            word.push(self.current_char());
            self.advance();
        }

        match word.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            _ => Token::Word(word),
        }
    }

    /// Reads a literal enclosed in `quote`. The quote character may be doubled inside the
    /// literal to stand for itself (`'O''Brien'`).
    fn read_quoted(&mut self, quote: char) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        loop {
            if self.is_at_end() {
                return Err(Error::compile(
                    "unterminated quoted literal",
                    format!("{quote}{string}"),
                    start,
                ));
            }
            let ch = self.current_char();
            self.advance();
            if ch != quote {
                string.push(ch);
                continue;
            }
            if !self.is_at_end() && self.current_char() == quote {
                string.push(quote);
                self.advance();
                continue;
            }
            break;
        }

        Ok(Token::Quoted(string))
    }
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '=' | '!' | '<' | '>' | '~' | '\'' | '"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Tokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            tokens("age > 18"),
            vec![
                Token::Word("age".into()),
                Token::Greater,
                Token::Word("18".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            tokens("= != > >= < <= ~="),
            vec![
                Token::Equal,
                Token::NotEqual,
                Token::Greater,
                Token::GreaterEqual,
                Token::Lower,
                Token::LowerEqual,
                Token::Match,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_without_spaces() {
        assert_eq!(
            tokens("(a>=1)AND(b!='x')"),
            vec![
                Token::LeftParen,
                Token::Word("a".into()),
                Token::GreaterEqual,
                Token::Word("1".into()),
                Token::RightParen,
                Token::And,
                Token::LeftParen,
                Token::Word("b".into()),
                Token::NotEqual,
                Token::Quoted("x".into()),
                Token::RightParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            tokens("and OR or AND"),
            vec![
                Token::Word("and".into()),
                Token::Or,
                Token::Word("or".into()),
                Token::And,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(
            tokens(r#"'Bob Dylan' "first name" '' 'O''Brien'"#),
            vec![
                Token::Quoted("Bob Dylan".into()),
                Token::Quoted("first name".into()),
                Token::Quoted(String::new()),
                Token::Quoted("O'Brien".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let spanned = Tokenizer::new("x <= -1.5").tokenize().unwrap();
        let positions: Vec<usize> = spanned.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 2, 5, 9]);
        assert_eq!(spanned[2].token, Token::Word("-1.5".into()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Tokenizer::new("name = 'hello").tokenize().unwrap_err();
        assert!(matches!(err, Error::Compile { position: 7, .. }));
    }

    #[test]
    fn test_lone_bang() {
        let err = Tokenizer::new("a ! b").tokenize().unwrap_err();
        assert!(matches!(err, Error::Compile { position: 2, ref token, .. } if token == "!"));
    }
}
