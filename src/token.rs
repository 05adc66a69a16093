/// The kind of an expression token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `-name`, `-type`, ... with the leading `-` stripped.
    OperandName,
    /// Any argument that is not an operator or operand name.
    OperandValue,
    LParen,
    RParen,
    Not,
    And,
    Or,
}

/// One expression argument, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }

    /// Whether an expression may begin with this token.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::LParen | TokenKind::Not | TokenKind::OperandName
        )
    }

    /// The argument as the user typed it, for error messages.
    pub fn source_text(&self) -> String {
        match self.kind {
            TokenKind::OperandName => format!("-{}", self.text),
            _ => self.text.clone(),
        }
    }
}

/// Classify every expression argument. Total: one token per argument.
pub fn tokenize<S: AsRef<str>>(args: &[S]) -> Vec<Token> {
    args.iter().map(|arg| classify(arg.as_ref())).collect()
}

fn classify(s: &str) -> Token {
    let kind = match s {
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "!" => TokenKind::Not,
        "-a" => TokenKind::And,
        "-o" => TokenKind::Or,
        _ => match s.strip_prefix('-') {
            Some(name) => return Token::new(TokenKind::OperandName, name),
            None => TokenKind::OperandValue,
        },
    };
    Token::new(kind, s)
}
