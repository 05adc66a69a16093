//! Recursive-descent parser for predicate expressions.
//!
//! ```text
//! Or      := And { '-o' And }
//! And     := Expr { ['-a'] Expr }
//! Expr    := '(' Or ')' | '!' Expr | Primary
//! Primary := OPERAND_NAME { OPERAND_VALUE }
//! ```
//!
//! Tokens are never mutated. A [`Cursor`] holds the slice plus an index;
//! backtracking saves and restores that index.

use crate::ast::{And, Expr, Or, Primary};
use crate::error::FindError;
use crate::registry::PredicateRegistry;
use crate::token::{Token, TokenKind};

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Non-destructive read position over a fixed token sequence.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next_is(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn restore(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn found(&self) -> String {
        self.peek().map(Token::source_text).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parses token sequences against a registry. Operand names are resolved
/// as each [`Primary`] is built, so an unknown predicate fails the parse.
pub struct Parser<'r> {
    registry: &'r PredicateRegistry,
}

/// Parse a whole expression. Every token must be consumed.
pub fn parse(tokens: &[Token], registry: &PredicateRegistry) -> Result<Or, FindError> {
    let parser = Parser::new(registry);
    let mut cursor = Cursor::new(tokens);
    let tree = parser.parse_or(&mut cursor)?;
    if let Some(token) = cursor.peek() {
        return Err(FindError::TrailingTokens {
            token: token.source_text(),
        });
    }
    Ok(tree)
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r PredicateRegistry) -> Self {
        Self { registry }
    }

    /// `Primary := OPERAND_NAME { OPERAND_VALUE }`
    pub fn parse_primary(&self, cursor: &mut Cursor<'_>) -> Result<Primary, FindError> {
        let token = cursor.peek().ok_or(FindError::EmptyExpression)?;
        if token.kind != TokenKind::OperandName {
            return Err(FindError::UnexpectedToken {
                token: token.source_text(),
                expected: "a predicate such as -name",
            });
        }

        let mut values = Vec::new();
        let mut probe = *cursor;
        probe.advance();
        while let Some(value) = probe.peek().filter(|t| t.kind == TokenKind::OperandValue) {
            values.push(value.text.clone());
            probe.advance();
        }

        let primary = Primary {
            name: token.text.clone(),
            values,
        };
        self.resolve(&primary)?;
        *cursor = probe;
        Ok(primary)
    }

    /// `Expr := '(' Or ')' | '!' Expr | Primary`
    pub fn parse_expr(&self, cursor: &mut Cursor<'_>) -> Result<Expr, FindError> {
        let token = cursor.peek().ok_or(FindError::EmptyExpression)?;
        match token.kind {
            TokenKind::LParen => {
                let start = cursor.position();
                cursor.advance();
                let inner = match self.parse_or(cursor) {
                    Ok(inner) => inner,
                    Err(e) => {
                        cursor.restore(start);
                        return Err(match e {
                            FindError::EmptyExpression => FindError::UnbalancedParens {
                                token: String::new(),
                            },
                            e => e,
                        });
                    }
                };
                if !cursor.next_is(TokenKind::RParen) {
                    let token = cursor.found();
                    cursor.restore(start);
                    return Err(FindError::UnbalancedParens { token });
                }
                cursor.advance();
                Ok(Expr::Or(inner))
            }
            TokenKind::Not => {
                let start = cursor.position();
                cursor.advance();
                match self.parse_expr(cursor) {
                    Ok(inner) => Ok(Expr::not(inner)),
                    Err(FindError::EmptyExpression) => {
                        cursor.restore(start);
                        Err(FindError::UnexpectedToken {
                            token: String::new(),
                            expected: "an expression after !",
                        })
                    }
                    Err(e) => {
                        cursor.restore(start);
                        Err(e)
                    }
                }
            }
            _ => self.parse_primary(cursor).map(Expr::Primary),
        }
    }

    /// `And := Expr { ['-a'] Expr }`
    pub fn parse_and(&self, cursor: &mut Cursor<'_>) -> Result<And, FindError> {
        let mut children = vec![self.parse_expr(cursor)?];
        while let Some(expr) = self.try_parse_operand(cursor)? {
            children.push(expr);
        }
        Ok(And(children))
    }

    /// Speculatively parse one more conjunction operand.
    ///
    /// `Ok(None)` means no operand starts here; the cursor is then exactly
    /// where it was, including any `-a` that was looked at. An operand that
    /// starts but is malformed is a hard error.
    pub fn try_parse_operand(&self, cursor: &mut Cursor<'_>) -> Result<Option<Expr>, FindError> {
        let saved = cursor.position();
        if cursor.next_is(TokenKind::And) {
            cursor.advance();
        }
        if !cursor.peek().is_some_and(Token::starts_expression) {
            tracing::trace!(position = saved, "no further conjunction operand");
            cursor.restore(saved);
            return Ok(None);
        }
        match self.parse_expr(cursor) {
            Ok(expr) => Ok(Some(expr)),
            Err(e) => {
                cursor.restore(saved);
                Err(e)
            }
        }
    }

    /// `Or := And { '-o' And }`
    pub fn parse_or(&self, cursor: &mut Cursor<'_>) -> Result<Or, FindError> {
        let mut children = vec![self.parse_and(cursor)?];
        while cursor.next_is(TokenKind::Or) {
            cursor.advance();
            match self.parse_and(cursor) {
                Ok(and) => children.push(and),
                // An `-o` with nothing after it is a malformed operand, not an empty expression.
                Err(FindError::EmptyExpression) => {
                    return Err(FindError::UnexpectedToken {
                        token: String::new(),
                        expected: "an expression after -o",
                    })
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Or(children))
    }

    fn resolve(&self, primary: &Primary) -> Result<(), FindError> {
        let predicate = self
            .registry
            .lookup(&primary.name)
            .ok_or_else(|| FindError::UnknownPredicate(primary.name.clone()))?;
        predicate
            .check(&primary.values)
            .map_err(|message| FindError::InvalidArguments {
                predicate: primary.name.clone(),
                message,
            })
    }
}
