use crate::{ExprTree, OpKind};
use point42_core::EngineError;

/// Parses a constrained infix expression string into an [`ExprTree`].
///
/// The grammar accepted is the familiar one: `+ -` bind looser than `* /`,
/// both left-associative, with parenthesized grouping. Only non-negative
/// decimal integer literals are accepted — no unary sign, no floats, no
/// exponentiation. The input is assumed already normalized by the caller
/// (whitespace and typographic substitutions stripped); this parser does
/// not itself tolerate stray whitespace.
pub fn parse(input: &str) -> Result<ExprTree, EngineError> {
    if input.is_empty() {
        return Err(EngineError::Syntax("empty input".into()));
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let tree = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(EngineError::Syntax("trailing input after expression".into()));
    }
    Ok(tree)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(i64),
    Op(OpKind),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EngineError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    return Err(EngineError::Syntax("floating-point literals are not allowed".into()));
                }
                let digits: String = chars[start..i].iter().collect();
                let n: i64 = digits
                    .parse()
                    .map_err(|_| EngineError::Syntax(format!("literal too large: {digits}")))?;
                tokens.push(Token::Num(n));
                continue;
            }
            '+' => {
                tokens.push(Token::Op(OpKind::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(OpKind::Sub));
                i += 1;
            }
            '*' => {
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    return Err(EngineError::Syntax("exponentiation is not allowed".into()));
                }
                tokens.push(Token::Op(OpKind::Mul));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Op(OpKind::Div));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => {
                return Err(EngineError::Syntax(format!("unexpected character {other:?}")));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<ExprTree, EngineError> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Op(kind @ (OpKind::Add | OpKind::Sub))) => {
                    let kind = *kind;
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = ExprTree::new_op(kind, lhs, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<ExprTree, EngineError> {
        let mut lhs = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Op(kind @ (OpKind::Mul | OpKind::Div))) => {
                    let kind = *kind;
                    self.advance();
                    let rhs = self.parse_factor()?;
                    lhs = ExprTree::new_op(kind, lhs, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // factor := NUM | '(' expr ')'
    fn parse_factor(&mut self) -> Result<ExprTree, EngineError> {
        match self.advance() {
            Some(Token::Num(n)) => ExprTree::new_num(*n),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(EngineError::Syntax("unbalanced parentheses".into())),
                }
            }
            Some(Token::Op(OpKind::Sub)) => {
                Err(EngineError::Syntax("unary minus is not allowed".into()))
            }
            Some(Token::Op(OpKind::Add)) => {
                Err(EngineError::Syntax("unary plus is not allowed".into()))
            }
            Some(Token::Op(_)) => Err(EngineError::Syntax("unexpected operator".into())),
            Some(Token::RParen) => Err(EngineError::Syntax("unbalanced parentheses".into())),
            None => Err(EngineError::Syntax("unexpected end of input".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_string() {
        assert!(matches!(parse(""), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_trailing_operator() {
        assert!(matches!(parse("1+"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(matches!(parse("1+("), Err(EngineError::Syntax(_))));
        assert!(matches!(parse("(1+2"), Err(EngineError::Syntax(_))));
        assert!(matches!(parse("1+2)"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_unary_sign() {
        assert!(matches!(parse("-1+3"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_exponentiation() {
        assert!(matches!(parse("1**3"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_float_literal() {
        assert!(matches!(parse("1+3.0"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        assert!(matches!(parse("1/0"), Err(EngineError::DivByZero)));
    }

    #[test]
    fn rejects_non_arithmetic_characters() {
        assert!(matches!(parse("___123456___"), Err(EngineError::Syntax(_))));
    }

    #[test]
    fn rejects_literal_out_of_range() {
        assert!(matches!(parse("99+1"), Err(EngineError::BadLiteral(99))));
    }

    #[test]
    fn respects_precedence_and_associativity() {
        let tree = parse("6*7+12-3*4").unwrap();
        assert_eq!(tree.value().key(), "30");
    }

    #[test]
    fn respects_parenthesized_grouping() {
        let tree = parse("6*7+(12-3*4)").unwrap();
        assert_eq!(tree.value().key(), "42");
    }

    #[test]
    fn round_trips_through_pretty() {
        let tree = parse("(12+6/3)*(7-4)").unwrap();
        let reparsed = parse(&tree.pretty()).unwrap();
        assert_eq!(tree.canonical_key(), reparsed.canonical_key());
    }
}
