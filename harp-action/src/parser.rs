//! Recursive-descent parser for the action DSL grammar (§4.5).

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{self, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub fn parse(src: &str) -> Result<ActionAst, SyntaxError> {
    let tokens = lexer::lex(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_action_list()
}

impl Parser {
    fn peek(&self, ahead: usize) -> &Token {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, SyntaxError> {
        if std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        SyntaxError::new(self.current().offset, format!("expected {what}, found {:?}", self.current().kind))
    }

    fn expect_name(&mut self) -> Result<NameLit, SyntaxError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Name(text) => {
                self.advance();
                Ok(NameLit { text, offset: tok.offset })
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn parse_action_list(&mut self) -> Result<ActionAst, SyntaxError> {
        let mut statements = Vec::new();
        if !matches!(self.current().kind, TokenKind::End) {
            statements.push(self.parse_statement()?);
            while matches!(self.current().kind, TokenKind::Semicolon) {
                self.advance();
                if matches!(self.current().kind, TokenKind::End) {
                    break; // trailing semicolon
                }
                statements.push(self.parse_statement()?);
            }
        }
        self.expect(&TokenKind::End, "end of input")?;
        Ok(ActionAst { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        let var = self.expect_name()?;
        match &self.current().kind {
            TokenKind::LParen => self.parse_function_call(var),
            TokenKind::In | TokenKind::Not => self.parse_membership_test(var),
            TokenKind::BitMaskAny | TokenKind::BitMaskNone => self.parse_bit_mask_test(var),
            TokenKind::Eq | TokenKind::Ne | TokenKind::Lt | TokenKind::Le | TokenKind::Gt | TokenKind::Ge => {
                self.parse_comparison(var)
            }
            _ => Err(self.unexpected("'(', a comparison operator, 'in', 'not in', or a bit-mask operator")),
        }
    }

    fn parse_function_call(&mut self, name: NameLit) -> Result<Statement, SyntaxError> {
        self.advance(); // '('
        let mut args = Vec::new();
        if !matches!(self.current().kind, TokenKind::RParen) {
            args.push(self.parse_argument()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                args.push(self.parse_argument()?);
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(Statement::FunctionCall { name, args })
    }

    fn parse_argument(&mut self) -> Result<Argument, SyntaxError> {
        match self.current().kind.clone() {
            TokenKind::String(value) => {
                let offset = self.advance().offset;
                Ok(Argument::String(StringLit { value, offset }))
            }
            TokenKind::Number(value) => {
                let offset = self.advance().offset;
                let unit = self.parse_optional_unit();
                Ok(Argument::Quantity(NumberLit { value, offset }, unit))
            }
            TokenKind::Name(_) => Ok(Argument::QualifiedName(self.parse_qualified_name()?)),
            _ => Err(self.unexpected("a string, identifier, or number")),
        }
    }

    fn parse_qualified_name(&mut self) -> Result<QualifiedName, SyntaxError> {
        let name = self.expect_name()?;
        let dims = if matches!(self.current().kind, TokenKind::LBrace) {
            self.advance();
            let mut names = vec![self.expect_name()?];
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                names.push(self.expect_name()?);
            }
            self.expect(&TokenKind::RBrace, "'}'")?;
            Some(names)
        } else {
            None
        };
        let unit = self.parse_optional_unit();
        Ok(QualifiedName { name, dims, unit })
    }

    fn parse_optional_unit(&mut self) -> Option<UnitLit> {
        if let TokenKind::Unit(text) = self.current().kind.clone() {
            let offset = self.advance().offset;
            Some(UnitLit { text, offset })
        } else {
            None
        }
    }

    fn parse_membership_test(&mut self, var: NameLit) -> Result<Statement, SyntaxError> {
        let op = match self.current().kind {
            TokenKind::In => {
                self.advance();
                MembershipOp::In
            }
            TokenKind::Not => {
                self.advance();
                self.expect(&TokenKind::In, "'in' after 'not'")?;
                MembershipOp::NotIn
            }
            _ => return Err(self.unexpected("'in' or 'not in'")),
        };
        self.expect(&TokenKind::LParen, "'(' to start a membership list")?;
        let mut literals = vec![self.parse_literal()?];
        while matches!(self.current().kind, TokenKind::Comma) {
            self.advance();
            literals.push(self.parse_literal()?);
        }
        self.expect(&TokenKind::RParen, "')'")?;
        let unit = self.parse_optional_unit();
        Ok(Statement::MembershipTest { var, op, literals, unit })
    }

    fn parse_literal(&mut self) -> Result<Literal, SyntaxError> {
        match self.current().kind.clone() {
            TokenKind::Number(value) => {
                let offset = self.advance().offset;
                Ok(Literal::Number(NumberLit { value, offset }))
            }
            TokenKind::String(value) => {
                let offset = self.advance().offset;
                Ok(Literal::String(StringLit { value, offset }))
            }
            _ => Err(self.unexpected("a number or string literal")),
        }
    }

    fn parse_bit_mask_test(&mut self, var: NameLit) -> Result<Statement, SyntaxError> {
        let op = match self.current().kind {
            TokenKind::BitMaskAny => BitMaskOp::AllBitsSet,
            TokenKind::BitMaskNone => BitMaskOp::NoBitSet,
            _ => unreachable!("caller already matched a bit-mask operator"),
        };
        self.advance();
        let mask = match self.current().kind.clone() {
            TokenKind::Number(value) => {
                let offset = self.advance().offset;
                NumberLit { value, offset }
            }
            _ => return Err(self.unexpected("a numeric bit mask")),
        };
        Ok(Statement::BitMaskTest { var, op, mask })
    }

    fn parse_comparison(&mut self, var: NameLit) -> Result<Statement, SyntaxError> {
        let op = match self.current().kind {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Ge => CompareOp::Ge,
            _ => unreachable!("caller already matched a comparison operator"),
        };
        self.advance();
        let rhs = match self.current().kind.clone() {
            TokenKind::String(value) => {
                let offset = self.advance().offset;
                ComparisonRhs::String(StringLit { value, offset })
            }
            TokenKind::Number(value) => {
                let offset = self.advance().offset;
                let unit = self.parse_optional_unit();
                ComparisonRhs::Quantity(NumberLit { value, offset }, unit)
            }
            TokenKind::Name(_) => ComparisonRhs::QualifiedName(self.parse_qualified_name()?),
            _ => return Err(self.unexpected("a string, identifier, or number")),
        };
        Ok(Statement::Comparison { var, op, rhs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comparison_with_unit() {
        let ast = parse("temperature >= 265 [K]").unwrap();
        assert_eq!(ast.statements.len(), 1);
        match &ast.statements[0] {
            Statement::Comparison { var, op, rhs } => {
                assert_eq!(var.text, "temperature");
                assert_eq!(*op, CompareOp::Ge);
                assert!(matches!(rhs, ComparisonRhs::Quantity(n, Some(u)) if n.value == 265.0 && u.text == "K"));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn parses_function_call_with_multiple_names() {
        let ast = parse("include(pressure, temperature)").unwrap();
        match &ast.statements[0] {
            Statement::FunctionCall { name, args } => {
                assert_eq!(name.text, "include");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn parses_trailing_semicolon() {
        let ast = parse("a = 1;").unwrap();
        assert_eq!(ast.statements.len(), 1);
    }

    #[test]
    fn parses_membership_with_not_in_and_unit() {
        let ast = parse("wind_direction not in (350, 15) [deg]").unwrap();
        match &ast.statements[0] {
            Statement::MembershipTest { op, literals, unit, .. } => {
                assert_eq!(*op, MembershipOp::NotIn);
                assert_eq!(literals.len(), 2);
                assert_eq!(unit.as_ref().unwrap().text, "deg");
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn parses_bit_mask_test() {
        let ast = parse("flags all-bits-in-mask-set 3").unwrap();
        assert!(matches!(
            &ast.statements[0],
            Statement::BitMaskTest { op: BitMaskOp::AllBitsSet, mask, .. } if mask.value == 3.0
        ));
    }

    #[test]
    fn parses_derive_call_with_dims() {
        let ast = parse("derive(number_density {time, vertical} [molec/cm3])").unwrap();
        match &ast.statements[0] {
            Statement::FunctionCall { name, args } => {
                assert_eq!(name.text, "derive");
                match &args[0] {
                    Argument::QualifiedName(q) => {
                        assert_eq!(q.name.text, "number_density");
                        assert_eq!(q.dims.as_ref().unwrap().iter().map(|n| n.text.as_str()).collect::<Vec<_>>(), vec!["time", "vertical"]);
                        assert_eq!(q.unit.as_ref().unwrap().text, "molec/cm3");
                    }
                    other => panic!("unexpected argument {other:?}"),
                }
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn malformed_prefix_reports_offset_near_failure() {
        let err = parse("temperature >= ").unwrap_err();
        assert!(err.offset >= 12);
    }

    #[test]
    fn sequential_statements_split_on_semicolon() {
        let ast = parse("temperature >= 265 [K]; include(pressure, temperature)").unwrap();
        assert_eq!(ast.statements.len(), 2);
    }
}
