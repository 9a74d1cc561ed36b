//! Recursive-descent, precedence-climbing parser. Builds one `Program` AST
//! from a token stream, maintaining the typedef table and the enum constant
//! table that earlier declarations populate for later ones to consult.

use crate::ast::*;
use crate::token::{Token, TokenKind};
use crate::types::{parse_int_literal, EnumConstants, TypedefTable};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    typedefs: TypedefTable,
    enums: EnumConstants,
}

type PResult<T> = Result<T, String>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, typedefs: TypedefTable::new(), enums: EnumConstants::new() }
    }

    pub fn parse_program(mut self) -> PResult<Program> {
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            if self.check(TokenKind::Error) {
                let t = self.peek();
                return Err(format!("lexical error at line {}: {}", t.line, t.lexeme));
            }
            items.push(self.parse_top_level()?);
        }
        Ok(Program { items })
    }

    // ---------- token stream plumbing ----------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_tok(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let t = self.peek();
            Err(format!("expected {:?}, got {:?} at line {}", kind, t.kind, t.line))
        }
    }

    // ---------- type recognition ----------

    fn is_qualifier_start(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.peek().kind,
            Static | Extern | Volatile | Const | Unsigned | Signed | Register | Inline | Packed
        )
    }

    fn consume_qualifiers(&mut self) -> DeclFlags {
        use TokenKind::*;
        let mut flags = DeclFlags::default();
        loop {
            match self.peek().kind {
                Static => flags.is_static = true,
                Extern => flags.is_extern = true,
                Volatile => flags.is_volatile = true,
                Const => flags.is_const = true,
                Unsigned => flags.is_unsigned = true,
                Signed => {}
                Register => flags.is_register = true,
                Inline => flags.is_inline = true,
                Packed => flags.is_packed = true,
                _ => break,
            }
            self.advance();
        }
        flags
    }

    fn is_type_start(&self) -> bool {
        use TokenKind::*;
        match self.peek().kind {
            Int | CharKw | Void | Struct | Long | Short | Unsigned | Signed | Const | Volatile
            | Static | Extern | Register | Inline | Packed => true,
            Identifier => self.typedefs.contains(&self.peek().lexeme),
            _ => false,
        }
    }

    /// Consumes a type name (after qualifiers), returning its normalized
    /// string and the pointer level it itself carries (nonzero only for a
    /// typedef alias that was declared with pointer stars).
    fn parse_type_name(&mut self) -> PResult<(String, u32)> {
        if self.check(TokenKind::Struct) {
            self.advance();
            let name = self.expect(TokenKind::Identifier)?.lexeme;
            return Ok((format!("struct {name}"), 0));
        }

        if self.check(TokenKind::Identifier) {
            let word = self.peek().lexeme.clone();
            if let Some(entry) = self.typedefs.get(&word) {
                let underlying = entry.underlying.clone();
                let ptr = entry.pointer_level;
                self.advance();
                return Ok((underlying, ptr));
            }
        }

        let tok = self.advance();
        Ok((tok.lexeme, 0))
    }

    fn parse_pointer_stars(&mut self) -> u32 {
        let mut n = 0;
        while self.match_tok(TokenKind::Star) {
            n += 1;
        }
        n
    }

    // ---------- top level ----------

    fn parse_top_level(&mut self) -> PResult<TopLevel> {
        match self.peek().kind {
            TokenKind::Struct => Ok(TopLevel::StructDecl(self.parse_struct_decl()?)),
            TokenKind::Typedef => Ok(TopLevel::Typedef(self.parse_typedef()?)),
            TokenKind::Enum => Ok(TopLevel::EnumDecl(self.parse_enum_decl()?)),
            _ => {
                if self.looks_like_function() {
                    Ok(TopLevel::Function(self.parse_function()?))
                } else {
                    Ok(TopLevel::GlobalDecl(self.parse_declaration()?))
                }
            }
        }
    }

    fn looks_like_function(&self) -> bool {
        let saved = self.pos;
        let mut probe = Parser {
            tokens: self.tokens.clone(),
            pos: saved,
            typedefs: self.typedefs.clone(),
            enums: self.enums.clone(),
        };
        probe.consume_qualifiers();
        if probe.is_type_start() {
            let _ = probe.parse_type_name();
        } else {
            probe.advance();
        }
        probe.parse_pointer_stars();
        probe.check(TokenKind::Identifier) && probe.peek_ahead(1).kind == TokenKind::LParen
    }

    fn parse_struct_decl(&mut self) -> PResult<StructDecl> {
        self.expect(TokenKind::Struct)?;
        let name = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };

        if self.match_tok(TokenKind::Semicolon) {
            return Ok(StructDecl { name, members: Vec::new() });
        }

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) {
            members.push(self.parse_declaration()?);
        }
        self.expect(TokenKind::RBrace)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(StructDecl { name, members })
    }

    fn parse_typedef(&mut self) -> PResult<TypedefDecl> {
        self.expect(TokenKind::Typedef)?;

        if self.check(TokenKind::Struct) {
            self.advance();
            if self.check(TokenKind::LBrace) {
                self.advance();
                let mut members = Vec::new();
                while !self.check(TokenKind::RBrace) {
                    members.push(self.parse_declaration()?);
                }
                self.expect(TokenKind::RBrace)?;
                let alias = self.expect(TokenKind::Identifier)?.lexeme;
                self.expect(TokenKind::Semicolon)?;
                // An anonymous struct typedef still needs a name to key the
                // struct layout table by; the codegen registers it under the
                // alias itself, using the members carried here.
                let decl = TypedefDecl {
                    underlying: format!("struct {alias}"),
                    pointer_level: 0,
                    alias: alias.clone(),
                    members,
                };
                self.typedefs.insert(decl.alias.clone(), decl.underlying.clone(), 0);
                return Ok(decl);
            }

            let old_name = self.expect(TokenKind::Identifier)?.lexeme;
            let alias = self.expect(TokenKind::Identifier)?.lexeme;
            self.expect(TokenKind::Semicolon)?;
            let underlying = format!("struct {old_name}");
            self.typedefs.insert(alias.clone(), underlying.clone(), 0);
            return Ok(TypedefDecl { underlying, pointer_level: 0, alias, members: Vec::new() });
        }

        self.consume_qualifiers();
        let (underlying, base_ptr) = self.parse_type_name()?;
        let ptr = base_ptr + self.parse_pointer_stars();
        let alias = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::Semicolon)?;
        self.typedefs.insert(alias.clone(), underlying.clone(), ptr);
        Ok(TypedefDecl { underlying, pointer_level: ptr, alias, members: Vec::new() })
    }

    fn parse_enum_decl(&mut self) -> PResult<EnumDecl> {
        self.expect(TokenKind::Enum)?;
        let name = if self.check(TokenKind::Identifier) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        let mut next_value: i32 = 0;
        while !self.check(TokenKind::RBrace) {
            let member_name = self.expect(TokenKind::Identifier)?.lexeme;
            let value_expr = if self.match_tok(TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };

            let resolved = match &value_expr {
                Some(expr) => self.fold_const_i32(expr)?,
                None => next_value,
            };
            self.enums.insert(member_name.clone(), resolved);
            next_value = resolved + 1;

            members.push(EnumMember { name: member_name, value: value_expr });

            if !self.check(TokenKind::RBrace) {
                self.expect(TokenKind::Comma)?;
            } else {
                self.match_tok(TokenKind::Comma);
            }
        }
        self.expect(TokenKind::RBrace)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(EnumDecl { name, members })
    }

    fn fold_const_i32(&self, expr: &Expr) -> PResult<i32> {
        match expr {
            Expr::IntLit(v) => Ok(*v as i32),
            Expr::Unary { op: TokenKind::Minus, operand } => Ok(-self.fold_const_i32(operand)?),
            Expr::Ident(name) => self
                .enums
                .get(name)
                .ok_or_else(|| format!("'{name}' is not a constant expression")),
            _ => Err("enum initializer must be a constant expression".to_string()),
        }
    }

    fn parse_function(&mut self) -> PResult<Function> {
        let flags = self.consume_qualifiers();
        let (return_type, base_ptr) = self.parse_type_name()?;
        let return_pointer_level = base_ptr + self.parse_pointer_stars();
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                self.consume_qualifiers();
                let (ptype, pbase) = self.parse_type_name()?;
                let pptr = pbase + self.parse_pointer_stars();
                let pname = if self.check(TokenKind::Identifier) {
                    self.advance().lexeme
                } else {
                    String::new()
                };
                let array_size = if self.match_tok(TokenKind::LBracket) {
                    let size = if !self.check(TokenKind::RBracket) {
                        Some(Box::new(self.parse_expression()?))
                    } else {
                        None
                    };
                    self.expect(TokenKind::RBracket)?;
                    size
                } else {
                    None
                };
                params.push(Decl {
                    type_name: ptype,
                    name: pname,
                    pointer_level: pptr,
                    init: None,
                    array_size,
                    flags: DeclFlags::default(),
                });
                if !self.match_tok(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        if self.match_tok(TokenKind::Semicolon) {
            return Ok(Function { return_type, return_pointer_level, name, params, body: None, flags });
        }

        let body = Box::new(self.parse_block()?);
        Ok(Function { return_type, return_pointer_level, name, params, body: Some(body), flags })
    }

    // ---------- declarations / statements ----------

    fn parse_declaration(&mut self) -> PResult<Decl> {
        let flags = self.consume_qualifiers();
        let (type_name, base_ptr) = self.parse_type_name()?;
        let pointer_level = base_ptr + self.parse_pointer_stars();
        let name = self.expect(TokenKind::Identifier)?.lexeme;

        let array_size = if self.match_tok(TokenKind::LBracket) {
            let size = if !self.check(TokenKind::RBracket) {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect(TokenKind::RBracket)?;
            size
        } else {
            None
        };

        let init = if self.match_tok(TokenKind::Assign) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(TokenKind::Semicolon)?;
        Ok(Decl { type_name, name, pointer_level, init, array_size, flags })
    }

    fn parse_block(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Block(stmts))
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        use TokenKind::*;
        match self.peek().kind {
            LBrace => self.parse_block(),
            If => self.parse_if(),
            While => self.parse_while(),
            For => self.parse_for(),
            Return => self.parse_return(),
            Break => {
                self.advance();
                self.expect(Semicolon)?;
                Ok(Stmt::Break)
            }
            Continue => {
                self.advance();
                self.expect(Semicolon)?;
                Ok(Stmt::Continue)
            }
            Asm => self.parse_asm(),
            _ if self.is_type_start() => Ok(Stmt::Decl(self.parse_declaration()?)),
            _ => {
                let expr = self.parse_expression()?;
                self.expect(Semicolon)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_tok(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else if self.is_type_start() {
            Some(Box::new(Stmt::Decl(self.parse_declaration()?)))
        } else {
            let e = self.parse_expression()?;
            self.expect(TokenKind::Semicolon)?;
            Some(Box::new(Stmt::Expr(e)))
        };

        let cond = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        let step = if !self.check(TokenKind::RParen) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For { init, cond, step, body })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Return)?;
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(value))
    }

    fn parse_asm(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Asm)?;
        self.match_tok(TokenKind::Volatile);
        self.expect(TokenKind::LParen)?;
        let body = self.expect(TokenKind::StringLit)?.lexeme;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Asm(body))
    }

    // ---------- expressions ----------

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let left = self.parse_ternary()?;
        use TokenKind::*;
        let op = self.peek().kind;
        if matches!(op, Assign | PlusAssign | MinusAssign | StarAssign | SlashAssign) {
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign { op, target: Box::new(left), value: Box::new(value) });
        }
        Ok(left)
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let cond = self.parse_logical_or()?;
        if self.match_tok(TokenKind::Question) {
            let then_expr = self.parse_expression()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            });
        }
        Ok(cond)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_logical_and, &[TokenKind::OrOr])
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_bitwise_or, &[TokenKind::AndAnd])
    }

    fn parse_bitwise_or(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_bitwise_xor, &[TokenKind::Pipe])
    }

    fn parse_bitwise_xor(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_bitwise_and, &[TokenKind::Caret])
    }

    fn parse_bitwise_and(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_equality, &[TokenKind::Ampersand])
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_relational, &[TokenKind::Equal, TokenKind::NotEqual])
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(
            Self::parse_shift,
            &[TokenKind::Less, TokenKind::Greater, TokenKind::LessEqual, TokenKind::GreaterEqual],
        )
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_additive, &[TokenKind::LShift, TokenKind::RShift])
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_multiplicative, &[TokenKind::Plus, TokenKind::Minus])
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        self.parse_left_assoc(Self::parse_unary, &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent])
    }

    fn parse_left_assoc(
        &mut self,
        mut next: impl FnMut(&mut Self) -> PResult<Expr>,
        ops: &[TokenKind],
    ) -> PResult<Expr> {
        let mut left = next(self)?;
        while ops.contains(&self.peek().kind) {
            let op = self.advance().kind;
            let right = next(self)?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        use TokenKind::*;
        let op = self.peek().kind;
        if matches!(op, PlusPlus | MinusMinus) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::IncDec { op, kind: IncDec::Prefix, operand: Box::new(operand) });
        }
        if matches!(op, Ampersand | Star | Plus | Minus | Tilde | Exclaim) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment()?);
                            if !self.match_tok(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    let name = match expr {
                        Expr::Ident(n) => n,
                        _ => return Err("function pointer calls are not supported".to_string()),
                    };
                    expr = Expr::Call { name, args };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::ArrayAccess { array: Box::new(expr), index: Box::new(index) };
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let is_arrow = self.peek().kind == TokenKind::Arrow;
                    self.advance();
                    let member = self.expect(TokenKind::Identifier)?.lexeme;
                    expr = Expr::MemberAccess { object: Box::new(expr), member, is_arrow };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = self.advance().kind;
                    expr = Expr::IncDec { op, kind: IncDec::Postfix, operand: Box::new(expr) };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::IntLit(parse_int_literal(&t.lexeme)))
            }
            TokenKind::StringLit => {
                self.advance();
                Ok(Expr::StringLit(t.lexeme))
            }
            TokenKind::CharLit => {
                self.advance();
                Ok(Expr::CharLit(char_literal_value(&t.lexeme)))
            }
            TokenKind::Identifier => {
                self.advance();
                if let Some(v) = self.enums.get(&t.lexeme) {
                    Ok(Expr::IntLit(v as i64))
                } else {
                    Ok(Expr::Ident(t.lexeme))
                }
            }
            TokenKind::LParen => {
                self.advance();
                if self.is_type_start() {
                    let saved = self.pos;
                    let (type_name, base_ptr) = self.parse_type_name()?;
                    let ptr = base_ptr + self.parse_pointer_stars();
                    if self.check(TokenKind::RParen) {
                        self.advance();
                        let expr = self.parse_unary()?;
                        return Ok(Expr::Cast { type_name, pointer_level: ptr, expr: Box::new(expr) });
                    }
                    self.pos = saved;
                }
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Sizeof => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                if self.is_type_start() {
                    let (type_name, base_ptr) = self.parse_type_name()?;
                    let ptr = base_ptr + self.parse_pointer_stars();
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expr::Sizeof(SizeofArg::Type { name: type_name, pointer_level: ptr }));
                }
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Sizeof(SizeofArg::Expr(Box::new(expr))))
            }
            other => Err(format!("unexpected token {:?} at line {}", other, t.line)),
        }
    }
}

fn char_literal_value(body: &str) -> u8 {
    let bytes = body.as_bytes();
    if bytes.first() == Some(&b'\\') && bytes.len() > 1 {
        match bytes[1] {
            b'n' => b'\n',
            b't' => b'\t',
            b'0' => 0,
            b'\\' => b'\\',
            b'\'' => b'\'',
            other => other,
        }
    } else {
        *bytes.first().unwrap_or(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize_all();
        Parser::new(tokens).parse_program().unwrap()
    }

    #[test]
    fn parses_minimal_main() {
        let prog = parse("int main(){return 42;}");
        assert_eq!(prog.items.len(), 1);
        match &prog.items[0] {
            TopLevel::Function(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.return_type, "int");
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn distinguishes_postfix_and_prefix_incdec() {
        let prog = parse("int f(){int i; i++; ++i; return i;}");
        let TopLevel::Function(f) = &prog.items[0] else { panic!() };
        let Stmt::Block(stmts) = f.body.as_deref().unwrap() else { panic!() };
        let Stmt::Expr(Expr::IncDec { kind: k1, .. }) = &stmts[1] else { panic!() };
        let Stmt::Expr(Expr::IncDec { kind: k2, .. }) = &stmts[2] else { panic!() };
        assert_eq!(*k1, IncDec::Postfix);
        assert_eq!(*k2, IncDec::Prefix);
    }

    #[test]
    fn typedef_pointer_level_propagates() {
        let prog = parse("typedef int* IntPtr; IntPtr* pp;");
        match &prog.items[1] {
            TopLevel::GlobalDecl(d) => assert_eq!(d.pointer_level, 2),
            _ => panic!("expected decl"),
        }
    }

    #[test]
    fn enum_members_auto_number_and_resolve() {
        let prog = parse("enum Color { RED, GREEN, BLUE }; int x = BLUE;");
        match &prog.items[1] {
            TopLevel::GlobalDecl(d) => assert_eq!(*d.init.as_deref().unwrap(), Expr::IntLit(2)),
            _ => panic!("expected decl"),
        }
    }

    #[test]
    fn explicit_enum_value_resets_numbering() {
        let prog = parse("enum E { A = 5, B, C }; int x = C;");
        match &prog.items[1] {
            TopLevel::GlobalDecl(d) => assert_eq!(*d.init.as_deref().unwrap(), Expr::IntLit(7)),
            _ => panic!("expected decl"),
        }
    }

    #[test]
    fn cast_vs_parenthesized_expression() {
        let prog = parse("int f(){int x; x = (int)5; return (x + 1) * 2;}");
        let TopLevel::Function(f) = &prog.items[0] else { panic!() };
        let Stmt::Block(stmts) = f.body.as_deref().unwrap() else { panic!() };
        matches!(&stmts[1], Stmt::Expr(Expr::Assign { value, .. }) if matches!(**value, Expr::Cast { .. }));
        matches!(&stmts[2], Stmt::Return(Some(Expr::Binary { .. })));
    }

    #[test]
    fn struct_member_access_distinguishes_dot_and_arrow() {
        let prog = parse(
            "struct P{int x;int y;}; int g(struct P* p, struct P q){return p->y + q.x;}",
        );
        let TopLevel::Function(f) = &prog.items[1] else { panic!() };
        let Stmt::Block(stmts) = f.body.as_deref().unwrap() else { panic!() };
        let Stmt::Return(Some(Expr::Binary { left, right, .. })) = &stmts[0] else { panic!() };
        assert!(matches!(**left, Expr::MemberAccess { is_arrow: true, .. }));
        assert!(matches!(**right, Expr::MemberAccess { is_arrow: false, .. }));
    }

    #[test]
    fn anonymous_struct_typedef_captures_members() {
        let prog = parse("typedef struct { int x; int y; } Point;");
        match &prog.items[0] {
            TopLevel::Typedef(td) => {
                assert_eq!(td.alias, "Point");
                assert_eq!(td.members.len(), 2);
            }
            _ => panic!("expected typedef"),
        }
    }

    #[test]
    fn function_prototype_has_no_body() {
        let prog = parse("int f(int x);");
        match &prog.items[0] {
            TopLevel::Function(f) => assert!(f.body.is_none()),
            _ => panic!("expected function"),
        }
    }
}
