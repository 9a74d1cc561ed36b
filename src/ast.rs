//! Typed abstract syntax tree. Every node exclusively owns its children;
//! there are no back-edges, so an owned tree of boxed enum variants is a
//! direct fit.

use crate::token::TokenKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub type_name: String,
    pub name: String,
    pub pointer_level: u32,
    pub init: Option<Box<Expr>>,
    pub array_size: Option<Box<Expr>>,
    pub flags: DeclFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclFlags {
    pub is_static: bool,
    pub is_extern: bool,
    pub is_volatile: bool,
    pub is_const: bool,
    pub is_unsigned: bool,
    pub is_register: bool,
    pub is_inline: bool,
    pub is_packed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub return_type: String,
    pub return_pointer_level: u32,
    pub name: String,
    pub params: Vec<Decl>,
    pub body: Option<Box<Stmt>>,
    pub flags: DeclFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Option<String>,
    pub members: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Option<String>,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDecl {
    pub underlying: String,
    pub pointer_level: u32,
    pub alias: String,
    /// Non-empty only for `typedef struct { ... } Alias;`, where the struct
    /// has no name of its own to register in the struct layout table under
    /// — the codegen registers it under `alias` instead.
    pub members: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Function(Function),
    GlobalDecl(Decl),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),
    Typedef(TypedefDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<TopLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    StringLit(String),
    CharLit(u8),
    Ident(String),
    Binary { op: TokenKind, left: Box<Expr>, right: Box<Expr> },
    Unary { op: TokenKind, operand: Box<Expr> },
    IncDec { op: TokenKind, kind: IncDec, operand: Box<Expr> },
    Assign { op: TokenKind, target: Box<Expr>, value: Box<Expr> },
    Call { name: String, args: Vec<Expr> },
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    MemberAccess { object: Box<Expr>, member: String, is_arrow: bool },
    Cast { type_name: String, pointer_level: u32, expr: Box<Expr> },
    Sizeof(SizeofArg),
    Ternary { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeofArg {
    Type { name: String, pointer_level: u32 },
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Decl(Decl),
    Return(Option<Expr>),
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    For { init: Option<Box<Stmt>>, cond: Option<Expr>, step: Option<Expr>, body: Box<Stmt> },
    Break,
    Continue,
    Asm(String),
    Expr(Expr),
}
