//! Expression and lvalue-address code generation. Every expression leaves
//! its result in `eax`; the lvalue-address helper leaves an address in
//! `eax` instead, for the handful of contexts (assignment, `&`, `++`/`--`,
//! subscript/member store) that need a location rather than a value.

use crate::ast::{Expr, IncDec, SizeofArg};
use crate::token::TokenKind;
use crate::types::{base_type_size, value_width};

use super::error::CodeGenError;
use super::state::{CodeGen, GlobalVar, Local};

/// A resolved reference to a named storage location, local or global,
/// exposing just the fields lvalue/element-size logic needs regardless of
/// which table it came from.
enum Slot {
    Local(Local),
    Global(GlobalVar),
}

impl Slot {
    fn pointer_level(&self) -> u32 {
        match self {
            Slot::Local(l) => l.pointer_level,
            Slot::Global(g) => g.pointer_level,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            Slot::Local(l) => &l.type_name,
            Slot::Global(g) => &g.type_name,
        }
    }

    fn element_size(&self) -> u32 {
        match self {
            Slot::Local(l) => l.element_size,
            Slot::Global(g) => g.size,
        }
    }

    /// Width of this variable's own storage (always 4 for a pointer,
    /// whatever its pointee), as distinct from [`Slot::element_size`], the
    /// width of what it points to or what an array of it holds.
    fn value_width(&self) -> u32 {
        value_width(self.type_name(), self.pointer_level())
    }
}

/// A byte width chosen for a sized load/store.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Width {
    Byte,
    Word,
    Dword,
}

fn width_for(size: u32) -> Width {
    match size {
        1 => Width::Byte,
        2 => Width::Word,
        _ => Width::Dword,
    }
}

fn fmt_member_operand(base: &str, offset: u32) -> String {
    if offset == 0 { format!("[{base}]") } else { format!("[{base}+{offset}]") }
}

impl CodeGen {
    fn lookup(&self, name: &str) -> Option<Slot> {
        if let Some(l) = self.locals.get(name) {
            return Some(Slot::Local(l.clone()));
        }
        self.globals.get(name).cloned().map(Slot::Global)
    }

    // ---------- rvalue evaluation ----------

    pub(super) fn gen_expr(&mut self, expr: &Expr) -> Result<(), CodeGenError> {
        match expr {
            Expr::IntLit(v) => {
                self.emit(format!("    mov eax, {v}"));
                Ok(())
            }
            Expr::CharLit(c) => {
                self.emit(format!("    mov eax, {c}"));
                Ok(())
            }
            Expr::StringLit(s) => {
                let id = self.intern_string(s);
                self.emit(format!("    mov eax, str{id}"));
                Ok(())
            }
            Expr::Ident(name) => self.gen_ident_value(name),
            Expr::Binary { op: TokenKind::AndAnd, left, right } => self.gen_logical_and(left, right),
            Expr::Binary { op: TokenKind::OrOr, left, right } => self.gen_logical_or(left, right),
            Expr::Binary { op, left, right } => self.gen_binary(*op, left, right),
            Expr::Unary { op, operand } => self.gen_unary(*op, operand),
            Expr::IncDec { op, kind, operand } => self.gen_incdec(*op, *kind, operand),
            Expr::Assign { op, target, value } => self.gen_assign(*op, target, value),
            Expr::Call { name, args } => self.gen_call(name, args),
            Expr::ArrayAccess { .. } => {
                let size = self.expr_element_size(expr);
                self.gen_lvalue_address(expr)?;
                self.emit_load_from_eax(size);
                Ok(())
            }
            Expr::MemberAccess { object, member, is_arrow } => {
                let size = self.expr_element_size(expr);
                let operand = self.gen_member_operand(object, member, *is_arrow)?;
                self.emit_member_load(&operand, size);
                Ok(())
            }
            Expr::Cast { expr: inner, .. } => self.gen_cast(inner),
            Expr::Sizeof(arg) => self.gen_sizeof(arg),
            Expr::Ternary { cond, then_expr, else_expr } => self.gen_ternary(cond, then_expr, else_expr),
        }
    }

    fn gen_ident_value(&mut self, name: &str) -> Result<(), CodeGenError> {
        match self.lookup(name) {
            Some(Slot::Local(l)) if l.is_array && !l.is_param => {
                self.emit(format!("    lea eax, {}", l.address_operand()));
            }
            Some(Slot::Local(l)) => {
                let width = value_width(&l.type_name, l.pointer_level);
                self.emit_sized_load(&l.address_operand(), width);
            }
            Some(Slot::Global(g)) if g.is_array => {
                self.emit(format!("    mov eax, {name}"));
            }
            Some(Slot::Global(g)) => {
                let width = value_width(&g.type_name, g.pointer_level);
                self.emit_sized_load(&format!("[{name}]"), width);
            }
            None => {
                self.warn(format!("unknown identifier '{name}'"))?;
                self.emit("    xor eax, eax");
            }
        }
        Ok(())
    }

    fn emit_sized_load(&mut self, operand: &str, width: u32) {
        match width_for(width) {
            Width::Byte => self.emit(format!("    movzx eax, byte {operand}")),
            Width::Word => self.emit(format!("    movzx eax, word {operand}")),
            Width::Dword => self.emit(format!("    mov eax, {operand}")),
        }
    }

    /// Resolves `object.member`/`object->member` directly to a NASM
    /// addressing operand with the member's offset folded in, rather than
    /// computing the address with a separate `add`: `[ebp+N+member]` for a
    /// parameter, `[ebp-N+member]` for a local, `[name+member]` for a
    /// global, and `[eax+member]` for anything else (the object's own value
    /// is evaluated into `eax` first — its pointer value for `->`, its
    /// address for `.`).
    fn gen_member_operand(&mut self, object: &Expr, member: &str, is_arrow: bool) -> Result<String, CodeGenError> {
        let offset = self.member_offset(object, member, is_arrow);
        if !is_arrow {
            if let Expr::Ident(name) = object {
                match self.lookup(name) {
                    Some(Slot::Local(l)) if l.is_param => return Ok(fmt_member_operand(&format!("ebp+{}", l.offset), offset)),
                    Some(Slot::Local(l)) => return Ok(fmt_member_operand(&format!("ebp-{}", l.offset), offset)),
                    Some(Slot::Global(_)) => return Ok(fmt_member_operand(name, offset)),
                    None => {}
                }
            }
        }
        if is_arrow {
            self.gen_expr(object)?;
        } else {
            self.gen_lvalue_address(object)?;
        }
        Ok(fmt_member_operand("eax", offset))
    }

    fn emit_member_load(&mut self, operand: &str, size: u32) {
        match width_for(size) {
            Width::Byte => self.emit(format!("    movzx eax, byte {operand}")),
            Width::Word => self.emit(format!("    movzx eax, word {operand}")),
            Width::Dword => self.emit(format!("    mov eax,{operand}")),
        }
    }

    fn gen_binary(&mut self, op: TokenKind, left: &Expr, right: &Expr) -> Result<(), CodeGenError> {
        use TokenKind::*;
        self.gen_expr(left)?;
        self.emit("    push eax");
        self.gen_expr(right)?;
        self.emit("    mov ebx, eax");
        self.emit("    pop eax");

        match op {
            Plus => self.emit("    add eax, ebx"),
            Minus => self.emit("    sub eax, ebx"),
            Star => self.emit("    imul eax, ebx"),
            Slash => {
                self.emit("    cdq");
                self.emit("    idiv ebx");
            }
            Percent => {
                self.emit("    cdq");
                self.emit("    idiv ebx");
                self.emit("    mov eax, edx");
            }
            Ampersand => self.emit("    and eax, ebx"),
            Pipe => self.emit("    or eax, ebx"),
            Caret => self.emit("    xor eax, ebx"),
            LShift => {
                self.emit("    mov ecx, ebx");
                self.emit("    shl eax, cl");
            }
            RShift => {
                self.emit("    mov ecx, ebx");
                self.emit("    sar eax, cl");
            }
            Equal => self.emit_compare("sete"),
            NotEqual => self.emit_compare("setne"),
            Less => self.emit_compare("setl"),
            LessEqual => self.emit_compare("setle"),
            Greater => self.emit_compare("setg"),
            GreaterEqual => self.emit_compare("setge"),
            other => {
                self.warn(format!("unsupported binary operator {other:?}"))?;
            }
        }
        Ok(())
    }

    fn emit_compare(&mut self, set_insn: &str) {
        self.emit("    cmp eax, ebx");
        self.emit(format!("    {set_insn} al"));
        self.emit("    movzx eax, al");
    }

    /// `left && right`, short-circuiting: if `left` is false the whole
    /// expression is false without evaluating `right`.
    fn gen_logical_and(&mut self, left: &Expr, right: &Expr) -> Result<(), CodeGenError> {
        let false_label = self.new_label("and_false");
        let end_label = self.new_label("and_end");
        self.gen_expr(left)?;
        self.emit("    cmp eax, 0");
        self.emit(format!("    je {false_label}"));
        self.gen_expr(right)?;
        self.emit("    cmp eax, 0");
        self.emit("    setne al");
        self.emit("    movzx eax, al");
        self.emit(format!("    jmp {end_label}"));
        self.emit_label(&false_label);
        self.emit("    xor eax, eax");
        self.emit_label(&end_label);
        Ok(())
    }

    /// `left || right`, short-circuiting: if `left` is true the whole
    /// expression is true without evaluating `right`.
    fn gen_logical_or(&mut self, left: &Expr, right: &Expr) -> Result<(), CodeGenError> {
        let true_label = self.new_label("or_true");
        let end_label = self.new_label("or_end");
        self.gen_expr(left)?;
        self.emit("    cmp eax, 0");
        self.emit(format!("    jne {true_label}"));
        self.gen_expr(right)?;
        self.emit("    cmp eax, 0");
        self.emit("    setne al");
        self.emit("    movzx eax, al");
        self.emit(format!("    jmp {end_label}"));
        self.emit_label(&true_label);
        self.emit("    mov eax, 1");
        self.emit_label(&end_label);
        Ok(())
    }

    fn gen_unary(&mut self, op: TokenKind, operand: &Expr) -> Result<(), CodeGenError> {
        use TokenKind::*;
        match op {
            Ampersand => self.gen_lvalue_address(operand),
            Star => {
                let size = self.deref_element_size(operand);
                self.gen_expr(operand)?;
                self.emit_load_from_eax(size);
                Ok(())
            }
            Plus => self.gen_expr(operand),
            Minus => {
                self.gen_expr(operand)?;
                self.emit("    neg eax");
                Ok(())
            }
            Tilde => {
                self.gen_expr(operand)?;
                self.emit("    not eax");
                Ok(())
            }
            Exclaim => {
                self.gen_expr(operand)?;
                self.emit("    cmp eax, 0");
                self.emit("    sete al");
                self.emit("    movzx eax, al");
                Ok(())
            }
            other => {
                self.warn(format!("unsupported unary operator {other:?}"))?;
                self.emit("    xor eax, eax");
                Ok(())
            }
        }
    }

    /// Prefix `++a`/`--a` leaves the new value in `eax`; postfix `a++`/`a--`
    /// leaves the value `a` held before the update.
    fn gen_incdec(&mut self, op: TokenKind, kind: IncDec, operand: &Expr) -> Result<(), CodeGenError> {
        let size = self.lvalue_width(operand);
        let delta = if op == TokenKind::PlusPlus { 1 } else { -1 };

        self.gen_lvalue_address(operand)?;
        self.emit("    mov ebx, eax");
        self.emit_load_from_ebx(size);

        match kind {
            IncDec::Prefix => {
                self.emit(format!("    add eax, {delta}"));
                self.emit_store_to_ebx(size);
            }
            IncDec::Postfix => {
                self.emit("    push eax");
                self.emit(format!("    add eax, {delta}"));
                self.emit_store_to_ebx(size);
                self.emit("    pop eax");
            }
        }
        Ok(())
    }

    fn gen_call(&mut self, name: &str, args: &[Expr]) -> Result<(), CodeGenError> {
        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
            self.emit("    push eax");
        }
        self.emit(format!("    call {name}"));
        if !args.is_empty() {
            self.emit(format!("    add esp, {}", 4 * args.len()));
        }
        Ok(())
    }

    fn gen_cast(&mut self, inner: &Expr) -> Result<(), CodeGenError> {
        if let Expr::IntLit(v) = inner {
            self.emit(format!("    mov eax, {:#x}", *v as i32 as u32));
            Ok(())
        } else {
            self.gen_expr(inner)
        }
    }

    fn gen_sizeof(&mut self, arg: &SizeofArg) -> Result<(), CodeGenError> {
        let size = match arg {
            SizeofArg::Type { name, pointer_level } => {
                if *pointer_level > 0 {
                    4
                } else if let Some(layout) = self.structs.get(name) {
                    layout.total_size
                } else {
                    base_type_size(name)
                }
            }
            // A bare identifier resolves through the symbol table to its
            // declared element size; any other expression form defaults to
            // a dword rather than being evaluated for its type.
            SizeofArg::Expr(e) => match e.as_ref() {
                Expr::Ident(name) => self.lookup(name).map(|s| s.element_size()).unwrap_or(4),
                _ => 4,
            },
        };
        self.emit(format!("    mov eax, {size}"));
        Ok(())
    }

    fn gen_ternary(&mut self, cond: &Expr, then_expr: &Expr, else_expr: &Expr) -> Result<(), CodeGenError> {
        let else_label = self.new_label("tern_else");
        let end_label = self.new_label("tern_end");
        self.gen_expr(cond)?;
        self.emit("    cmp eax, 0");
        self.emit(format!("    je {else_label}"));
        self.gen_expr(then_expr)?;
        self.emit(format!("    jmp {end_label}"));
        self.emit_label(&else_label);
        self.gen_expr(else_expr)?;
        self.emit_label(&end_label);
        Ok(())
    }

    // ---------- assignment ----------

    fn gen_assign(&mut self, op: TokenKind, target: &Expr, value: &Expr) -> Result<(), CodeGenError> {
        if op == TokenKind::Assign {
            self.gen_expr(value)?;
            self.emit("    push eax");
            self.gen_lvalue_address(target)?;
            self.emit("    mov ebx, eax");
            self.emit("    pop eax");
            let size = self.lvalue_width(target);
            self.emit_store_to_ebx(size);
            return Ok(());
        }

        let size = self.lvalue_width(target);
        self.gen_lvalue_address(target)?;
        self.emit("    mov ebx, eax"); // address
        self.emit_load_from_ebx(size);
        self.emit("    push eax"); // old value
        self.gen_expr(value)?;
        self.emit("    mov ecx, eax"); // rhs
        self.emit("    pop eax"); // old value

        match op {
            TokenKind::PlusAssign => self.emit("    add eax, ecx"),
            TokenKind::MinusAssign => self.emit("    sub eax, ecx"),
            TokenKind::StarAssign => self.emit("    imul eax, ecx"),
            TokenKind::SlashAssign => {
                self.emit("    cdq");
                self.emit("    idiv ecx");
            }
            other => {
                self.warn(format!("unsupported compound assignment {other:?}"))?;
            }
        }

        self.emit("    push eax");
        self.gen_lvalue_address(target)?;
        self.emit("    mov ebx, eax");
        self.emit("    pop eax");
        self.emit_store_to_ebx(size);
        Ok(())
    }

    // ---------- lvalue addresses ----------

    pub(super) fn gen_lvalue_address(&mut self, expr: &Expr) -> Result<(), CodeGenError> {
        match expr {
            Expr::Ident(name) => match self.lookup(name) {
                Some(Slot::Local(l)) => {
                    self.emit(format!("    lea eax, {}", l.address_operand()));
                    Ok(())
                }
                Some(Slot::Global(_)) => {
                    self.emit(format!("    lea eax, [{name}]"));
                    Ok(())
                }
                None => {
                    self.warn(format!("unknown identifier '{name}'"))?;
                    self.emit("    xor eax, eax");
                    Ok(())
                }
            },
            Expr::Unary { op: TokenKind::Star, operand } => self.gen_expr(operand),
            Expr::ArrayAccess { array, index } => {
                let elem_size = self.expr_element_size(array);
                self.gen_expr(array)?;
                self.emit("    push eax");
                self.gen_expr(index)?;
                self.emit(format!("    imul eax, {elem_size}"));
                self.emit("    mov ebx, eax");
                self.emit("    pop eax");
                self.emit("    add eax, ebx");
                Ok(())
            }
            Expr::MemberAccess { object, member, is_arrow } => {
                let offset = self.member_offset(object, member, *is_arrow);
                if *is_arrow {
                    self.gen_expr(object)?;
                } else {
                    self.gen_lvalue_address(object)?;
                }
                if offset != 0 {
                    self.emit(format!("    add eax, {offset}"));
                }
                Ok(())
            }
            _ => {
                self.warn("cannot take the address of a non-lvalue expression")?;
                self.emit("    xor eax, eax");
                Ok(())
            }
        }
    }

    fn member_offset(&mut self, object: &Expr, member: &str, _is_arrow: bool) -> u32 {
        let struct_name = self.object_struct_name(object);
        match struct_name.and_then(|n| self.structs.get(&n).and_then(|l| l.member(member)).map(|m| m.offset)) {
            Some(off) => off,
            None => 0,
        }
    }

    /// Resolves the struct type name an expression's value has, by
    /// consulting the symbol table's recorded type string — never a
    /// name-substring heuristic on the expression itself.
    fn object_struct_name(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Ident(name) => match self.lookup(name) {
                Some(Slot::Local(l)) => Some(l.type_name),
                Some(Slot::Global(g)) => Some(g.type_name),
                None => None,
            },
            Expr::Unary { op: TokenKind::Star, operand } => self.object_struct_name(operand),
            Expr::MemberAccess { .. } => None, // nested struct-valued members are out of scope
            _ => None,
        }
    }

    /// Byte size used to scale/size a load-store through `expr`: the
    /// variable's own element size for an identifier, the struct member's
    /// recorded size for a member access, and a dword default otherwise.
    fn expr_element_size(&mut self, expr: &Expr) -> u32 {
        match expr {
            Expr::Ident(name) => self.lookup(name).map(|s| s.element_size()).unwrap_or(4),
            Expr::ArrayAccess { array, .. } => self.expr_element_size(array),
            Expr::MemberAccess { object, member, .. } => self
                .object_struct_name(object)
                .and_then(|n| self.structs.get(&n).and_then(|l| l.member(member)).map(|m| m.size))
                .unwrap_or(4),
            Expr::Unary { op: TokenKind::Star, operand } => self.deref_element_size(operand),
            _ => 4,
        }
    }

    /// Width of the store/load a use of `expr` as an lvalue target performs.
    /// For a bare identifier this is the variable's own storage width (a
    /// pointer is always 4 bytes here, unlike [`CodeGen::expr_element_size`]
    /// which answers what it points to); array/member/dereference targets
    /// share the same pointee/member sizing either way.
    fn lvalue_width(&mut self, expr: &Expr) -> u32 {
        match expr {
            Expr::Ident(name) => self.lookup(name).map(|s| s.value_width()).unwrap_or(4),
            _ => self.expr_element_size(expr),
        }
    }

    /// Size of the value a `*expr` dereference loads: the pointee size when
    /// `expr` is an identifier of known pointer type, else a dword default.
    fn deref_element_size(&mut self, expr: &Expr) -> u32 {
        match expr {
            Expr::Ident(name) => match self.lookup(name) {
                Some(slot) if slot.pointer_level() >= 1 => {
                    if slot.pointer_level() > 1 {
                        4
                    } else {
                        base_type_size(slot.type_name())
                    }
                }
                _ => 4,
            },
            _ => 4,
        }
    }

    fn emit_load_from_eax(&mut self, size: u32) {
        match width_for(size) {
            Width::Byte => self.emit("    movzx eax, byte [eax]"),
            Width::Word => self.emit("    movzx eax, word [eax]"),
            Width::Dword => self.emit("    mov eax, [eax]"),
        }
    }

    fn emit_load_from_ebx(&mut self, size: u32) {
        match width_for(size) {
            Width::Byte => self.emit("    movzx eax, byte [ebx]"),
            Width::Word => self.emit("    movzx eax, word [ebx]"),
            Width::Dword => self.emit("    mov eax, [ebx]"),
        }
    }

    /// Stores `eax` to `[ebx]`, narrowed to the width a `char`/`short` slot
    /// expects.
    fn emit_store_to_ebx(&mut self, size: u32) {
        match width_for(size) {
            Width::Byte => self.emit("    mov [ebx], al"),
            Width::Word => self.emit("    mov [ebx], ax"),
            Width::Dword => self.emit("    mov [ebx], eax"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize_all();
        let program: Program = Parser::new(tokens).parse_program().unwrap();
        super::super::program::compile_program(&program, false).unwrap()
    }

    #[test]
    fn array_index_scales_by_element_size() {
        let asm = compile("void f(){char s[4]; s[2]=65;}");
        assert!(asm.contains("imul eax, 1"));
        assert!(asm.contains("mov [ebx], al"));
    }

    #[test]
    fn struct_member_access_resolves_through_symbol_table() {
        let asm = compile("struct P{int x;int y;}; int g(struct P* p){return p->y;}");
        assert!(asm.contains("mov eax,[eax+4]"));
    }

    #[test]
    fn dot_member_access_on_a_local_folds_into_the_stack_operand() {
        let asm = compile("struct P{int x;int y;}; int f(){struct P p; p.x=1; return p.y;}");
        assert!(asm.contains("mov eax,[ebp-"));
        assert!(!asm.contains("add eax, "));
    }

    #[test]
    fn call_site_pushes_args_right_to_left_and_cleans_stack() {
        let asm = compile("int add(int a,int b){return a+b;} int main(){return add(1,2);}");
        assert!(asm.contains("call add"));
        assert!(asm.contains("add esp, 8"));
    }

    #[test]
    fn logical_and_short_circuits() {
        let asm = compile("int f(int a,int b){return a && b;}");
        assert!(asm.contains("je .Land_false"));
    }

    #[test]
    fn char_pointer_assignment_stores_a_full_dword_address() {
        let asm = compile("void f(char* a, char* b){a = b;}");
        assert!(asm.contains("mov [ebx], eax"));
        assert!(!asm.contains("mov [ebx], al"));
    }
}
