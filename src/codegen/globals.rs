//! Global variable registration and emission of the `.data` section: the
//! string literal pool (no content dedup — every literal keeps its own
//! encounter-order slot) followed by global variables and the runtime's
//! `vga_cursor` cell.

use std::collections::HashMap;

use crate::ast::{Decl, Expr};
use crate::types::element_size;

use super::state::{CodeGen, GlobalVar};

pub fn register_global(globals: &mut HashMap<String, GlobalVar>, decl: &Decl) {
    let size = element_size(&decl.type_name, decl.pointer_level);
    let is_array = decl.array_size.is_some();
    let array_len = decl
        .array_size
        .as_deref()
        .map(const_eval_len)
        .unwrap_or(1);
    globals.insert(
        decl.name.clone(),
        GlobalVar { type_name: decl.type_name.clone(), pointer_level: decl.pointer_level, size, is_array, array_len },
    );
}

fn const_eval_len(expr: &Expr) -> u32 {
    match expr {
        Expr::IntLit(v) => (*v).max(0) as u32,
        _ => 1,
    }
}

impl CodeGen {
    pub(super) fn emit_data_section(&mut self, program_globals: &[Decl]) {
        self.emit("section .data");
        self.emit("align 4");

        for (id, content) in self.string_pool.clone().iter().enumerate() {
            self.emit(format!("str{id} db `{content}`,0"));
        }

        for decl in program_globals {
            let Some(g) = self.globals.get(&decl.name).cloned() else { continue };
            if g.is_array {
                let bytes = g.size * g.array_len;
                self.emit(format!("{}: times {} db 0", decl.name, bytes));
            } else {
                let init = decl
                    .init
                    .as_deref()
                    .map(const_eval_len_signed)
                    .unwrap_or(0);
                self.emit(format!("{} dd {}", decl.name, init));
            }
        }

        self.emit("vga_cursor dd 0");
    }
}

fn const_eval_len_signed(expr: &Expr) -> i64 {
    match expr {
        Expr::IntLit(v) => *v,
        Expr::Unary { op: crate::token::TokenKind::Minus, operand } => -const_eval_len_signed(operand),
        Expr::Cast { expr: inner, .. } => const_eval_len_signed(inner),
        _ => 0,
    }
}
