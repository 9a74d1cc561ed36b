//! Function prologue/epilogue, parameter offset assignment, and the fixed
//! 512-byte local reservation. Stack-size analysis (computing the exact
//! frame size from the locals a body declares) is an explicit non-goal —
//! the reservation is deliberately generous and fixed.

use crate::ast::{Decl, Function};
use crate::types::{element_size, value_width};

use super::error::CodeGenError;
use super::state::{CodeGen, Local};

const FRAME_RESERVATION: u32 = 512;

impl CodeGen {
    pub(super) fn gen_function(&mut self, f: &Function) -> Result<(), CodeGenError> {
        let Some(body) = &f.body else { return Ok(()) };

        self.reset_function_scope();
        self.emit_label(&f.name);
        self.emit("    push ebp");
        self.emit("    mov ebp, esp");

        let mut offset = 8i32;
        for param in &f.params {
            if !param.name.is_empty() {
                self.declare_param(param, offset);
            }
            offset += 4;
        }

        self.emit(format!("    sub esp, {FRAME_RESERVATION}"));

        self.gen_stmt(body)?;

        self.emit_label(".epilogue");
        self.emit("    mov esp, ebp");
        self.emit("    pop ebp");
        self.emit("    ret");

        debug_assert!(self.loop_stack.is_empty(), "loop stack must be empty after a function body");
        Ok(())
    }

    fn declare_param(&mut self, decl: &Decl, offset: i32) {
        let pointee_unit = element_size(&decl.type_name, decl.pointer_level);
        let width = value_width(&decl.type_name, decl.pointer_level);
        self.locals.insert(
            decl.name.clone(),
            Local {
                offset,
                is_param: true,
                type_name: decl.type_name.clone(),
                pointer_level: decl.pointer_level,
                element_size: pointee_unit,
                total_size: round_up4(width),
                is_array: decl.array_size.is_some(),
                array_len: 1,
            },
        );
    }

    /// Reserves the next local stack slot for `decl` and records it in the
    /// local symbol table. Locals grow downward: each new slot is placed
    /// immediately below the previous one.
    pub(super) fn declare_local(&mut self, decl: &Decl) -> Local {
        let pointee_unit = element_size(&decl.type_name, decl.pointer_level);
        let is_array = decl.array_size.is_some();
        let array_len = decl
            .array_size
            .as_deref()
            .and_then(const_eval_usize)
            .unwrap_or(1)
            .max(1);

        let raw_size = if is_array {
            pointee_unit * array_len as u32
        } else if decl.pointer_level == 0 {
            self.structs.get(&decl.type_name).map(|s| s.total_size).unwrap_or(pointee_unit)
        } else {
            value_width(&decl.type_name, decl.pointer_level)
        };
        let total_size = round_up4(raw_size.max(1));

        self.next_local_offset += total_size as i32;
        let local = Local {
            offset: self.next_local_offset,
            is_param: false,
            type_name: decl.type_name.clone(),
            pointer_level: decl.pointer_level,
            element_size: pointee_unit,
            total_size,
            is_array,
            array_len: array_len as u32,
        };
        self.locals.insert(decl.name.clone(), local.clone());
        local
    }
}

fn const_eval_usize(expr: &crate::ast::Expr) -> Option<usize> {
    match expr {
        crate::ast::Expr::IntLit(v) => Some((*v).max(0) as usize),
        _ => None,
    }
}

fn round_up4(n: u32) -> u32 {
    (n + 3) & !3
}
