//! Statement code generation: control flow, declarations, and the
//! loop-context stack that `break`/`continue` consult.

use crate::ast::Stmt;
use crate::types::value_width;

use super::error::CodeGenError;
use super::state::{CodeGen, LoopContext};

impl CodeGen {
    pub(super) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), CodeGenError> {
        match stmt {
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.gen_stmt(s)?;
                }
                Ok(())
            }
            Stmt::Decl(decl) => self.gen_decl_stmt(decl),
            Stmt::Return(value) => {
                if let Some(expr) = value {
                    self.gen_expr(expr)?;
                }
                self.emit("    jmp .epilogue");
                Ok(())
            }
            Stmt::If { cond, then_branch, else_branch } => self.gen_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body } => self.gen_while(cond, body),
            Stmt::For { init, cond, step, body } => self.gen_for(init.as_deref(), cond.as_ref(), step.as_ref(), body),
            Stmt::Break => self.gen_break(),
            Stmt::Continue => self.gen_continue(),
            Stmt::Asm(text) => {
                self.gen_asm(text);
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.gen_expr(expr)?;
                Ok(())
            }
        }
    }

    fn gen_decl_stmt(&mut self, decl: &crate::ast::Decl) -> Result<(), CodeGenError> {
        let local = self.declare_local(decl);
        if let Some(init) = &decl.init {
            self.gen_expr(init)?;
            let reg = match value_width(&local.type_name, local.pointer_level) {
                1 => "al",
                2 => "ax",
                _ => "eax",
            };
            self.emit(format!("    mov {}, {reg}", local.address_operand()));
        }
        Ok(())
    }

    fn gen_if(
        &mut self,
        cond: &crate::ast::Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<(), CodeGenError> {
        self.gen_expr(cond)?;
        self.emit("    cmp eax, 0");

        match else_branch {
            None => {
                let end_label = self.new_label("if_end");
                self.emit(format!("    je {end_label}"));
                self.gen_stmt(then_branch)?;
                self.emit_label(&end_label);
            }
            Some(else_stmt) => {
                let else_label = self.new_label("if_else");
                let end_label = self.new_label("if_end");
                self.emit(format!("    je {else_label}"));
                self.gen_stmt(then_branch)?;
                self.emit(format!("    jmp {end_label}"));
                self.emit_label(&else_label);
                self.gen_stmt(else_stmt)?;
                self.emit_label(&end_label);
            }
        }
        Ok(())
    }

    fn gen_while(&mut self, cond: &crate::ast::Expr, body: &Stmt) -> Result<(), CodeGenError> {
        let start_label = self.new_label("while_start");
        let end_label = self.new_label("while_end");

        self.loop_stack.push(LoopContext {
            continue_label: start_label.clone(),
            break_label: end_label.clone(),
        });

        self.emit_label(&start_label);
        self.gen_expr(cond)?;
        self.emit("    cmp eax, 0");
        self.emit(format!("    je {end_label}"));
        self.gen_stmt(body)?;
        self.emit(format!("    jmp {start_label}"));
        self.emit_label(&end_label);

        self.loop_stack.pop();
        Ok(())
    }

    fn gen_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&crate::ast::Expr>,
        step: Option<&crate::ast::Expr>,
        body: &Stmt,
    ) -> Result<(), CodeGenError> {
        if let Some(init) = init {
            self.gen_stmt(init)?;
        }

        let start_label = self.new_label("for_start");
        let continue_label = self.new_label("for_continue");
        let end_label = self.new_label("for_end");

        self.loop_stack.push(LoopContext {
            continue_label: continue_label.clone(),
            break_label: end_label.clone(),
        });

        self.emit_label(&start_label);
        if let Some(cond) = cond {
            self.gen_expr(cond)?;
            self.emit("    cmp eax, 0");
            self.emit(format!("    je {end_label}"));
        }
        self.gen_stmt(body)?;
        self.emit_label(&continue_label);
        if let Some(step) = step {
            self.gen_expr(step)?;
        }
        self.emit(format!("    jmp {start_label}"));
        self.emit_label(&end_label);

        self.loop_stack.pop();
        Ok(())
    }

    fn gen_break(&mut self) -> Result<(), CodeGenError> {
        match self.loop_stack.last().map(|ctx| ctx.break_label.clone()) {
            Some(label) => self.emit(format!("    jmp {label}")),
            None => self.emit("    ; ERROR: Break outside loop"),
        }
        Ok(())
    }

    fn gen_continue(&mut self) -> Result<(), CodeGenError> {
        match self.loop_stack.last().map(|ctx| ctx.continue_label.clone()) {
            Some(label) => self.emit(format!("    jmp {label}")),
            None => self.emit("    ; ERROR: Continue outside loop"),
        }
        Ok(())
    }

    fn gen_asm(&mut self, text: &str) {
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            self.emit(format!("    {trimmed}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Program;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize_all();
        let program: Program = Parser::new(tokens).parse_program().unwrap();
        super::super::program::compile_program(&program, false).unwrap()
    }

    #[test]
    fn while_loop_emits_start_and_end_labels_with_backward_jump() {
        let asm = compile("void f(){int i; i=0; while(i<10){i=i+1;}}");
        assert!(asm.contains(".Lwhile_start"));
        assert!(asm.contains(".Lwhile_end"));
    }

    #[test]
    fn break_jumps_to_enclosing_loops_end_label() {
        let asm = compile("void f(){while(1){break;}}");
        let start = asm.find(".Lwhile_start").unwrap();
        let end = asm.find(".Lwhile_end").unwrap();
        let break_jmp = asm.find("jmp .Lwhile_end").unwrap();
        assert!(break_jmp > start && break_jmp < end);
    }

    #[test]
    fn for_loop_runs_step_before_jumping_back_to_condition() {
        let asm = compile("void f(){int i; for(i=0;i<10;i=i+1){}}");
        assert!(asm.contains(".Lfor_continue"));
    }

    #[test]
    fn if_without_else_skips_past_a_single_end_label() {
        let asm = compile("void f(){int x; if(x) { x=1; }}");
        assert!(asm.contains(".Lif_end"));
        assert!(!asm.contains(".Lif_else"));
    }

    #[test]
    fn return_jumps_to_the_shared_epilogue() {
        let asm = compile("int f(){return 5;}");
        assert!(asm.contains("jmp .epilogue"));
        assert!(asm.contains(".epilogue:"));
    }

    #[test]
    fn break_outside_a_loop_is_a_nonfatal_comment() {
        let asm = compile("void f(){break;}");
        assert!(asm.contains("; ERROR: Break outside loop"));
    }

    #[test]
    fn continue_outside_a_loop_is_a_nonfatal_comment() {
        let asm = compile("void f(){continue;}");
        assert!(asm.contains("; ERROR: Continue outside loop"));
    }
}
