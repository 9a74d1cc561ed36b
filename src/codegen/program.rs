//! Top-level orchestration: a first pass registers struct layouts and
//! global variables so member offsets and types are known before any
//! function body is walked, then functions are emitted, followed by the
//! fixed runtime library and the data section.

use std::collections::HashMap;

use crate::ast::{Program, StructDecl, TopLevel};

use super::error::CodeGenError;
use super::globals::register_global;
use super::layout::StructTable;
use super::runtime::is_runtime_function;
use super::state::{CodeGen, GlobalVar};

pub fn compile_program(program: &Program, warnings_as_errors: bool) -> Result<String, CodeGenError> {
    let mut structs = StructTable::new();
    let mut globals: HashMap<String, GlobalVar> = HashMap::new();
    let mut global_decls = Vec::new();

    for item in &program.items {
        match item {
            TopLevel::StructDecl(decl) => structs.register(decl),
            // `typedef struct { ... } Alias;` has no struct name of its own;
            // register its layout under the typedef's alias instead.
            TopLevel::Typedef(td) if !td.members.is_empty() => {
                structs.register(&StructDecl { name: Some(td.alias.clone()), members: td.members.clone() });
            }
            TopLevel::GlobalDecl(decl) => {
                register_global(&mut globals, decl);
                global_decls.push(decl.clone());
            }
            _ => {}
        }
    }

    let mut codegen = CodeGen::new(structs, globals, warnings_as_errors);
    codegen.emit_baremetal_prologue();

    for item in &program.items {
        if let TopLevel::Function(f) = item {
            if is_runtime_function(&f.name) {
                continue;
            }
            codegen.gen_function(f)?;
        }
    }

    codegen.emit_runtime_blocks();
    codegen.emit_data_section(&global_decls);

    Ok(codegen.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> String {
        let tokens = Lexer::new(src).tokenize_all();
        let program = Parser::new(tokens).parse_program().unwrap();
        compile_program(&program, false).unwrap()
    }

    #[test]
    fn e2e_return_constant() {
        let asm = compile("int main(){return 42;}");
        for needle in ["main:", "push ebp", "mov ebp, esp", "mov eax, 42", "jmp .epilogue", ".epilogue:", "ret"] {
            assert!(asm.contains(needle), "missing {needle:?} in:\n{asm}");
        }
    }

    #[test]
    fn e2e_struct_member_through_pointer() {
        let asm = compile("struct P{int x;int y;}; int g(struct P* p){return p->y;}");
        assert!(asm.contains("mov eax,[ebp+8]") || asm.contains("mov eax, [ebp+8]"));
        assert!(asm.contains("mov eax,[eax+4]"));
    }

    #[test]
    fn e2e_typedef_anonymous_struct_registers_layout() {
        let asm = compile("typedef struct { int x; int y; } Point; int f(Point* p){return p->y;}");
        assert!(asm.contains("mov eax,[eax+4]"));
    }

    #[test]
    fn runtime_functions_are_never_shadowed_by_user_definitions() {
        let asm = compile("void print_char(int c){return;} int main(){return 0;}");
        assert_eq!(asm.matches("print_char:").count(), 1);
    }

    #[test]
    fn data_section_follows_text_and_carries_the_vga_cursor() {
        let asm = compile("int main(){return 0;}");
        assert!(asm.contains("section .data"));
        assert!(asm.contains("vga_cursor dd 0"));
        assert!(asm.find("section .data").unwrap() > asm.find("main:").unwrap());
    }
}
