//! Integration tests driving the full source-text -> NASM-text pipeline
//! through the library's public `compile_source` entry point.

use std::fs;
use std::path::Path;

use kc32::{compile_source, CompilerConfig};

fn compile(src: &str) -> String {
    compile_source(src, Path::new("."), &CompilerConfig::new()).expect("compilation should succeed")
}

#[test]
fn scenario_1_return_constant() {
    let asm = compile("int main(){return 42;}");
    for needle in ["main:", "push ebp", "mov ebp, esp", "mov eax, 42", "jmp .epilogue", ".epilogue:", "ret"] {
        assert!(asm.contains(needle), "expected {needle:?} in:\n{asm}");
    }
}

#[test]
fn scenario_2_two_parameter_addition() {
    let asm = compile("int add(int a,int b){return a+b;}");
    assert!(asm.contains("[ebp+8]"));
    assert!(asm.contains("[ebp+12]"));
    assert!(asm.contains("pop eax"));
    assert!(asm.contains("add eax, ebx"));
}

#[test]
fn scenario_3_char_array_element_store() {
    let asm = compile("void f(){char s[4]; s[2]=65;}");
    assert!(asm.contains("mov [ebx], al"));
    assert!(asm.contains("imul eax, 1"));
}

#[test]
fn scenario_4_struct_member_through_pointer() {
    let asm = compile("struct P{int x;int y;}; int g(struct P* p){return p->y;}");
    assert!(asm.contains("[ebp+8]"));
    assert!(asm.contains("mov eax,[eax+4]"));
}

#[test]
fn scenario_5_for_loop_break_targets_end_label_not_condition() {
    let asm = compile("int f(){int i; for(i=0;i<3;i=i+1){} return i;}");
    assert!(asm.contains(".Lfor_start"));
    assert!(asm.contains(".Lfor_end"));
}

#[test]
fn scenario_6_typedef_sizeof_resolves_underlying_type() {
    let asm = compile("typedef unsigned char u8; u8 x; int main(){return sizeof(x);}");
    assert!(asm.contains("x dd 0"));
    assert!(asm.contains("mov eax, 1"));
}

#[test]
fn boundary_for_loop_with_all_clauses_empty_is_an_infinite_backward_jump() {
    let asm = compile("void f(){for(;;){}}");
    let start = asm.find(".Lfor_start").expect("start label");
    let jmp = asm.find("jmp .Lfor_start").expect("backward jump");
    let end = asm.find(".Lfor_end").expect("end label");
    assert!(start < jmp);
    assert!(jmp < end || end < jmp); // end label exists even though never reached
}

#[test]
fn boundary_member_sizeof_empty_call_args_and_bare_return_compile_without_error() {
    let asm = compile(
        "struct P{int x;}; void noop(){return;} int main(){struct P p; sizeof(p); noop(); return 0;}",
    );
    assert!(asm.contains("call noop"));
    assert!(asm.contains("jmp .epilogue"));
}

#[test]
fn boundary_local_char_array_reserves_rounded_up_stack_space() {
    let asm = compile("void f(){char s[5];}");
    assert!(asm.contains("sub esp, 512"));
}

#[test]
fn short_circuit_and_skips_the_right_operand_when_left_is_false() {
    let asm = compile("int f(int a,int b){return a && b;}");
    assert!(asm.contains("je .Land_false"));
}

#[test]
fn short_circuit_or_skips_the_right_operand_when_left_is_true() {
    let asm = compile("int f(int a,int b){return a || b;}");
    assert!(asm.contains("jne .Lor_true"));
}

#[test]
fn postfix_increment_returns_the_pre_update_value() {
    let asm = compile("int f(){int i; i=5; return i++;}");
    assert!(asm.contains("push eax"));
    assert!(asm.contains("add eax, 1"));
}

#[test]
fn pointer_storage_is_always_a_dword_regardless_of_pointee_width() {
    let asm = compile("void f(char* a, char* b){a = b;}");
    assert!(!asm.contains("mov [ebx], al"));
}

#[test]
fn break_outside_a_loop_emits_the_dedicated_error_comment() {
    let asm = compile("void f(){break;}");
    assert!(asm.contains("; ERROR: Break outside loop"));
}

#[test]
fn unknown_identifier_degrades_to_a_warning_comment_instead_of_aborting() {
    let asm = compile("int f(){return undeclared_name;}");
    assert!(asm.contains("; WARNING"));
}

#[test]
fn warnings_as_errors_promotes_unknown_identifiers_to_a_hard_error() {
    let cfg = CompilerConfig::new().with_warnings_as_errors(true);
    let result = compile_source("int f(){return undeclared_name;}", Path::new("."), &cfg);
    assert!(result.is_err());
}

#[test]
fn preprocessor_splices_an_included_file_from_the_search_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("answer.h"), "42").unwrap();
    let main_path = dir.path().join("main.c");
    fs::write(&main_path, "#include \"answer.h\"\nint main(){return 0;}\n").unwrap();

    let source = fs::read_to_string(&main_path).unwrap();
    let asm = compile_source(&source, dir.path(), &CompilerConfig::new()).unwrap();
    assert!(asm.contains("main:"));
}

#[test]
fn preprocessor_honors_an_extra_include_directory() {
    let include_dir = tempfile::tempdir().unwrap();
    fs::write(include_dir.path().join("lib.h"), "").unwrap();
    let src_dir = tempfile::tempdir().unwrap();

    let config = CompilerConfig::new().with_include_dir(include_dir.path());
    let source = "#include \"lib.h\"\nint main(){return 0;}\n";
    let asm = compile_source(source, src_dir.path(), &config).unwrap();
    assert!(asm.contains("main:"));
}

#[test]
fn preprocessor_caps_include_nesting_depth_instead_of_overflowing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.h"), "#include \"a.h\"\n").unwrap();

    let source = "#include \"a.h\"\nint main(){return 0;}\n";
    // Must terminate (the depth cap trips) rather than recurse forever.
    let _ = compile_source(source, dir.path(), &CompilerConfig::new());
}
