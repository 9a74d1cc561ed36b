//! CodeGen state: the output buffer, label/string counters, and the symbol
//! tables a function body's code generation consults. Locals and the loop
//! stack reset at the start of every function; globals and struct layouts
//! are shared across the whole compilation.

use std::collections::HashMap;

use super::layout::StructTable;

#[derive(Debug, Clone)]
pub struct Local {
    /// For a local: bytes below `ebp` (`[ebp - offset]`). For a parameter:
    /// bytes above `ebp` (`[ebp + offset]`), starting at +8 per cdecl.
    pub offset: i32,
    pub is_param: bool,
    pub type_name: String,
    pub pointer_level: u32,
    /// Byte size of one element: what a subscript or dereference scales by.
    pub element_size: u32,
    /// Total stack footprint of this slot, already rounded up to 4 bytes.
    pub total_size: u32,
    pub is_array: bool,
    pub array_len: u32,
}

impl Local {
    pub fn address_operand(&self) -> String {
        if self.is_param {
            format!("[ebp+{}]", self.offset)
        } else {
            format!("[ebp-{}]", self.offset)
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalVar {
    pub type_name: String,
    pub pointer_level: u32,
    pub size: u32,
    pub is_array: bool,
    pub array_len: u32,
}

#[derive(Debug, Clone)]
pub struct LoopContext {
    pub continue_label: String,
    pub break_label: String,
}

pub struct CodeGen {
    pub(super) output: String,
    pub(super) label_counter: u32,
    pub(super) string_pool: Vec<String>,
    pub(super) locals: HashMap<String, Local>,
    pub(super) globals: HashMap<String, GlobalVar>,
    pub(super) structs: StructTable,
    pub(super) loop_stack: Vec<LoopContext>,
    pub(super) next_local_offset: i32,
    pub(super) warnings_as_errors: bool,
}

impl CodeGen {
    pub fn into_output(self) -> String {
        self.output
    }

    pub fn new(structs: StructTable, globals: HashMap<String, GlobalVar>, warnings_as_errors: bool) -> Self {
        CodeGen {
            output: String::new(),
            label_counter: 0,
            string_pool: Vec::new(),
            locals: HashMap::new(),
            globals,
            structs,
            loop_stack: Vec::new(),
            next_local_offset: 0,
            warnings_as_errors,
        }
    }

    pub(super) fn new_label(&mut self, prefix: &str) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!(".L{prefix}{id}")
    }

    pub(super) fn intern_string(&mut self, content: &str) -> usize {
        // No content-based dedup: every literal occurrence gets its own slot,
        // even if an earlier literal had identical content.
        let id = self.string_pool.len();
        self.string_pool.push(content.to_string());
        id
    }

    pub(super) fn emit(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    pub(super) fn emit_label(&mut self, label: &str) {
        self.output.push_str(label);
        self.output.push_str(":\n");
    }

    pub(super) fn reset_function_scope(&mut self) {
        self.locals.clear();
        self.loop_stack.clear();
        self.next_local_offset = 0;
    }

    pub(super) fn warn(&mut self, message: impl Into<String>) -> Result<(), super::error::CodeGenError> {
        let message = message.into();
        if self.warnings_as_errors {
            return Err(super::error::CodeGenError::Logic(message));
        }
        self.emit(format!("    ; WARNING: {message}"));
        Ok(())
    }
}
