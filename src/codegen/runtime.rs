//! Fixed runtime support emitted into every compiled kernel: the bare-metal
//! entry prologue, VGA text output, port I/O, interrupt control, and memory
//! primitives. These are plain NASM text blocks, not generated from the
//! AST — every kernel gets the same routines regardless of what the source
//! program uses, matching a freestanding target with no linker-provided
//! libc.

use super::state::CodeGen;

/// Names reserved for the runtime. A user function with one of these names
/// is never emitted — the runtime's own definition wins silently.
pub const RUNTIME_FUNCTION_NAMES: &[&str] = &[
    "print_char",
    "print_string",
    "print_hex",
    "print_int",
    "set_cursor",
    "get_cursor",
    "newline",
    "clear_screen",
    "outb",
    "inb",
    "outw",
    "inw",
    "outl",
    "inl",
    "disable_interrupts",
    "enable_interrupts",
    "cli_func",
    "sti_func",
    "halt",
    "read_cr0",
    "write_cr0",
    "read_cr3",
    "write_cr3",
    "memcpy",
    "memset",
    "memcmp",
];

pub fn is_runtime_function(name: &str) -> bool {
    RUNTIME_FUNCTION_NAMES.contains(&name)
}

const BAREMETAL_PROLOGUE: &str = "\
[BITS 32]
[org 0x8000]
section .text
global _start
global kernel_main
_start:
    jmp kernel_main
";

const VGA_RUNTIME: &str = "\
print_char:
    push ebp
    mov ebp, esp
    mov eax, [vga_cursor]
    mov ebx, eax
    shl ebx, 1
    mov edx, 0xB8000
    add edx, ebx
    mov al, [ebp+8]
    mov [edx], al
    mov byte [edx+1], 0x0F
    inc dword [vga_cursor]
    pop ebp
    ret

print_string:
    push ebp
    mov ebp, esp
    push esi
    mov esi, [ebp+8]
.ps_loop:
    lodsb
    cmp al, 0
    je .ps_done
    push eax
    call print_char
    add esp, 4
    jmp .ps_loop
.ps_done:
    pop esi
    pop ebp
    ret

print_hex:
    push ebp
    mov ebp, esp
    push ebx
    push ecx
    mov eax, [ebp+8]
    mov ecx, 8
.ph_loop:
    rol eax, 4
    push eax
    mov ebx, eax
    and ebx, 0x0F
    movzx ebx, byte [hex_chars + ebx]
    push ebx
    call print_char
    add esp, 4
    pop eax
    loop .ph_loop
    pop ecx
    pop ebx
    pop ebp
    ret

print_int:
    push ebp
    mov ebp, esp
    push ebx
    push ecx
    push edx
    mov eax, [ebp+8]
    cmp eax, 0
    jge .pi_positive
    push eax
    mov eax, '-'
    push eax
    call print_char
    add esp, 4
    pop eax
    neg eax
.pi_positive:
    mov ecx, 0
    mov ebx, 10
.pi_div:
    cmp eax, 0
    je .pi_print
    cdq
    idiv ebx
    push edx
    inc ecx
    jmp .pi_div
.pi_print:
    cmp ecx, 0
    jne .pi_emit
    push 0
    push '0'
    call print_char
    add esp, 4
    jmp .pi_done
.pi_emit:
    cmp ecx, 0
    je .pi_done
    pop eax
    add eax, '0'
    push eax
    call print_char
    add esp, 4
    dec ecx
    jmp .pi_emit
.pi_done:
    pop edx
    pop ecx
    pop ebx
    pop ebp
    ret

set_cursor:
    push ebp
    mov ebp, esp
    mov eax, [ebp+8]
    mov [vga_cursor], eax
    pop ebp
    ret

get_cursor:
    mov eax, [vga_cursor]
    ret

newline:
    push ebp
    mov ebp, esp
    mov eax, [vga_cursor]
    mov ebx, 80
    cdq
    idiv ebx
    inc eax
    mov ebx, 80
    mul ebx
    mov [vga_cursor], eax
    pop ebp
    ret

clear_screen:
    push ebp
    mov ebp, esp
    push edi
    push ecx
    mov edi, 0xB8000
    mov ecx, 2000
    mov ax, 0x0F20
.cs_loop:
    stosw
    loop .cs_loop
    mov dword [vga_cursor], 0
    pop ecx
    pop edi
    pop ebp
    ret

hex_chars db '0123456789ABCDEF'
";

const PORT_IO_RUNTIME: &str = "\
outb:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    mov al, [ebp+12]
    out dx, al
    pop ebp
    ret

inb:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    in al, dx
    movzx eax, al
    pop ebp
    ret

outw:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    mov ax, [ebp+12]
    out dx, ax
    pop ebp
    ret

inw:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    in ax, dx
    movzx eax, ax
    pop ebp
    ret

outl:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    mov eax, [ebp+12]
    out dx, eax
    pop ebp
    ret

inl:
    push ebp
    mov ebp, esp
    mov dx, [ebp+8]
    in eax, dx
    pop ebp
    ret
";

const INTERRUPT_RUNTIME: &str = "\
disable_interrupts:
cli_func:
    cli
    ret

enable_interrupts:
sti_func:
    sti
    ret

halt:
    hlt
    jmp halt

read_cr0:
    mov eax, cr0
    ret

write_cr0:
    push ebp
    mov ebp, esp
    mov eax, [ebp+8]
    mov cr0, eax
    pop ebp
    ret

read_cr3:
    mov eax, cr3
    ret

write_cr3:
    push ebp
    mov ebp, esp
    mov eax, [ebp+8]
    mov cr3, eax
    pop ebp
    ret
";

const MEMORY_RUNTIME: &str = "\
memcpy:
    push ebp
    mov ebp, esp
    push esi
    push edi
    push ecx
    mov edi, [ebp+8]
    mov esi, [ebp+12]
    mov ecx, [ebp+16]
    rep movsb
    mov eax, [ebp+8]
    pop ecx
    pop edi
    pop esi
    pop ebp
    ret

memset:
    push ebp
    mov ebp, esp
    push edi
    push ecx
    mov edi, [ebp+8]
    mov al, [ebp+12]
    mov ecx, [ebp+16]
    rep stosb
    mov eax, [ebp+8]
    pop ecx
    pop edi
    pop ebp
    ret

memcmp:
    push ebp
    mov ebp, esp
    push esi
    push edi
    push ecx
    mov esi, [ebp+8]
    mov edi, [ebp+12]
    mov ecx, [ebp+16]
    repe cmpsb
    je .memcmp_equal
    movzx eax, byte [esi-1]
    movzx ebx, byte [edi-1]
    sub eax, ebx
    jmp .memcmp_done
.memcmp_equal:
    xor eax, eax
.memcmp_done:
    pop ecx
    pop edi
    pop esi
    pop ebp
    ret
";

impl CodeGen {
    pub(super) fn emit_baremetal_prologue(&mut self) {
        self.output.push_str(BAREMETAL_PROLOGUE);
    }

    pub(super) fn emit_runtime_blocks(&mut self) {
        self.output.push_str(&VGA_RUNTIME);
        self.output.push_str(&PORT_IO_RUNTIME);
        self.output.push_str(&INTERRUPT_RUNTIME);
        self.output.push_str(&MEMORY_RUNTIME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names_cover_every_runtime_symbol() {
        for name in [
            "print_char", "memcpy", "outb", "halt", "disable_interrupts", "read_cr3",
        ] {
            assert!(is_runtime_function(name));
        }
        assert!(!is_runtime_function("kernel_main"));
    }
}
