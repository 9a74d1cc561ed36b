//! Typedef table, enum constant table, and the type-size/element-size rules
//! shared by the parser and the code generator.

use std::collections::HashMap;

/// One typedef entry: the underlying type string (e.g. `"unsigned char"` or
/// `"struct Foo"`) plus the pointer level it carries from its own
/// declaration. A use site's own `*` stars are added on top of this, so
/// `typedef int* IntPtr; IntPtr* pp;` yields pointer level 2 for `pp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefEntry {
    pub underlying: String,
    pub pointer_level: u32,
}

/// Owned by one `Parser` instance; never global state, so repeated or
/// concurrent compilations in the same process are trivially safe.
#[derive(Debug, Clone, Default)]
pub struct TypedefTable {
    entries: HashMap<String, TypedefEntry>,
}

impl TypedefTable {
    pub fn new() -> Self {
        TypedefTable::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, underlying: impl Into<String>, pointer_level: u32) {
        self.entries.insert(alias.into(), TypedefEntry { underlying: underlying.into(), pointer_level });
    }

    pub fn get(&self, alias: &str) -> Option<&TypedefEntry> {
        self.entries.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }
}

/// Per-compilation enum member name -> resolved `i32` value.
#[derive(Debug, Clone, Default)]
pub struct EnumConstants {
    values: HashMap<String, i32>,
}

impl EnumConstants {
    pub fn new() -> Self {
        EnumConstants::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i32) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }
}

/// Byte size of one unit of a base type name, ignoring pointer level and
/// array count. Qualifiers (`unsigned`/`signed`/`const`/`volatile`) and
/// trailing `*`/space noise are stripped first. Unknown names default to 4,
/// matching a plain `int`-sized fallback.
pub fn base_type_size(type_name: &str) -> u32 {
    let mut s = type_name.trim();
    for prefix in ["unsigned ", "signed ", "const ", "volatile "] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest;
        }
    }
    let s = s.trim_end_matches(['*', ' ']);

    match s {
        "char" => 1,
        "short" => 2,
        "int" => 4,
        "long" => 4,
        "void" => 1,
        _ if s.starts_with("struct ") => 4, // resolved precisely via the struct layout table
        _ => 4,
    }
}

/// Byte size of one element when `pointer_level`/array-ness are known:
/// a pointer-to-pointer is always 4 bytes; a single-level pointer or a bare
/// value is the size of the base type it names. This is the size of what a
/// dereference or subscript through the value reaches, not the size of the
/// value's own storage — see [`value_width`] for that.
pub fn element_size(type_name: &str, pointer_level: u32) -> u32 {
    if pointer_level > 1 {
        4
    } else {
        base_type_size(type_name)
    }
}

/// Byte size of the storage a scalar of this declared type itself occupies:
/// any pointer is 4 bytes regardless of what it points to (a `char*` is a
/// 4-byte address, not a 1-byte char), a bare value is its base type's size.
pub fn value_width(type_name: &str, pointer_level: u32) -> u32 {
    if pointer_level >= 1 {
        4
    } else {
        base_type_size(type_name)
    }
}

/// Parses an integer literal lexeme, honoring both decimal and `0x`/`0X` hex
/// spellings. The lexeme's original spelling is kept by the lexer; only this
/// step interprets its numeric value.
pub fn parse_int_literal(lexeme: &str) -> i64 {
    if let Some(hex) = lexeme.strip_prefix("0x").or_else(|| lexeme.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        lexeme.parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedef_table_round_trips() {
        let mut t = TypedefTable::new();
        t.insert("u8", "unsigned char", 0);
        let e = t.get("u8").unwrap();
        assert_eq!(e.underlying, "unsigned char");
        assert_eq!(e.pointer_level, 0);
        assert!(!t.contains("u16"));
    }

    #[test]
    fn base_type_sizes_match_spec() {
        assert_eq!(base_type_size("char"), 1);
        assert_eq!(base_type_size("unsigned char"), 1);
        assert_eq!(base_type_size("short"), 2);
        assert_eq!(base_type_size("int"), 4);
        assert_eq!(base_type_size("long"), 4);
        assert_eq!(base_type_size("struct Point"), 4);
    }

    #[test]
    fn element_size_for_pointer_to_pointer_is_four() {
        assert_eq!(element_size("char", 2), 4);
        assert_eq!(element_size("char", 1), 1);
        assert_eq!(element_size("int", 0), 4);
    }

    #[test]
    fn value_width_is_four_for_any_pointer_level() {
        assert_eq!(value_width("char", 1), 4);
        assert_eq!(value_width("char", 2), 4);
        assert_eq!(value_width("char", 0), 1);
        assert_eq!(value_width("int", 1), 4);
    }

    #[test]
    fn parses_decimal_and_hex_literals() {
        assert_eq!(parse_int_literal("42"), 42);
        assert_eq!(parse_int_literal("0x2A"), 42);
        assert_eq!(parse_int_literal("0XFF"), 255);
    }
}
