//! Struct layout table: sequential, 4-byte-aligned member offsets computed
//! once per struct declaration and consulted by every later member access.
//!
//! Member access must resolve through this table and nothing else — not a
//! name heuristic on the accessed identifier — so that two differently
//! named struct variables of the same type still resolve members correctly.

use std::collections::HashMap;

use crate::ast::StructDecl;
use crate::types::value_width;

#[derive(Debug, Clone)]
pub struct StructMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub type_name: String,
    pub pointer_level: u32,
}

#[derive(Debug, Clone)]
pub struct StructLayout {
    pub members: Vec<StructMember>,
    pub total_size: u32,
}

impl StructLayout {
    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructTable {
    structs: HashMap<String, StructLayout>,
}

impl StructTable {
    pub fn new() -> Self {
        StructTable::default()
    }

    pub fn register(&mut self, decl: &StructDecl) {
        let Some(name) = &decl.name else { return };

        let mut offset = 0u32;
        let mut members = Vec::with_capacity(decl.members.len());
        for m in &decl.members {
            let size = value_width(&m.type_name, m.pointer_level); // arrays-as-members are out of scope for this subset
            members.push(StructMember {
                name: m.name.clone(),
                offset,
                size,
                type_name: m.type_name.clone(),
                pointer_level: m.pointer_level,
            });
            offset += size;
            offset = round_up4(offset);
        }
        let total_size = offset;
        self.structs.insert(name.clone(), StructLayout { members, total_size });
    }

    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        let stripped = name.strip_prefix("struct ").unwrap_or(name);
        self.structs.get(stripped)
    }
}

fn round_up4(n: u32) -> u32 {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;

    fn member(type_name: &str, name: &str, pointer_level: u32) -> Decl {
        Decl {
            type_name: type_name.to_string(),
            name: name.to_string(),
            pointer_level,
            init: None,
            array_size: None,
            flags: Default::default(),
        }
    }

    #[test]
    fn sequential_offsets_are_assigned_in_declaration_order() {
        let mut table = StructTable::new();
        table.register(&StructDecl {
            name: Some("Point".to_string()),
            members: vec![member("char", "tag", 0), member("int", "x", 0), member("int", "y", 0)],
        });
        let layout = table.get("struct Point").unwrap();
        assert_eq!(layout.member("tag").unwrap().offset, 0);
        assert_eq!(layout.member("x").unwrap().offset, 4);
        assert_eq!(layout.member("y").unwrap().offset, 8);
        assert_eq!(layout.total_size, 12);
    }

    #[test]
    fn pointer_members_are_four_bytes_regardless_of_pointee() {
        let mut table = StructTable::new();
        table.register(&StructDecl {
            name: Some("Node".to_string()),
            members: vec![member("int", "value", 0), member("struct Node", "next", 1)],
        });
        let layout = table.get("Node").unwrap();
        assert_eq!(layout.member("next").unwrap().size, 4);
    }
}
