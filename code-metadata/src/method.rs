use std::collections::BTreeMap;

use crate::MethodId;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct MethodFlags {
    pub is_native: bool,
    pub is_synchronized: bool,
    pub is_static: bool,
}

/// Liveness of an interpreted frame's slots at one bytecode index. The expression stack depth is
/// fixed per bci by bytecode analysis.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InterpreterOopMap {
    bci: u16,
    num_locals: u16,
    // one entry per local followed by one per expression stack slot
    oop_slots: Vec<bool>,
}

impl InterpreterOopMap {
    pub fn new(bci: u16, local_oops: Vec<bool>, expression_stack_oops: Vec<bool>) -> Self {
        let num_locals = local_oops.len() as u16;
        let mut oop_slots = local_oops;
        oop_slots.extend(expression_stack_oops);
        Self { bci, num_locals, oop_slots }
    }

    pub fn bci(&self) -> u16 {
        self.bci
    }

    pub fn number_of_entries(&self) -> usize {
        self.oop_slots.len()
    }

    pub fn expression_stack_size(&self) -> usize {
        self.oop_slots.len() - self.num_locals as usize
    }

    pub fn is_oop(&self, slot: usize) -> bool {
        self.oop_slots[slot]
    }
}

#[derive(Debug)]
pub struct Method {
    id: MethodId,
    name: String,
    size_of_parameters: u16,
    max_locals: u16,
    flags: MethodFlags,
    oop_maps: BTreeMap<u16, InterpreterOopMap>,
}

impl Method {
    pub fn new(name: impl Into<String>, size_of_parameters: u16, max_locals: u16, flags: MethodFlags) -> Self {
        assert!(size_of_parameters <= max_locals || flags.is_native, "parameters live in the locals");
        Self {
            id: MethodId(usize::MAX),
            name: name.into(),
            size_of_parameters,
            max_locals,
            flags,
            oop_maps: BTreeMap::new(),
        }
    }

    pub fn with_oop_map(mut self, mask: InterpreterOopMap) -> Self {
        assert_eq!(mask.num_locals, self.max_locals, "oop map for {} covers the wrong number of locals", self.name);
        self.oop_maps.insert(mask.bci, mask);
        self
    }

    pub(crate) fn set_id(&mut self, id: MethodId) {
        self.id = id;
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn size_of_parameters(&self) -> usize {
        self.size_of_parameters as usize
    }

    pub fn max_locals(&self) -> usize {
        self.max_locals as usize
    }

    pub fn is_native(&self) -> bool {
        self.flags.is_native
    }

    pub fn is_synchronized(&self) -> bool {
        self.flags.is_synchronized
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }

    pub fn oop_map_at(&self, bci: u16) -> &InterpreterOopMap {
        match self.oop_maps.get(&bci) {
            Some(mask) => mask,
            None => panic!("no interpreter oop map for {} at bci {}", self.name, bci),
        }
    }
}
