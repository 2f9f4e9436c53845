use std::collections::HashMap;

use code_metadata::VMReg;
use frame_layout_common::StackPtr;

/// Where callee frames saved the registers live in the frame being inspected.
#[derive(Debug, Clone, Default)]
pub struct RegisterMap {
    saved: HashMap<VMReg, StackPtr>,
}

impl RegisterMap {
    pub fn new() -> Self {
        Self { saved: HashMap::new() }
    }

    pub fn set_location(&mut self, reg: VMReg, slot: StackPtr) {
        self.saved.insert(reg, slot);
    }

    pub fn with_location(mut self, reg: VMReg, slot: StackPtr) -> Self {
        self.set_location(reg, slot);
        self
    }

    pub fn location(&self, reg: VMReg) -> Option<StackPtr> {
        self.saved.get(&reg).copied()
    }
}
