use std::fmt::Debug;

use crate::{CodeAddress, StackPtr};

/// Reads and patches the code address a frame returns to. Some targets keep that address in a
/// form other than a plain code pointer, so the accessor is picked once per process and injected.
pub trait ReturnAddressAccessor: Debug + Send + Sync {
    /// # Safety
    /// `slot` must be the linkage slot of a frame resident in readable memory.
    unsafe fn return_address_at(&self, slot: StackPtr) -> CodeAddress;

    /// # Safety
    /// `slot` must be the linkage slot of a frame resident in writable memory, and the owning
    /// thread must not be running on that stack.
    unsafe fn patch_return_address_at(&self, slot: StackPtr, pc: CodeAddress);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainReturnAddress;

impl ReturnAddressAccessor for PlainReturnAddress {
    unsafe fn return_address_at(&self, slot: StackPtr) -> CodeAddress {
        CodeAddress(slot.read())
    }

    unsafe fn patch_return_address_at(&self, slot: StackPtr, pc: CodeAddress) {
        slot.write(pc.0)
    }
}

/// Return addresses stored signed with a key, using the slot address as modifier, so a copy moved
/// to another slot no longer authenticates.
#[derive(Debug, Clone, Copy)]
pub struct SignedReturnAddress {
    key: usize,
}

impl SignedReturnAddress {
    pub fn new(key: usize) -> Self {
        Self { key }
    }

    fn modifier(&self, slot: StackPtr) -> usize {
        self.key ^ slot.address().rotate_left(17)
    }

    pub fn sign(&self, slot: StackPtr, pc: CodeAddress) -> usize {
        pc.0 ^ self.modifier(slot)
    }

    pub fn authenticate(&self, slot: StackPtr, signed: usize) -> CodeAddress {
        CodeAddress(signed ^ self.modifier(slot))
    }
}

impl ReturnAddressAccessor for SignedReturnAddress {
    unsafe fn return_address_at(&self, slot: StackPtr) -> CodeAddress {
        self.authenticate(slot, slot.read())
    }

    unsafe fn patch_return_address_at(&self, slot: StackPtr, pc: CodeAddress) {
        slot.write(self.sign(slot, pc))
    }
}
