use frame_layout_common::StackPtr;
use monitor_state::{NarrowOopEncoding, ObjectRef};

const NARROW_OOP_MASK: usize = u32::MAX as usize;

/// Decoding context for frames that have been copied into a heap chunk. Once a chunk has its
/// oop bitmap built, references in its frames are stored in the chunk's own encoding.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StackChunk {
    has_bitmap: bool,
    narrow_oops: Option<NarrowOopEncoding>,
}

impl StackChunk {
    pub fn new(has_bitmap: bool, narrow_oops: Option<NarrowOopEncoding>) -> Self {
        Self { has_bitmap, narrow_oops }
    }

    pub fn has_bitmap(&self) -> bool {
        self.has_bitmap
    }

    pub fn narrow_oops(&self) -> Option<NarrowOopEncoding> {
        self.narrow_oops
    }

    fn stored_narrow(&self) -> Option<NarrowOopEncoding> {
        if self.has_bitmap {
            self.narrow_oops
        } else {
            None
        }
    }

    /// # Safety
    /// `slot` must be a reference slot of a frame in this chunk.
    pub unsafe fn load_oop(&self, slot: StackPtr) -> Option<ObjectRef> {
        match self.stored_narrow() {
            Some(encoding) => encoding.decode((slot.read() & NARROW_OOP_MASK) as u32),
            None => ObjectRef::from_address(slot.read()),
        }
    }

    /// # Safety
    /// `slot` must be a writable reference slot of a frame in this chunk.
    pub unsafe fn store_oop(&self, slot: StackPtr, obj: Option<ObjectRef>) {
        match self.stored_narrow() {
            Some(encoding) => slot.write(encoding.encode(obj) as usize),
            None => slot.write(ObjectRef::to_raw(obj)),
        }
    }
}
