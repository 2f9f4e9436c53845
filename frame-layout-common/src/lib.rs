use std::fmt::{Debug, Formatter};
use std::mem::size_of;
use std::ptr::NonNull;

use memoffset::offset_of;

pub mod return_address;


pub const WORD_SIZE: usize = size_of::<usize>();

/// Word aligned address on a thread stack or inside a stack chunk. Stacks grow down, so
/// `add` moves towards callers and `sub` towards callees.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct StackPtr(NonNull<usize>);

impl StackPtr {
    pub fn new(ptr: *mut usize) -> Option<Self> {
        NonNull::new(ptr).map(StackPtr)
    }

    pub fn from_address(address: usize) -> Option<Self> {
        Self::new(address as *mut usize)
    }

    pub fn as_ptr(&self) -> *mut usize {
        self.0.as_ptr()
    }

    pub fn address(&self) -> usize {
        self.0.as_ptr() as usize
    }

    pub fn add(self, words: usize) -> Self {
        self.offset(words as isize)
    }

    pub fn sub(self, words: usize) -> Self {
        self.offset(-(words as isize))
    }

    pub fn offset(self, words: isize) -> Self {
        let res = self.0.as_ptr().wrapping_offset(words);
        match Self::new(res) {
            Some(res) => res,
            None => panic!("stack pointer arithmetic wrapped to null: {:?} {:+} words", self, words),
        }
    }

    /// Distance in words from `lower` up to `self`.
    pub fn words_from(self, lower: StackPtr) -> usize {
        assert!(lower <= self, "{:?} is above {:?}", lower, self);
        (self.address() - lower.address()) / WORD_SIZE
    }

    /// Signed distance in words from `base` to `self`, the form relativized frames store.
    pub fn relative_to(self, base: StackPtr) -> isize {
        (self.address() as isize - base.address() as isize) / WORD_SIZE as isize
    }

    /// # Safety
    /// the word must be resident and not concurrently written.
    pub unsafe fn read(self) -> usize {
        self.0.as_ptr().read()
    }

    /// # Safety
    /// the word must be resident and owned by the caller for the duration of the write.
    pub unsafe fn write(self, value: usize) {
        self.0.as_ptr().write(value)
    }
}

impl Debug for StackPtr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StackPtr({:#x})", self.address())
    }
}

/// Address of an instruction. Never dereferenced by this workspace.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct CodeAddress(pub usize);

impl CodeAddress {
    pub fn offset(self, bytes: usize) -> Self {
        CodeAddress(self.0 + bytes)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl Debug for CodeAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CodeAddress({:#x})", self.0)
    }
}

/// Word offset from a frame pointer.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FramePointerOffset(pub isize);

// lowest address first, fp points at sender_fp
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InterpreterFrameHeader {
    pub monitor_block_top: usize,
    pub bci: usize,
    pub locals: usize,
    pub method: usize,
    pub last_sp: usize,
    pub sender_sp: usize,
    pub sender_fp: usize,
    pub return_address: usize,
}

const fn interpreter_header_offset(field_offset: usize) -> FramePointerOffset {
    let fp_offset = offset_of!(InterpreterFrameHeader, sender_fp);
    FramePointerOffset((field_offset as isize - fp_offset as isize) / WORD_SIZE as isize)
}

pub const INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, return_address));
pub const INTERPRETER_FRAME_SENDER_FP_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, sender_fp));
pub const INTERPRETER_FRAME_SENDER_SP_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, sender_sp));
pub const INTERPRETER_FRAME_LAST_SP_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, last_sp));
pub const INTERPRETER_FRAME_METHOD_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, method));
pub const INTERPRETER_FRAME_LOCALS_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, locals));
pub const INTERPRETER_FRAME_BCI_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, bci));
pub const INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET: FramePointerOffset = interpreter_header_offset(offset_of!(InterpreterFrameHeader, monitor_block_top));
// monitor block starts directly below the header and grows down, exclusive upper bound
pub const INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET: FramePointerOffset = INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET;
pub const INTERPRETER_FRAME_HEADER_WORDS: usize = size_of::<InterpreterFrameHeader>() / WORD_SIZE;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BasicObjectLock {
    pub displaced_header: usize,
    pub obj: usize,
}

pub const BASIC_OBJECT_LOCK_WORDS: usize = size_of::<BasicObjectLock>() / WORD_SIZE;
pub const BASIC_OBJECT_LOCK_OBJ_OFFSET: usize = offset_of!(BasicObjectLock, obj) / WORD_SIZE;

// compiled and stub frames keep their linkage in the two highest words of the frame
pub const COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP: usize = 1;
pub const COMPILED_FRAME_SAVED_FP_FROM_SENDER_SP: usize = 2;
pub const COMPILED_FRAME_LINKAGE_WORDS: usize = 2;
