use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use code_metadata::{CodeBlob, CodeCache, Method, MethodId};
use frame_layout_common::{BASIC_OBJECT_LOCK_OBJ_OFFSET, BASIC_OBJECT_LOCK_WORDS, CodeAddress, FramePointerOffset, INTERPRETER_FRAME_BCI_OFFSET, INTERPRETER_FRAME_LOCALS_OFFSET, INTERPRETER_FRAME_METHOD_OFFSET, INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET, INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET, StackPtr};
use monitor_state::{NarrowOopEncoding, ObjectRef};

use crate::stack_chunk::StackChunk;

#[derive(Debug, Copy, Clone)]
pub enum FrameLocation<'c> {
    NativeStack,
    // frame already copied into a chunk, header pointers are stored fp relative
    Heap(&'c StackChunk),
}

/// Non owning view of one activation record. The borrow keeps the view from outliving the stack
/// memory and code metadata it points into.
#[derive(Clone)]
pub struct Frame<'c> {
    sp: StackPtr,
    unextended_sp: StackPtr,
    fp: StackPtr,
    pc: CodeAddress,
    cb: &'c CodeBlob,
    code_cache: &'c CodeCache,
    location: FrameLocation<'c>,
}

impl<'c> Frame<'c> {
    /// # Safety
    /// Every word between `unextended_sp` and the frame's bottom, and the frame's header, must stay
    /// resident and unmodified by any other party for `'c`.
    pub unsafe fn new(sp: StackPtr, unextended_sp: StackPtr, fp: StackPtr, pc: CodeAddress, code_cache: &'c CodeCache, location: FrameLocation<'c>) -> Self {
        let cb = match code_cache.find_blob(pc) {
            Some(cb) => cb.as_ref(),
            None => panic!("frame at sp {:?} has pc {:?} outside the code cache", sp, pc),
        };
        Self { sp, unextended_sp, fp, pc, cb, code_cache, location }
    }

    pub fn sp(&self) -> StackPtr {
        self.sp
    }

    pub fn unextended_sp(&self) -> StackPtr {
        self.unextended_sp
    }

    pub fn fp(&self) -> StackPtr {
        self.fp
    }

    pub fn pc(&self) -> CodeAddress {
        self.pc
    }

    pub fn cb(&self) -> &'c CodeBlob {
        self.cb
    }

    pub fn code_cache(&self) -> &'c CodeCache {
        self.code_cache
    }

    pub fn location(&self) -> FrameLocation<'c> {
        self.location
    }

    pub fn is_heap_frame(&self) -> bool {
        matches!(self.location, FrameLocation::Heap(_))
    }

    pub fn is_interpreted_frame(&self) -> bool {
        self.cb.is_interpreter()
    }

    pub fn at(&self, offset: FramePointerOffset) -> StackPtr {
        self.fp.offset(offset.0)
    }

    fn read_at(&self, offset: FramePointerOffset) -> usize {
        unsafe { self.at(offset).read() }
    }

    // heap frames keep header pointers as word offsets from fp so that the chunk can move
    fn interpreter_frame_pointer(&self, offset: FramePointerOffset) -> StackPtr {
        let raw = self.read_at(offset);
        match self.location {
            FrameLocation::Heap(_) => self.fp.offset(raw as isize),
            FrameLocation::NativeStack => match StackPtr::from_address(raw) {
                Some(ptr) => ptr,
                None => panic!("null interpreter frame pointer at fp{:+} in frame {:?}", offset.0, self),
            },
        }
    }

    fn assert_interpreted(&self) {
        assert!(self.is_interpreted_frame(), "not an interpreted frame: {:?}", self);
    }

    /// Address of local 0. Local `i` lives at `locals - i`.
    pub fn interpreter_frame_locals(&self) -> StackPtr {
        self.assert_interpreted();
        self.interpreter_frame_pointer(INTERPRETER_FRAME_LOCALS_OFFSET)
    }

    /// Lowest address of the monitor block, the most recently entered monitor.
    pub fn interpreter_frame_monitor_end(&self) -> StackPtr {
        self.assert_interpreted();
        self.interpreter_frame_pointer(INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET)
    }

    pub fn interpreter_frame_monitor_begin(&self) -> StackPtr {
        self.assert_interpreted();
        self.at(INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET)
    }

    pub fn interpreter_frame_method(&self) -> &'c Arc<Method> {
        self.assert_interpreted();
        self.code_cache.method(MethodId(self.read_at(INTERPRETER_FRAME_METHOD_OFFSET)))
    }

    pub fn interpreter_frame_bci(&self) -> u16 {
        self.assert_interpreted();
        let bci = self.read_at(INTERPRETER_FRAME_BCI_OFFSET);
        match u16::try_from(bci) {
            Ok(bci) => bci,
            Err(_) => panic!("corrupt bci {} in frame {:?}", bci, self),
        }
    }

    /// Depth of the expression stack as recorded by the frame itself.
    pub fn interpreter_frame_expression_stack_size(&self) -> usize {
        self.interpreter_frame_monitor_end().words_from(self.unextended_sp)
    }

    /// Owner slots of the frame's monitors, most recently entered first.
    pub fn interpreter_frame_monitor_owner_slots(&self) -> impl Iterator<Item=StackPtr> {
        let begin = self.interpreter_frame_monitor_begin();
        let end = self.interpreter_frame_monitor_end();
        assert!(end <= begin, "monitor block end {:?} above its begin {:?}", end, begin);
        let monitors = begin.words_from(end) / BASIC_OBJECT_LOCK_WORDS;
        (0..monitors).map(move |i| end.add(i * BASIC_OBJECT_LOCK_WORDS + BASIC_OBJECT_LOCK_OBJ_OFFSET))
    }

    /// The method this frame executes: the one in the interpreter header, or the compiled method's.
    pub fn method(&self) -> &'c Arc<Method> {
        if self.is_interpreted_frame() {
            self.interpreter_frame_method()
        } else {
            self.cb.as_compiled_method().method()
        }
    }

    pub fn load_oop(&self, slot: StackPtr) -> Option<ObjectRef> {
        unsafe {
            match self.location {
                FrameLocation::Heap(chunk) => chunk.load_oop(slot),
                FrameLocation::NativeStack => ObjectRef::from_address(slot.read()),
            }
        }
    }

    /// Encoding for references the compiler stored compressed. Heap frames use the chunk's own
    /// encoding when it has one.
    pub fn narrow_oop_encoding(&self, global: Option<NarrowOopEncoding>) -> Option<NarrowOopEncoding> {
        match self.location {
            FrameLocation::Heap(chunk) => chunk.narrow_oops().or(global),
            FrameLocation::NativeStack => global,
        }
    }

    pub fn load_narrow_oop(&self, slot: StackPtr, encoding: NarrowOopEncoding) -> Option<ObjectRef> {
        unsafe { encoding.decode((slot.read() & u32::MAX as usize) as u32) }
    }

    /// Receiver, or class mirror for static methods, spilled by a synchronized native wrapper.
    pub fn get_native_receiver(&self) -> Option<ObjectRef> {
        let offset = self.cb.as_compiled_method().native_receiver_sp_offset();
        self.load_oop(self.unextended_sp.add(offset))
    }

    pub fn compiled_frame_stack_argsize(&self) -> usize {
        self.cb.as_compiled_method_opt().map(|cm| cm.stack_argsize()).unwrap_or(0)
    }
}

impl Debug for Frame<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Frame {} sp:{:?} usp:{:?} fp:{:?} pc:{:?} heap:{}]", self.cb.name(), self.sp, self.unextended_sp, self.fp, self.pc, self.is_heap_frame())
    }
}
