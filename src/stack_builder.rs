use std::ptr::NonNull;
use std::sync::Arc;

use code_metadata::{CodeBlob, CodeCache, Method};
use frame_layout_common::{BASIC_OBJECT_LOCK_OBJ_OFFSET, BASIC_OBJECT_LOCK_WORDS, CodeAddress, COMPILED_FRAME_LINKAGE_WORDS, COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP, COMPILED_FRAME_SAVED_FP_FROM_SENDER_SP, FramePointerOffset, INTERPRETER_FRAME_BCI_OFFSET, INTERPRETER_FRAME_HEADER_WORDS, INTERPRETER_FRAME_LAST_SP_OFFSET, INTERPRETER_FRAME_LOCALS_OFFSET, INTERPRETER_FRAME_METHOD_OFFSET, INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET, INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET, INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET, INTERPRETER_FRAME_SENDER_FP_OFFSET, INTERPRETER_FRAME_SENDER_SP_OFFSET, StackPtr};
use frame_layout_common::return_address::ReturnAddressAccessor;
use monitor_state::{NarrowOopEncoding, ObjectRef};

use crate::frame::{Frame, FrameLocation};
use crate::options::ContinuationOptions;
use crate::stack_chunk::StackChunk;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StackSlot {
    Word(usize),
    // stored the way the frame's location stores references
    Oop(Option<ObjectRef>),
    // always compressed, as compiled code may leave it
    NarrowOop(Option<ObjectRef>),
}

#[derive(Debug, Clone)]
pub struct InterpretedFrameSpec {
    method: Arc<Method>,
    bci: u16,
    locals: Vec<StackSlot>,
    monitors: Vec<Option<ObjectRef>>,
    expression_stack: Vec<StackSlot>,
    return_pc: CodeAddress,
}

impl InterpretedFrameSpec {
    pub fn new(method: Arc<Method>, bci: u16) -> Self {
        Self {
            method,
            bci,
            locals: vec![],
            monitors: vec![],
            expression_stack: vec![],
            return_pc: CodeAddress::default(),
        }
    }

    /// Local 0 first. Missing trailing locals are zeroed.
    pub fn with_locals(mut self, locals: Vec<StackSlot>) -> Self {
        self.locals = locals;
        self
    }

    /// Lock owners in the order they were entered.
    pub fn with_monitors(mut self, monitors: Vec<Option<ObjectRef>>) -> Self {
        self.monitors = monitors;
        self
    }

    /// Deepest entry first.
    pub fn with_expression_stack(mut self, expression_stack: Vec<StackSlot>) -> Self {
        self.expression_stack = expression_stack;
        self
    }

    pub fn returning_to(mut self, return_pc: CodeAddress) -> Self {
        self.return_pc = return_pc;
        self
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameHandle {
    sp: StackPtr,
    unextended_sp: StackPtr,
    fp: StackPtr,
    pc: CodeAddress,
}

impl FrameHandle {
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
}

/// Lays out synthetic frames, callers first, in memory it owns. Frames are views into that
/// memory, so they borrow the builder.
pub struct StackBuilder<'c> {
    code_cache: &'c CodeCache,
    return_address: Box<dyn ReturnAddressAccessor>,
    narrow_oops: Option<NarrowOopEncoding>,
    chunk: Option<StackChunk>,
    memory: NonNull<usize>,
    words: usize,
    // index of the lowest word in use, stacks grow down
    top: usize,
    last_fp: Option<StackPtr>,
}

impl<'c> StackBuilder<'c> {
    fn new(code_cache: &'c CodeCache, words: usize, chunk: Option<StackChunk>, options: &ContinuationOptions) -> Self {
        let memory: &mut [usize] = Box::leak(vec![0usize; words].into_boxed_slice());
        Self {
            code_cache,
            return_address: options.return_address.accessor(),
            narrow_oops: options.narrow_oops,
            chunk,
            memory: NonNull::from(memory).cast::<usize>(),
            words,
            top: words,
            last_fp: None,
        }
    }

    pub fn native_stack(code_cache: &'c CodeCache, words: usize, options: &ContinuationOptions) -> Self {
        Self::new(code_cache, words, None, options)
    }

    pub fn heap_chunk(code_cache: &'c CodeCache, words: usize, chunk: StackChunk, options: &ContinuationOptions) -> Self {
        Self::new(code_cache, words, Some(chunk), options)
    }

    fn ptr(&self, index: usize) -> StackPtr {
        assert!(index < self.words, "word {} outside the builder's {} words", index, self.words);
        match StackPtr::new(unsafe { self.memory.as_ptr().add(index) }) {
            Some(ptr) => ptr,
            None => panic!("null stack word"),
        }
    }

    fn allocate(&mut self, words: usize) -> usize {
        assert!(words <= self.top, "stack builder out of space: {} words requested, {} left", words, self.top);
        self.top -= words;
        self.top
    }

    fn caller_sp(&self) -> Option<StackPtr> {
        if self.top == self.words {
            None
        } else {
            Some(self.ptr(self.top))
        }
    }

    fn write_word(&self, slot: StackPtr, value: usize) {
        unsafe { slot.write(value) }
    }

    fn write_slot(&self, slot: StackPtr, value: StackSlot) {
        match value {
            StackSlot::Word(word) => self.write_word(slot, word),
            StackSlot::Oop(obj) => match &self.chunk {
                Some(chunk) => unsafe { chunk.store_oop(slot, obj) },
                None => self.write_word(slot, ObjectRef::to_raw(obj)),
            },
            StackSlot::NarrowOop(obj) => {
                let encoding = match self.chunk.and_then(|chunk| chunk.narrow_oops()).or(self.narrow_oops) {
                    Some(encoding) => encoding,
                    None => panic!("compressed slot without a compressed oop encoding"),
                };
                self.write_word(slot, encoding.encode(obj) as usize)
            }
        }
    }

    // heap frames keep header pointers fp relative
    fn write_frame_pointer(&self, fp: StackPtr, offset: FramePointerOffset, target: StackPtr) {
        let value = match self.chunk {
            Some(_) => target.relative_to(fp) as usize,
            None => target.address(),
        };
        self.write_word(fp.offset(offset.0), value)
    }

    fn write_return_pc(&self, slot: StackPtr, pc: CodeAddress) {
        unsafe { self.return_address.patch_return_address_at(slot, pc) }
    }

    pub fn push_interpreted(&mut self, spec: InterpretedFrameSpec) -> FrameHandle {
        let interpreter = match self.code_cache.blobs().find(|blob| blob.is_interpreter()) {
            Some(interpreter) => interpreter,
            None => panic!("code cache has no interpreter"),
        };
        let pc = interpreter.code().start;
        let max_locals = spec.method.max_locals();
        assert!(spec.locals.len() <= max_locals, "{} locals given for {} with max locals {}", spec.locals.len(), spec.method.name(), max_locals);
        let depth = spec.expression_stack.len();
        let monitor_words = spec.monitors.len() * BASIC_OBJECT_LOCK_WORDS;
        let caller_sp = self.caller_sp();

        let base = self.allocate(depth + monitor_words + INTERPRETER_FRAME_HEADER_WORDS + max_locals);
        let unextended_sp = self.ptr(base);
        let monitor_end = unextended_sp.add(depth);
        let fp = monitor_end.add(monitor_words).offset(-INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET.0);
        let locals = fp.offset(INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET.0).add(max_locals);

        for (i, local) in spec.locals.iter().enumerate() {
            self.write_slot(locals.sub(i), *local);
        }
        self.write_return_pc(fp.offset(INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET.0), spec.return_pc);
        self.write_word(fp.offset(INTERPRETER_FRAME_SENDER_FP_OFFSET.0), self.last_fp.map(|fp| fp.address()).unwrap_or(0));
        self.write_word(fp.offset(INTERPRETER_FRAME_SENDER_SP_OFFSET.0), caller_sp.map(|sp| sp.address()).unwrap_or(0));
        self.write_word(fp.offset(INTERPRETER_FRAME_LAST_SP_OFFSET.0), 0);
        self.write_word(fp.offset(INTERPRETER_FRAME_METHOD_OFFSET.0), spec.method.id().0);
        self.write_frame_pointer(fp, INTERPRETER_FRAME_LOCALS_OFFSET, locals);
        self.write_word(fp.offset(INTERPRETER_FRAME_BCI_OFFSET.0), spec.bci as usize);
        self.write_frame_pointer(fp, INTERPRETER_FRAME_MONITOR_BLOCK_TOP_OFFSET, monitor_end);

        let monitor_begin = fp.offset(INTERPRETER_FRAME_MONITOR_BLOCK_BOTTOM_OFFSET.0);
        for (i, owner) in spec.monitors.iter().enumerate() {
            let lock = monitor_begin.sub((i + 1) * BASIC_OBJECT_LOCK_WORDS);
            self.write_slot(lock.add(BASIC_OBJECT_LOCK_OBJ_OFFSET), StackSlot::Oop(*owner));
        }
        for (i, value) in spec.expression_stack.iter().enumerate() {
            self.write_slot(monitor_end.sub(i + 1), *value);
        }

        self.last_fp = Some(fp);
        FrameHandle { sp: unextended_sp, unextended_sp, fp, pc }
    }

    /// Frame of any blob whose size is fixed. `slots` are word offsets from the frame's sp, below
    /// the linkage words.
    pub fn push_non_interpreted(&mut self, blob: &CodeBlob, pc: CodeAddress, return_pc: CodeAddress, slots: Vec<(usize, StackSlot)>) -> FrameHandle {
        assert!(!blob.is_interpreter(), "interpreted frames are pushed with push_interpreted");
        assert!(blob.contains(pc), "{:?} is not in {}", pc, blob.name());
        let frame_size = blob.frame_size();
        assert!(frame_size >= COMPILED_FRAME_LINKAGE_WORDS, "{} is too small for its linkage", blob.name());
        let base = self.allocate(frame_size);
        let unextended_sp = self.ptr(base);
        for (offset, value) in slots {
            assert!(offset < frame_size - COMPILED_FRAME_LINKAGE_WORDS, "slot {} overlaps the linkage of {}", offset, blob.name());
            self.write_slot(unextended_sp.add(offset), value);
        }
        let fp = unextended_sp.add(frame_size - COMPILED_FRAME_SAVED_FP_FROM_SENDER_SP);
        self.write_word(fp, self.last_fp.map(|fp| fp.address()).unwrap_or(0));
        self.write_return_pc(unextended_sp.add(frame_size - COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP), return_pc);
        self.last_fp = Some(fp);
        FrameHandle { sp: unextended_sp, unextended_sp, fp, pc }
    }

    pub fn push_compiled(&mut self, blob: &CodeBlob, pc: CodeAddress, return_pc: CodeAddress, slots: Vec<(usize, StackSlot)>) -> FrameHandle {
        assert!(blob.as_compiled_method().is_java_method(), "{} is not a compiled java method", blob.name());
        self.push_non_interpreted(blob, pc, return_pc, slots)
    }

    pub fn push_native(&mut self, blob: &CodeBlob, pc: CodeAddress, return_pc: CodeAddress, receiver: Option<ObjectRef>) -> FrameHandle {
        let cm = blob.as_compiled_method();
        assert!(cm.is_native_method(), "{} is not a native wrapper", blob.name());
        let slots = if cm.method().is_synchronized() {
            vec![(cm.native_receiver_sp_offset(), StackSlot::Oop(receiver))]
        } else {
            vec![]
        };
        self.push_non_interpreted(blob, pc, return_pc, slots)
    }

    pub fn push_stub(&mut self, blob: &CodeBlob, return_pc: CodeAddress) -> FrameHandle {
        assert!(blob.is_runtime_stub(), "{} is not a runtime stub", blob.name());
        self.push_non_interpreted(blob, blob.code().start, return_pc, vec![])
    }

    pub fn frame(&self, handle: FrameHandle) -> Frame<'_> {
        let location = match &self.chunk {
            Some(chunk) => FrameLocation::Heap(chunk),
            None => FrameLocation::NativeStack,
        };
        unsafe { Frame::new(handle.sp, handle.unextended_sp, handle.fp, handle.pc, self.code_cache, location) }
    }
}

impl Drop for StackBuilder<'_> {
    fn drop(&mut self) {
        let memory = std::ptr::slice_from_raw_parts_mut(self.memory.as_ptr(), self.words);
        drop(unsafe { Box::from_raw(memory) });
    }
}
