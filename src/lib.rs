use std::sync::Arc;

use code_metadata::{CodeBlob, InterpreterOopMap, Method};
use frame_layout_common::{CodeAddress, StackPtr};
use frame_layout_common::return_address::ReturnAddressAccessor;
use monitor_state::{FixupTable, JavaThreadSnapshot};

use crate::frame::Frame;
use crate::frame_kind::{FrameGeometry, FrameKind, InterpretedFrame, MonitorScan};
use crate::options::ContinuationOptions;
use crate::register_map::RegisterMap;
use crate::verify::{verify_monitor_fixups, VerificationError};

pub mod frame;
pub mod frame_kind;
pub mod options;
pub mod register_map;
pub mod stack_builder;
pub mod stack_chunk;
pub mod stack_value;
pub mod tracing;
pub mod verify;

/// Uniform access to frames of every kind for code that moves stacks between a thread and the
/// heap. Configured once; the return address strategy cannot change afterwards.
pub struct ContinuationHelper {
    options: ContinuationOptions,
    return_address: Box<dyn ReturnAddressAccessor>,
}

impl ContinuationHelper {
    pub fn new(options: ContinuationOptions) -> Self {
        let return_address = options.return_address.accessor();
        Self { options, return_address }
    }

    pub fn options(&self) -> &ContinuationOptions {
        &self.options
    }

    pub fn return_address_accessor(&self) -> &dyn ReturnAddressAccessor {
        self.return_address.as_ref()
    }

    pub fn classify(&self, f: &Frame) -> FrameKind {
        let kind = frame_kind::classify(f);
        self.options.tracing.trace_classification(f, kind);
        kind
    }

    pub fn is_stub(cb: &CodeBlob) -> bool {
        frame_kind::is_stub(cb)
    }

    pub fn frame_method<'c>(&self, f: &Frame<'c>) -> &'c Arc<Method> {
        f.method()
    }

    /// # Safety
    /// `slot` must be a return address slot in resident memory.
    pub unsafe fn return_address_at(&self, slot: StackPtr) -> CodeAddress {
        self.return_address.return_address_at(slot)
    }

    /// # Safety
    /// `slot` must be a return address slot in writable memory that no running thread is using.
    pub unsafe fn patch_return_address_at(&self, slot: StackPtr, pc: CodeAddress) {
        if self.options.tracing.trace_return_patch {
            let old = self.return_address.return_address_at(slot);
            self.options.tracing.trace_return_patch(slot, old, pc);
        }
        self.return_address.patch_return_address_at(slot, pc)
    }

    pub fn return_address_slot(&self, f: &Frame) -> StackPtr {
        self.classify(f).strategy().linkage.return_address_slot(f)
    }

    pub fn return_pc(&self, f: &Frame) -> CodeAddress {
        unsafe { self.return_address_at(self.return_address_slot(f)) }
    }

    /// # Safety
    /// The frame's stack must be writable and not in use by a running thread.
    pub unsafe fn patch_return_pc(&self, f: &Frame, pc: CodeAddress) {
        self.patch_return_address_at(self.return_address_slot(f), pc)
    }

    fn geometry(&self, f: &Frame) -> &'static dyn FrameGeometry {
        let kind = self.classify(f);
        match kind.strategy().geometry {
            Some(geometry) => geometry,
            None => panic!("{} frame {:?} has no geometry", kind, f),
        }
    }

    pub fn frame_top(&self, f: &Frame) -> StackPtr {
        self.geometry(f).frame_top(f, self.options.verification.verify_expression_stack)
    }

    /// Top of `f` when its callee is copied along with it. A compiled callee's incoming arguments
    /// live in the caller's frame and are copied with the callee instead.
    pub fn frame_top_with_callee(&self, f: &Frame, callee_argsize: usize, callee_interpreted: bool) -> StackPtr {
        // only to reject frames without geometry
        self.geometry(f);
        f.unextended_sp().add(if callee_interpreted { 0 } else { callee_argsize })
    }

    pub fn frame_bottom(&self, f: &Frame) -> StackPtr {
        self.geometry(f).frame_bottom(f)
    }

    pub fn frame_size(&self, f: &Frame) -> usize {
        self.geometry(f).frame_size(f, self.options.verification.verify_expression_stack)
    }

    pub fn stack_argsize(&self, f: &Frame) -> usize {
        self.geometry(f).stack_argsize(f)
    }

    pub fn expression_stack_size(&self, f: &Frame, mask: &InterpreterOopMap) -> usize {
        InterpretedFrame::expression_stack_size(f, mask)
    }

    /// Whether `pc`, the return address of `sender`'s callee, points at one of `sender`'s deopt
    /// handlers.
    pub fn is_deopt_return(&self, pc: CodeAddress, sender: &Frame) -> bool {
        if InterpretedFrame::is_instance(sender) {
            return false;
        }
        sender.cb().as_compiled_method().is_deopt_pc(pc)
    }

    /// Number of locks held by `f` newly added to `table`. Frames that cannot hold locks add none.
    pub fn monitors_to_fix(&self, thread: &JavaThreadSnapshot, map: Option<&RegisterMap>, f: &Frame, table: &mut FixupTable) -> usize {
        let kind = self.classify(f);
        let scanner = match kind.strategy().monitors {
            Some(scanner) => scanner,
            None => return 0,
        };
        let mut scan = MonitorScan {
            thread,
            table,
            locking_mode: self.options.locking_mode,
            narrow_oops: self.options.narrow_oops,
            tracing: &self.options.tracing,
        };
        scanner.monitors_to_fix(&mut scan, f, map)
    }

    /// Rescans `frames` and compares the result with the engine's bookkeeping. Returns the scanned
    /// count, or the engine's count untouched when continuation verification is off.
    pub fn verify_frame_monitors(&self, thread: &JavaThreadSnapshot, map: Option<&RegisterMap>, frames: &[Frame], engine_count: usize, engine_table: &FixupTable) -> Result<usize, VerificationError> {
        if !self.options.verification.verify_continuations {
            return Ok(engine_count);
        }
        let mut scanned_table = FixupTable::new();
        let scanned_count: usize = frames.iter()
            .map(|f| self.monitors_to_fix(thread, map, f, &mut scanned_table))
            .sum();
        let res = verify_monitor_fixups(engine_count, engine_table, scanned_count, &scanned_table).map(|()| scanned_count);
        self.options.tracing.trace_verification(frames.len(), &res);
        res
    }

    pub fn assert_frame_monitors(&self, thread: &JavaThreadSnapshot, map: Option<&RegisterMap>, frames: &[Frame], engine_count: usize, engine_table: &FixupTable) {
        if let Err(err) = self.verify_frame_monitors(thread, map, frames, engine_count, engine_table) {
            panic!("monitor fixup verification failed for thread {:?}: {}", thread.tid(), err);
        }
    }
}
