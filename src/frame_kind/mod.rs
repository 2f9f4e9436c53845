use strum_macros::{Display, EnumIter};

use code_metadata::CodeBlob;
use frame_layout_common::StackPtr;
use monitor_state::{FixupTable, JavaThreadSnapshot, LockingMode, MonitorOwner, NarrowOopEncoding, ObjectRef};

use crate::frame::Frame;
use crate::register_map::RegisterMap;
use crate::tracing::TracingSettings;

pub mod interpreted;
pub mod non_interpreted;
pub mod compiled;
pub mod native;
pub mod stub;

pub use compiled::CompiledFrame;
pub use interpreted::InterpretedFrame;
pub use native::NativeFrame;
pub use non_interpreted::{NonInterpretedFrame, NonInterpretedUnknownFrame};
pub use stub::StubFrame;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, EnumIter, Display)]
pub enum FrameKind {
    Interpreted,
    Compiled,
    Native,
    Stub,
    NonInterpretedUnknown,
}

/// Where a frame keeps the address it returns to.
pub trait ReturnLinkage: Sync {
    fn return_address_slot(&self, f: &Frame) -> StackPtr;
}

pub trait FrameGeometry: Sync {
    /// Lowest word of the frame, inclusive. Interpreted frames can derive it from the oop map
    /// instead of trusting the recorded stack pointer.
    fn frame_top(&self, f: &Frame, from_oop_map: bool) -> StackPtr;

    /// One past the highest word of the frame.
    fn frame_bottom(&self, f: &Frame) -> StackPtr;

    fn frame_size(&self, f: &Frame, from_oop_map: bool) -> usize {
        self.frame_bottom(f).words_from(self.frame_top(f, from_oop_map))
    }

    /// Words of incoming arguments the frame shares with its caller.
    fn stack_argsize(&self, f: &Frame) -> usize;
}

pub trait MonitorScanner: Sync {
    /// Adds the frame's locks that need fixing to `scan.table` and returns how many were new.
    fn monitors_to_fix(&self, scan: &mut MonitorScan, f: &Frame, map: Option<&RegisterMap>) -> usize;
}

pub struct KindStrategy {
    pub linkage: &'static dyn ReturnLinkage,
    pub geometry: Option<&'static dyn FrameGeometry>,
    pub monitors: Option<&'static dyn MonitorScanner>,
}

static INTERPRETED: KindStrategy = KindStrategy {
    linkage: &InterpretedFrame,
    geometry: Some(&InterpretedFrame),
    monitors: Some(&InterpretedFrame),
};

static COMPILED: KindStrategy = KindStrategy {
    linkage: &NonInterpretedFrame,
    geometry: Some(&NonInterpretedFrame),
    monitors: Some(&CompiledFrame),
};

static NATIVE: KindStrategy = KindStrategy {
    linkage: &NonInterpretedFrame,
    geometry: Some(&NonInterpretedFrame),
    monitors: Some(&NativeFrame),
};

static STUB: KindStrategy = KindStrategy {
    linkage: &NonInterpretedFrame,
    geometry: None,
    monitors: None,
};

static NON_INTERPRETED_UNKNOWN: KindStrategy = KindStrategy {
    linkage: &NonInterpretedFrame,
    geometry: Some(&NonInterpretedFrame),
    monitors: None,
};

impl FrameKind {
    pub fn strategy(&self) -> &'static KindStrategy {
        match self {
            FrameKind::Interpreted => &INTERPRETED,
            FrameKind::Compiled => &COMPILED,
            FrameKind::Native => &NATIVE,
            FrameKind::Stub => &STUB,
            FrameKind::NonInterpretedUnknown => &NON_INTERPRETED_UNKNOWN,
        }
    }

    pub fn is_instance(&self, f: &Frame) -> bool {
        match self {
            FrameKind::Interpreted => InterpretedFrame::is_instance(f),
            FrameKind::Compiled => CompiledFrame::is_instance(f),
            FrameKind::Native => NativeFrame::is_instance(f),
            FrameKind::Stub => StubFrame::is_instance(f),
            FrameKind::NonInterpretedUnknown => NonInterpretedUnknownFrame::is_instance(f),
        }
    }
}

/// Order matters: the finer non interpreted kinds are tried before the catch all.
pub fn classify(f: &Frame) -> FrameKind {
    if InterpretedFrame::is_instance(f) {
        FrameKind::Interpreted
    } else if StubFrame::is_instance(f) {
        FrameKind::Stub
    } else if NativeFrame::is_instance(f) {
        FrameKind::Native
    } else if CompiledFrame::is_instance(f) {
        FrameKind::Compiled
    } else {
        FrameKind::NonInterpretedUnknown
    }
}

pub fn is_stub(cb: &CodeBlob) -> bool {
    cb.is_runtime_stub()
}

/// State shared by the scanners for one pass over a thread's frames.
pub struct MonitorScan<'s> {
    pub thread: &'s JavaThreadSnapshot,
    pub table: &'s mut FixupTable,
    pub locking_mode: LockingMode,
    pub narrow_oops: Option<NarrowOopEncoding>,
    pub tracing: &'s TracingSettings,
}

impl MonitorScan<'_> {
    fn is_entering(&self, obj: ObjectRef) -> bool {
        self.thread.monitorenter_object() == Some(obj)
    }

    // inflated locks are already recorded against their owner, only lock stack entries move
    fn owned_through_monitor(&self, f: &Frame, obj: ObjectRef) -> bool {
        let mark = obj.mark();
        if !mark.has_monitor() {
            return false;
        }
        let monitor = unsafe { mark.monitor() };
        match monitor.owner() {
            MonitorOwner::Anonymous => true,
            MonitorOwner::Thread(tid) if tid == self.thread.tid() => true,
            owner => panic!("{:?} in {:?} is owned by {:?}, not by thread {:?}", obj, f, owner, self.thread.tid()),
        }
    }

    fn insert(&mut self, f: &Frame, obj: ObjectRef) -> usize {
        let newly_added = self.table.put_if_absent(obj);
        self.tracing.trace_monitor_fixup(f, obj, newly_added);
        newly_added as usize
    }

    /// Rule shared by interpreted and compiled frames for one monitor slot.
    fn record(&mut self, f: &Frame, owner: Option<ObjectRef>) -> usize {
        let obj = match owner {
            Some(obj) => obj,
            None => return 0,
        };
        if self.is_entering(obj) || self.owned_through_monitor(f, obj) {
            return 0;
        }
        assert!(!f.is_heap_frame() || self.locking_mode == LockingMode::Lightweight,
                "{:?} needs fixing in heap frame {:?} under {} locking", obj, f, self.locking_mode);
        self.insert(f, obj)
    }
}

#[cfg(test)]
pub mod test;
