use frame_layout_common::{CodeAddress, StackPtr};
use monitor_state::ObjectRef;

use crate::frame::Frame;
use crate::frame_kind::FrameKind;
use crate::verify::VerificationError;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TracingSettings {
    pub trace_classification: bool,
    pub trace_monitor_fixup: bool,
    pub trace_return_patch: bool,
    pub trace_verification: bool,
}

impl TracingSettings {
    pub fn new() -> Self {
        TracingSettings {
            trace_classification: false,
            trace_monitor_fixup: true,
            trace_return_patch: false,
            trace_verification: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            trace_classification: false,
            trace_monitor_fixup: false,
            trace_return_patch: false,
            trace_verification: false,
        }
    }

    pub fn trace_classification(&self, f: &Frame, kind: FrameKind) {
        if self.trace_classification {
            println!("[Classified {} frame {} at sp {:?}]", kind, f.cb().name(), f.sp());
        }
    }

    pub fn trace_monitor_fixup(&self, f: &Frame, obj: ObjectRef, newly_added: bool) {
        if self.trace_monitor_fixup {
            if newly_added {
                println!("[Monitor fixup {:?} held in {} at sp {:?}]", obj, f.cb().name(), f.sp());
            } else {
                println!("[Monitor fixup {:?} already recorded]", obj);
            }
        }
    }

    pub fn trace_return_patch(&self, slot: StackPtr, old: CodeAddress, new: CodeAddress) {
        if self.trace_return_patch {
            println!("[Patched return address at {:?}: {:?} -> {:?}]", slot, old, new);
        }
    }

    pub fn trace_verification(&self, frames: usize, res: &Result<usize, VerificationError>) {
        if self.trace_verification {
            match res {
                Ok(count) => println!("[Verified {} monitor fixups over {} frames]", count, frames),
                Err(err) => println!("[Monitor fixup verification failed over {} frames: {}]", frames, err),
            }
        }
    }
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self::disabled()
    }
}
