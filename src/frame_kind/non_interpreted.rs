use frame_layout_common::{COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP, StackPtr};

use crate::frame::Frame;
use crate::frame_kind::{FrameGeometry, ReturnLinkage};

/// Geometry and linkage shared by every frame whose size is fixed by its code blob.
pub struct NonInterpretedFrame;

impl NonInterpretedFrame {
    pub fn is_instance(f: &Frame) -> bool {
        !f.is_interpreted_frame()
    }
}

impl ReturnLinkage for NonInterpretedFrame {
    fn return_address_slot(&self, f: &Frame) -> StackPtr {
        let frame_size = f.cb().frame_size();
        assert!(frame_size >= COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP, "{} has no room for linkage", f.cb().name());
        f.unextended_sp().add(frame_size - COMPILED_FRAME_RETURN_ADDRESS_FROM_SENDER_SP)
    }
}

impl FrameGeometry for NonInterpretedFrame {
    fn frame_top(&self, f: &Frame, _from_oop_map: bool) -> StackPtr {
        f.unextended_sp()
    }

    fn frame_bottom(&self, f: &Frame) -> StackPtr {
        f.unextended_sp().add(f.cb().frame_size())
    }

    fn frame_size(&self, f: &Frame, _from_oop_map: bool) -> usize {
        f.cb().frame_size()
    }

    fn stack_argsize(&self, f: &Frame) -> usize {
        f.compiled_frame_stack_argsize()
    }
}

/// Any frame that is not interpreted. Frames no finer kind claims, such as adapters, end up here.
pub struct NonInterpretedUnknownFrame;

impl NonInterpretedUnknownFrame {
    pub fn is_instance(f: &Frame) -> bool {
        NonInterpretedFrame::is_instance(f)
    }
}
