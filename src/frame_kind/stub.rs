use crate::frame::Frame;
use crate::frame_kind::{is_stub, NonInterpretedFrame};

pub struct StubFrame;

impl StubFrame {
    pub fn is_instance(f: &Frame) -> bool {
        NonInterpretedFrame::is_instance(f) && is_stub(f.cb())
    }
}
