use code_metadata::InterpreterOopMap;
use frame_layout_common::{INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET, StackPtr};

use crate::frame::Frame;
use crate::frame_kind::{FrameGeometry, MonitorScan, MonitorScanner, ReturnLinkage};
use crate::register_map::RegisterMap;

pub struct InterpretedFrame;

impl InterpretedFrame {
    pub fn is_instance(f: &Frame) -> bool {
        f.is_interpreted_frame()
    }

    /// Expression stack depth according to `mask`, checked against what the frame recorded.
    pub fn expression_stack_size(f: &Frame, mask: &InterpreterOopMap) -> usize {
        let size = mask.expression_stack_size();
        let recorded = f.interpreter_frame_expression_stack_size();
        assert!(size <= recorded,
                "oop map for {} at bci {} has {} expression stack slots, frame {:?} holds {}",
                f.interpreter_frame_method().name(), mask.bci(), size, f, recorded);
        size
    }

    pub fn frame_top_from_mask(f: &Frame, mask: &InterpreterOopMap) -> StackPtr {
        let size = Self::expression_stack_size(f, mask);
        let res = f.interpreter_frame_monitor_end().sub(size);
        assert!(res >= f.unextended_sp(), "{:?} below unextended sp of {:?}", res, f);
        res
    }
}

impl ReturnLinkage for InterpretedFrame {
    fn return_address_slot(&self, f: &Frame) -> StackPtr {
        f.at(INTERPRETER_FRAME_RETURN_ADDRESS_OFFSET)
    }
}

impl FrameGeometry for InterpretedFrame {
    fn frame_top(&self, f: &Frame, from_oop_map: bool) -> StackPtr {
        if from_oop_map {
            let method = f.interpreter_frame_method();
            Self::frame_top_from_mask(f, method.oop_map_at(f.interpreter_frame_bci()))
        } else {
            f.unextended_sp()
        }
    }

    fn frame_bottom(&self, f: &Frame) -> StackPtr {
        f.interpreter_frame_locals().add(1)
    }

    fn stack_argsize(&self, f: &Frame) -> usize {
        f.interpreter_frame_method().size_of_parameters()
    }
}

impl MonitorScanner for InterpretedFrame {
    fn monitors_to_fix(&self, scan: &mut MonitorScan, f: &Frame, _map: Option<&RegisterMap>) -> usize {
        f.interpreter_frame_monitor_owner_slots()
            .map(|slot| {
                let owner = f.load_oop(slot);
                scan.record(f, owner)
            })
            .sum()
    }
}
