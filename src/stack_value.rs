use code_metadata::{Location, ScopeValue};
use frame_layout_common::StackPtr;
use monitor_state::{NarrowOopEncoding, ObjectRef};

use crate::frame::Frame;
use crate::register_map::RegisterMap;

fn location_slot(f: &Frame, location: &Location, map: &RegisterMap) -> StackPtr {
    match location {
        Location::Stack(offset) | Location::NarrowStack(offset) => f.unextended_sp().add(*offset),
        Location::Register(reg) => match map.location(*reg) {
            Some(slot) => slot,
            None => panic!("{:?} was not saved for frame {:?}", reg, f),
        },
    }
}

/// Decodes a monitor owner as the compiler described it at the frame's pc.
pub fn resolve_owner(f: &Frame, value: &ScopeValue, map: &RegisterMap, narrow_oops: Option<NarrowOopEncoding>) -> Option<ObjectRef> {
    match value {
        ScopeValue::ConstantOop(obj) => *obj,
        ScopeValue::Location(location @ Location::NarrowStack(_)) => {
            let encoding = match f.narrow_oop_encoding(narrow_oops) {
                Some(encoding) => encoding,
                None => panic!("compressed owner in {:?} without a compressed oop encoding", f),
            };
            f.load_narrow_oop(location_slot(f, location, map), encoding)
        }
        ScopeValue::Location(location) => f.load_oop(location_slot(f, location, map)),
    }
}
