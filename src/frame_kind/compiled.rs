use crate::frame::Frame;
use crate::frame_kind::{MonitorScan, MonitorScanner};
use crate::register_map::RegisterMap;
use crate::stack_value::resolve_owner;

pub struct CompiledFrame;

impl CompiledFrame {
    pub fn is_instance(f: &Frame) -> bool {
        f.cb().as_compiled_method_opt().map(|cm| cm.is_java_method()).unwrap_or(false)
    }
}

impl MonitorScanner for CompiledFrame {
    fn monitors_to_fix(&self, scan: &mut MonitorScan, f: &Frame, map: Option<&RegisterMap>) -> usize {
        let cm = f.cb().as_compiled_method();
        if !cm.has_monitors() {
            return 0;
        }
        let map = match map {
            Some(map) => map,
            None => panic!("compiled frame {:?} holds monitors but no register map was given", f),
        };
        let mut count = 0;
        for scope in cm.scope_desc_at(f.pc()).chain() {
            for monitor in scope.monitors().iter().rev() {
                if monitor.is_eliminated() {
                    continue;
                }
                let owner = resolve_owner(f, monitor.owner(), map, scan.narrow_oops);
                count += scan.record(f, owner);
            }
        }
        count
    }
}
