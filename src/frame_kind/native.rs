use crate::frame::Frame;
use crate::frame_kind::{MonitorScan, MonitorScanner};
use crate::register_map::RegisterMap;

/// Compiled wrapper around a native method. A synchronized one holds exactly one lock, on its
/// receiver or class mirror.
pub struct NativeFrame;

impl NativeFrame {
    pub fn is_instance(f: &Frame) -> bool {
        f.cb().as_compiled_method_opt().map(|cm| cm.is_native_method()).unwrap_or(false)
    }
}

impl MonitorScanner for NativeFrame {
    fn monitors_to_fix(&self, scan: &mut MonitorScan, f: &Frame, _map: Option<&RegisterMap>) -> usize {
        let method = f.cb().as_compiled_method().method();
        if !method.is_synchronized() {
            return 0;
        }
        let obj = match f.get_native_receiver() {
            Some(obj) => obj,
            None => panic!("synchronized native {} has a null receiver in {:?}", method.name(), f),
        };
        let holds_lock = scan.thread.current_thread_holds_lock(obj);
        let entering = scan.is_entering(obj);
        if scan.thread.last_java_sp() == Some(f.sp()) {
            // still acquiring the receiver on entry to the wrapper
            assert!(entering && !holds_lock, "first frame {:?} must be entering {:?} without holding it", f, obj);
            return 0;
        }
        assert!(holds_lock && !entering, "thread {:?} must hold {:?} in {:?}", scan.thread.tid(), obj, f);
        if obj.mark().has_monitor() {
            return 0;
        }
        assert!(!f.is_heap_frame(), "native frame {:?} cannot live in a chunk", f);
        scan.insert(f, obj)
    }
}
