use std::sync::Arc;

use code_metadata::{CodeBlob, CodeCache, CompiledMethod, Method, MethodFlags};
use frame_layout_common::CodeAddress;
use monitor_state::{FixupTable, JavaThreadId, JavaThreadSnapshot, LockStack, MonitorOwner, ObjectArena};

use crate::frame_kind::{classify, FrameKind, MonitorScan};
use crate::options::ContinuationOptions;
use crate::stack_builder::{InterpretedFrameSpec, StackBuilder};
use crate::tracing::TracingSettings;

fn code_cache() -> (CodeCache, Arc<Method>) {
    let mut code_cache = CodeCache::new();
    let method = code_cache.add_method(Method::new("Probe.run", 0, 1, MethodFlags::default()));
    code_cache.add_blob(CodeBlob::interpreter(CodeAddress(0x100)..CodeAddress(0x200))).unwrap();
    code_cache.add_blob(CodeBlob::compiled(CodeAddress(0x200)..CodeAddress(0x300), 4, CompiledMethod::new(method.clone(), 0))).unwrap();
    (code_cache, method)
}

#[test]
fn kinds_have_matching_strategies() {
    assert!(FrameKind::Stub.strategy().geometry.is_none());
    assert!(FrameKind::Stub.strategy().monitors.is_none());
    assert!(FrameKind::NonInterpretedUnknown.strategy().monitors.is_none());
    assert!(FrameKind::Interpreted.strategy().geometry.is_some());
    assert!(FrameKind::Native.strategy().monitors.is_some());
}

#[test]
fn record_skips_consistent_locks() {
    let (code_cache, method) = code_cache();
    let mut arena = ObjectArena::with_capacity(4);
    let fast = arena.allocate();
    arena.fast_lock(fast);
    let anonymous = arena.allocate();
    arena.inflate(anonymous, MonitorOwner::Anonymous);
    let entering = arena.allocate();

    let options = ContinuationOptions::test_options();
    let mut builder = StackBuilder::native_stack(&code_cache, 64, &options);
    let handle = builder.push_interpreted(InterpretedFrameSpec::new(method, 0));
    let f = builder.frame(handle);
    assert_eq!(classify(&f), FrameKind::Interpreted);

    let thread = JavaThreadSnapshot::new(JavaThreadId(7))
        .with_lock_stack(LockStack::from_iter([fast, anonymous]))
        .entering(entering);
    let mut table = FixupTable::new();
    let tracing = TracingSettings::disabled();
    let mut scan = MonitorScan {
        thread: &thread,
        table: &mut table,
        locking_mode: options.locking_mode,
        narrow_oops: None,
        tracing: &tracing,
    };
    assert_eq!(scan.record(&f, None), 0);
    assert_eq!(scan.record(&f, Some(entering)), 0);
    assert_eq!(scan.record(&f, Some(anonymous)), 0);
    assert_eq!(scan.record(&f, Some(fast)), 1);
    assert_eq!(scan.record(&f, Some(fast)), 0);
    assert_eq!(table.len(), 1);
}
