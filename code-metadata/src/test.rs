use std::sync::Arc;

use frame_layout_common::CodeAddress;

use crate::{CodeBlob, CodeBlobKind, CodeCache, CodeCacheError, CompiledMethod, InterpreterOopMap, Location, Method, MethodFlags, MonitorValue, ScopeDesc, ScopeValue, VMReg};

fn synchronized() -> MethodFlags {
    MethodFlags { is_synchronized: true, ..MethodFlags::default() }
}

fn native() -> MethodFlags {
    MethodFlags { is_native: true, ..MethodFlags::default() }
}

#[test]
fn methods_get_sequential_ids() {
    let mut code_cache = CodeCache::new();
    let first = code_cache.add_method(Method::new("first", 1, 2, MethodFlags::default()));
    let second = code_cache.add_method(Method::new("second", 0, 0, MethodFlags::default()));
    assert_ne!(first.id(), second.id());
    assert_eq!(code_cache.method(second.id()).name(), "second");
}

#[test]
fn blob_lookup_by_pc() {
    let mut code_cache = CodeCache::new();
    code_cache.add_blob(CodeBlob::interpreter(CodeAddress(0x1000)..CodeAddress(0x2000))).unwrap();
    let stub = code_cache.add_blob(CodeBlob::runtime_stub("resolve", CodeAddress(0x2000)..CodeAddress(0x2100), 4)).unwrap();
    assert!(code_cache.find_blob(CodeAddress(0x1fff)).unwrap().is_interpreter());
    assert_eq!(code_cache.find_blob(CodeAddress(0x2000)).unwrap().id(), stub.id());
    assert!(code_cache.find_blob(CodeAddress(0x2100)).is_none());
    assert!(code_cache.find_blob(CodeAddress(0x10)).is_none());
}

#[test]
fn overlapping_blobs_are_rejected() {
    let mut code_cache = CodeCache::new();
    code_cache.add_blob(CodeBlob::interpreter(CodeAddress(0x1000)..CodeAddress(0x2000))).unwrap();
    let err = code_cache.add_blob(CodeBlob::adapter("i2c", CodeAddress(0x1800)..CodeAddress(0x2800), 2)).unwrap_err();
    assert_eq!(err, CodeCacheError::Overlap { name: "i2c".to_string(), existing: "Interpreter".to_string() });
    let err = code_cache.add_blob(CodeBlob::adapter("empty", CodeAddress(0x3000)..CodeAddress(0x3000), 2)).unwrap_err();
    assert_eq!(err, CodeCacheError::EmptyRange { name: "empty".to_string() });
}

#[test]
fn scope_chain_is_innermost_first() {
    let outer_method = Arc::new(Method::new("outer", 1, 3, MethodFlags::default()));
    let inner_method = Arc::new(Method::new("inner", 1, 1, MethodFlags::default()));
    let outer = Arc::new(ScopeDesc::new(outer_method, 12, vec![MonitorValue::new(ScopeValue::Location(Location::Stack(2)))]));
    let inner = ScopeDesc::new(inner_method, 3, vec![]).inlined_into(outer);
    let names = inner.chain().map(|scope| scope.method().name().to_string()).collect::<Vec<_>>();
    assert_eq!(names, vec!["inner".to_string(), "outer".to_string()]);
    assert_eq!(inner.sender().unwrap().bci(), 12);
}

#[test]
fn compiled_method_monitor_metadata() {
    let plain = Arc::new(Method::new("plain", 0, 2, MethodFlags::default()));
    let no_monitors = CompiledMethod::new(plain.clone(), 0)
        .with_pc_desc(CodeAddress(0x10), Arc::new(ScopeDesc::new(plain.clone(), 0, vec![])));
    assert!(!no_monitors.has_monitors());

    let locking = CompiledMethod::new(plain.clone(), 0)
        .with_pc_desc(CodeAddress(0x10), Arc::new(ScopeDesc::new(plain.clone(), 0, vec![MonitorValue::eliminated(ScopeValue::Location(Location::Register(VMReg(1))))])));
    assert!(locking.has_monitors());

    let sync = Arc::new(Method::new("sync", 0, 0, synchronized()));
    assert!(CompiledMethod::new(sync, 0).has_monitors());
}

#[test]
fn deopt_pcs() {
    let method = Arc::new(Method::new("m", 0, 0, MethodFlags::default()));
    let compiled = CompiledMethod::new(method, 0).with_deopt_handlers(CodeAddress(0x5080), Some(CodeAddress(0x5090)));
    assert!(compiled.is_deopt_pc(CodeAddress(0x5080)));
    assert!(compiled.is_deopt_pc(CodeAddress(0x5090)));
    assert!(!compiled.is_deopt_pc(CodeAddress(0x5000)));
}

#[test]
fn native_wrapper_kind() {
    let method = Arc::new(Method::new("nativeSync", 1, 0, native()));
    let wrapper = CodeBlob::compiled(CodeAddress(0x9000)..CodeAddress(0x9100), 6, CompiledMethod::new(method, 0).with_native_receiver_sp_offset(1));
    assert!(wrapper.is_compiled());
    assert!(wrapper.as_compiled_method().is_native_method());
    assert_eq!(wrapper.as_compiled_method().native_receiver_sp_offset(), 1);
    assert!(matches!(wrapper.kind(), CodeBlobKind::Compiled(_)));
    assert_eq!(wrapper.name(), "nativeSync");
}

#[test]
#[should_panic]
fn missing_pc_desc_is_fatal() {
    let method = Arc::new(Method::new("m", 0, 0, MethodFlags::default()));
    CompiledMethod::new(method, 0).scope_desc_at(CodeAddress(0x44));
}

#[test]
fn oop_map_expression_stack() {
    let method = Method::new("m", 1, 2, MethodFlags::default())
        .with_oop_map(InterpreterOopMap::new(4, vec![true, false], vec![true, true, false]));
    let mask = method.oop_map_at(4);
    assert_eq!(mask.expression_stack_size(), 3);
    assert_eq!(mask.number_of_entries(), 5);
    assert!(mask.is_oop(0));
    assert!(!mask.is_oop(1));
}
