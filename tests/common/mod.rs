#![allow(dead_code)]

use std::sync::Arc;

use code_metadata::{CodeBlob, CodeCache, CompiledMethod, InterpreterOopMap, Location, Method, MethodFlags, MonitorValue, ScopeDesc, ScopeValue, VMReg};
use continuation_helper::options::ContinuationOptions;
use frame_layout_common::CodeAddress;
use monitor_state::{JavaThreadId, JavaThreadSnapshot, ObjectArena, ObjectRef};

pub const INTERPRETER_START: CodeAddress = CodeAddress(0x1000);
pub const INTERPRETER_END: CodeAddress = CodeAddress(0x2000);

// Worker.run, compiled with Worker.inner inlined
pub const RUN_MONITORS_PC: CodeAddress = CodeAddress(0x4010);
pub const RUN_CONSTANT_PC: CodeAddress = CodeAddress(0x4020);
pub const RUN_CALL_RETURN_PC: CodeAddress = CodeAddress(0x4030);
pub const RUN_DEOPT_HANDLER: CodeAddress = CodeAddress(0x43f0);
pub const RUN_DEOPT_MH_HANDLER: CodeAddress = CodeAddress(0x43f8);
pub const RUN_FRAME_SIZE: usize = 10;
pub const RUN_STACK_ARGSIZE: usize = 2;
// register the inlined scope keeps its first lock owner in
pub const RUN_OWNER_REG: VMReg = VMReg(2);

pub const LEAF_PC: CodeAddress = CodeAddress(0x4810);
pub const NATIVE_SYNC_PC: CodeAddress = CodeAddress(0x5010);
pub const NATIVE_PLAIN_PC: CodeAddress = CodeAddress(0x5110);
pub const NATIVE_RECEIVER_OFFSET: usize = 1;
pub const BOTTOM_RETURN_PC: CodeAddress = CodeAddress(0x7f00);

// Worker.loop bytecode indices with oop maps
pub const LOOP_BCI_EMPTY: u16 = 0;
pub const LOOP_BCI_TWO_DEEP: u16 = 7;
pub const LOOP_BCI_FOUR_DEEP: u16 = 9;

pub struct Fixture {
    pub code_cache: CodeCache,
    pub arena: ObjectArena,
    pub constant_lock: ObjectRef,
    pub looping: Arc<Method>,
    pub interpreter: Arc<CodeBlob>,
    pub run: Arc<CodeBlob>,
    pub leaf: Arc<CodeBlob>,
    pub native_sync: Arc<CodeBlob>,
    pub native_plain: Arc<CodeBlob>,
    pub stub: Arc<CodeBlob>,
    pub adapter: Arc<CodeBlob>,
}

fn range(start: usize, end: usize) -> std::ops::Range<CodeAddress> {
    CodeAddress(start)..CodeAddress(end)
}

impl Fixture {
    pub fn new() -> Self {
        let mut arena = ObjectArena::with_capacity(32);
        let constant_lock = arena.allocate();
        let mut code_cache = CodeCache::new();

        let looping = code_cache.add_method(Method::new("Worker.loop", 2, 3, MethodFlags::default())
            .with_oop_map(InterpreterOopMap::new(LOOP_BCI_EMPTY, vec![true, false, false], vec![]))
            .with_oop_map(InterpreterOopMap::new(LOOP_BCI_TWO_DEEP, vec![true, false, true], vec![true, false]))
            .with_oop_map(InterpreterOopMap::new(LOOP_BCI_FOUR_DEEP, vec![false, false, false], vec![true, true, true, true])));
        let run_method = code_cache.add_method(Method::new("Worker.run", 1, 4, MethodFlags::default()));
        let inner_method = code_cache.add_method(Method::new("Worker.inner", 1, 2, MethodFlags::default()));
        let leaf_method = code_cache.add_method(Method::new("Worker.leaf", 0, 0, MethodFlags::default()));
        let native_sync_method = code_cache.add_method(Method::new("Worker.nativeSync", 1, 0, MethodFlags { is_native: true, is_synchronized: true, is_static: false }));
        let native_plain_method = code_cache.add_method(Method::new("Worker.nativePlain", 1, 0, MethodFlags { is_native: true, ..MethodFlags::default() }));

        let outer = Arc::new(ScopeDesc::new(run_method.clone(), 20, vec![
            MonitorValue::new(ScopeValue::Location(Location::Stack(2))),
            MonitorValue::eliminated(ScopeValue::Location(Location::Stack(3))),
        ]));
        let inner = Arc::new(ScopeDesc::new(inner_method, 4, vec![
            MonitorValue::new(ScopeValue::Location(Location::Register(RUN_OWNER_REG))),
            MonitorValue::new(ScopeValue::Location(Location::Stack(4))),
        ]).inlined_into(outer));
        let constant = Arc::new(ScopeDesc::new(run_method.clone(), 30, vec![
            MonitorValue::new(ScopeValue::ConstantOop(Some(constant_lock))),
            MonitorValue::new(ScopeValue::Location(Location::NarrowStack(5))),
        ]));
        let call_return = Arc::new(ScopeDesc::new(run_method.clone(), 40, vec![]));
        let run_compiled = CompiledMethod::new(run_method, RUN_STACK_ARGSIZE)
            .with_pc_desc(RUN_MONITORS_PC, inner)
            .with_pc_desc(RUN_CONSTANT_PC, constant)
            .with_pc_desc(RUN_CALL_RETURN_PC, call_return)
            .with_deopt_handlers(RUN_DEOPT_HANDLER, Some(RUN_DEOPT_MH_HANDLER));
        let leaf_compiled = CompiledMethod::new(leaf_method.clone(), 0)
            .with_pc_desc(LEAF_PC, Arc::new(ScopeDesc::new(leaf_method, 0, vec![])));

        let interpreter = code_cache.add_blob(CodeBlob::interpreter(INTERPRETER_START..INTERPRETER_END)).unwrap();
        let run = code_cache.add_blob(CodeBlob::compiled(range(0x4000, 0x4400), RUN_FRAME_SIZE, run_compiled)).unwrap();
        let leaf = code_cache.add_blob(CodeBlob::compiled(range(0x4800, 0x4900), 4, leaf_compiled)).unwrap();
        let native_sync = code_cache.add_blob(CodeBlob::compiled(range(0x5000, 0x5100), 6, CompiledMethod::new(native_sync_method, 0)
            .with_native_receiver_sp_offset(NATIVE_RECEIVER_OFFSET))).unwrap();
        let native_plain = code_cache.add_blob(CodeBlob::compiled(range(0x5100, 0x5200), 4, CompiledMethod::new(native_plain_method, 0))).unwrap();
        let stub = code_cache.add_blob(CodeBlob::runtime_stub("resolve_virtual_call", range(0x6000, 0x6100), 4)).unwrap();
        let adapter = code_cache.add_blob(CodeBlob::adapter("i2c_adapter", range(0x7000, 0x7100), 4)).unwrap();

        Self { code_cache, arena, constant_lock, looping, interpreter, run, leaf, native_sync, native_plain, stub, adapter }
    }

    pub fn options(&self) -> ContinuationOptions {
        ContinuationOptions::test_options().with_narrow_oops(self.arena.narrow_encoding())
    }

    pub fn fast_locked(&mut self) -> ObjectRef {
        let obj = self.arena.allocate();
        self.arena.fast_lock(obj);
        obj
    }
}

pub fn thread() -> JavaThreadSnapshot {
    JavaThreadSnapshot::new(JavaThreadId(1))
}

pub const OTHER_THREAD: JavaThreadId = JavaThreadId(2);
