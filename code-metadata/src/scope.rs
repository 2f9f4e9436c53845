use std::iter::successors;
use std::sync::Arc;

use monitor_state::ObjectRef;

use crate::method::Method;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct VMReg(pub u8);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Location {
    // word offset from the frame's unextended sp
    Stack(usize),
    // compressed reference in the low half of a stack slot
    NarrowStack(usize),
    // saved wherever the register map says
    Register(VMReg),
}

/// How the compiler describes a value at a safepoint. A monitor owner may be a constant or live in
/// a register, so it cannot always be read from a fixed frame slot.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ScopeValue {
    ConstantOop(Option<ObjectRef>),
    Location(Location),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MonitorValue {
    owner: ScopeValue,
    eliminated: bool,
}

impl MonitorValue {
    pub fn new(owner: ScopeValue) -> Self {
        Self { owner, eliminated: false }
    }

    /// Lock removed by escape analysis; it is never actually taken.
    pub fn eliminated(owner: ScopeValue) -> Self {
        Self { owner, eliminated: true }
    }

    pub fn owner(&self) -> &ScopeValue {
        &self.owner
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }
}

/// One inlining level at a pc. `sender` is the scope this one was inlined into.
#[derive(Debug)]
pub struct ScopeDesc {
    method: Arc<Method>,
    bci: u16,
    monitors: Vec<MonitorValue>,
    sender: Option<Arc<ScopeDesc>>,
}

impl ScopeDesc {
    pub fn new(method: Arc<Method>, bci: u16, monitors: Vec<MonitorValue>) -> Self {
        Self { method, bci, monitors, sender: None }
    }

    pub fn inlined_into(mut self, sender: Arc<ScopeDesc>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    pub fn bci(&self) -> u16 {
        self.bci
    }

    /// Monitors in acquisition order, outermost first.
    pub fn monitors(&self) -> &[MonitorValue] {
        self.monitors.as_slice()
    }

    pub fn sender(&self) -> Option<&ScopeDesc> {
        self.sender.as_deref()
    }

    /// This scope followed by every scope it was inlined into, innermost first.
    pub fn chain(&self) -> impl Iterator<Item=&ScopeDesc> {
        successors(Some(self), |scope| scope.sender())
    }
}
