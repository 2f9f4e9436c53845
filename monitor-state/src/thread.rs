use frame_layout_common::StackPtr;

use crate::monitor::JavaThreadId;
use crate::object::ObjectRef;

/// Objects a thread has fast locked, oldest first.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LockStack {
    objects: Vec<ObjectRef>,
}

impl LockStack {
    pub fn new() -> Self {
        Self { objects: vec![] }
    }

    pub fn push(&mut self, obj: ObjectRef) {
        self.objects.push(obj);
    }

    pub fn contains(&self, obj: ObjectRef) -> bool {
        self.objects.contains(&obj)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&ObjectRef> {
        self.objects.iter()
    }
}

impl FromIterator<ObjectRef> for LockStack {
    fn from_iter<T: IntoIterator<Item=ObjectRef>>(iter: T) -> Self {
        Self { objects: iter.into_iter().collect() }
    }
}

/// Synchronization state of the thread whose stack is being inspected, captured while that thread
/// is quiescent.
#[derive(Debug, Clone)]
pub struct JavaThreadSnapshot {
    tid: JavaThreadId,
    last_java_sp: Option<StackPtr>,
    // object the thread is blocked entering, not yet held
    contended_enter: Option<ObjectRef>,
    lock_stack: LockStack,
}

impl JavaThreadSnapshot {
    pub fn new(tid: JavaThreadId) -> Self {
        Self {
            tid,
            last_java_sp: None,
            contended_enter: None,
            lock_stack: LockStack::new(),
        }
    }

    pub fn with_last_java_sp(mut self, last_java_sp: StackPtr) -> Self {
        self.last_java_sp = Some(last_java_sp);
        self
    }

    pub fn entering(mut self, obj: ObjectRef) -> Self {
        self.contended_enter = Some(obj);
        self
    }

    pub fn with_lock_stack(mut self, lock_stack: LockStack) -> Self {
        self.lock_stack = lock_stack;
        self
    }

    pub fn tid(&self) -> JavaThreadId {
        self.tid
    }

    pub fn last_java_sp(&self) -> Option<StackPtr> {
        self.last_java_sp
    }

    pub fn is_on_monitorenter(&self) -> bool {
        self.contended_enter.is_some()
    }

    pub fn monitorenter_object(&self) -> Option<ObjectRef> {
        self.contended_enter
    }

    pub fn lock_stack(&self) -> &LockStack {
        &self.lock_stack
    }

    pub fn current_thread_holds_lock(&self, obj: ObjectRef) -> bool {
        let mark = obj.mark();
        if mark.has_monitor() {
            let monitor = unsafe { mark.monitor() };
            if monitor.is_owner_anonymous() {
                return self.lock_stack.contains(obj);
            }
            return monitor.is_owner(self.tid);
        }
        mark.is_fast_locked() && self.lock_stack.contains(obj)
    }
}
