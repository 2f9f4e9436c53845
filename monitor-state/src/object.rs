use std::fmt::{Debug, Formatter};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::monitor::ObjectMonitor;

pub const LOCK_BITS_MASK: usize = 0b11;

#[derive(Debug, Copy, Clone, Eq, PartialEq, FromPrimitive)]
pub enum LockBits {
    FastLocked = 0b00,
    Unlocked = 0b01,
    Inflated = 0b10,
    Marked = 0b11,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MarkWord(usize);

impl MarkWord {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn unlocked() -> Self {
        Self(LockBits::Unlocked as usize)
    }

    pub fn fast_locked() -> Self {
        Self(LockBits::FastLocked as usize)
    }

    pub fn encode_monitor(monitor: &ObjectMonitor) -> Self {
        let monitor_ptr = monitor as *const ObjectMonitor as usize;
        assert_eq!(monitor_ptr & LOCK_BITS_MASK, 0, "monitor must be word aligned");
        Self(monitor_ptr | LockBits::Inflated as usize)
    }

    pub fn raw(&self) -> usize {
        self.0
    }

    pub fn lock_bits(&self) -> LockBits {
        match LockBits::from_usize(self.0 & LOCK_BITS_MASK) {
            Some(bits) => bits,
            None => unreachable!(),
        }
    }

    pub fn is_fast_locked(&self) -> bool {
        self.lock_bits() == LockBits::FastLocked
    }

    pub fn is_unlocked(&self) -> bool {
        self.lock_bits() == LockBits::Unlocked
    }

    pub fn has_monitor(&self) -> bool {
        self.lock_bits() == LockBits::Inflated
    }

    /// # Safety
    /// the mark must have been read from a live object, and monitors are not deflated while a
    /// thread that holds them is being inspected.
    pub unsafe fn monitor<'m>(&self) -> &'m ObjectMonitor {
        assert!(self.has_monitor(), "{:?} is not inflated", self);
        &*((self.0 & !LOCK_BITS_MASK) as *const ObjectMonitor)
    }
}

impl Debug for MarkWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarkWord({:#x}, {:?})", self.0, self.lock_bits())
    }
}

#[repr(C)]
pub struct ObjectHeader {
    mark: AtomicUsize,
}

impl ObjectHeader {
    pub fn new() -> Self {
        Self { mark: AtomicUsize::new(MarkWord::unlocked().raw()) }
    }

    pub fn mark(&self) -> MarkWord {
        MarkWord(self.mark.load(Ordering::Acquire))
    }

    pub fn set_mark(&self, mark: MarkWord) {
        self.mark.store(mark.raw(), Ordering::Release)
    }
}

impl Default for ObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference to a heap object. Equality and hashing are by identity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectRef(NonNull<ObjectHeader>);

// heap objects are shared between threads, their headers are only touched atomically
unsafe impl Send for ObjectRef {}

unsafe impl Sync for ObjectRef {}

impl ObjectRef {
    /// # Safety
    /// a non zero address must point at a live object header that outlives every use of the
    /// returned reference.
    pub unsafe fn from_address(address: usize) -> Option<ObjectRef> {
        NonNull::new(address as *mut ObjectHeader).map(ObjectRef)
    }

    pub fn from_header(header: &ObjectHeader) -> ObjectRef {
        ObjectRef(NonNull::from(header))
    }

    pub fn address(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Raw slot value for an optional reference, null encoded as zero.
    pub fn to_raw(obj: Option<ObjectRef>) -> usize {
        obj.map(|obj| obj.address()).unwrap_or(0)
    }

    pub fn header(&self) -> &ObjectHeader {
        unsafe { self.0.as_ref() }
    }

    pub fn mark(&self) -> MarkWord {
        self.header().mark()
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectRef({:#x})", self.address())
    }
}
