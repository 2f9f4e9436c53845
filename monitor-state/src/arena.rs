use std::mem::{align_of, size_of};

use crate::monitor::{MonitorOwner, ObjectMonitor};
use crate::object::{MarkWord, ObjectHeader, ObjectRef};

/// Compressed reference encoding: `address = base + (narrow << shift)`, zero is null.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NarrowOopEncoding {
    pub base: usize,
    pub shift: u32,
}

impl NarrowOopEncoding {
    pub fn encode(&self, obj: Option<ObjectRef>) -> u32 {
        match obj {
            None => 0,
            Some(obj) => {
                let delta = obj.address() - self.base;
                assert_eq!(delta & ((1 << self.shift) - 1), 0, "{:?} is not aligned for this encoding", obj);
                let narrow = delta >> self.shift;
                assert!(narrow != 0 && narrow <= u32::MAX as usize, "{:?} is outside the compressed heap", obj);
                narrow as u32
            }
        }
    }

    /// # Safety
    /// `narrow` must have been produced by `encode` for an object that is still live.
    pub unsafe fn decode(&self, narrow: u32) -> Option<ObjectRef> {
        if narrow == 0 {
            return None;
        }
        ObjectRef::from_address(self.base + ((narrow as usize) << self.shift))
    }
}

/// Fixed capacity object storage. Objects never move, so references handed out stay valid for
/// the arena's lifetime. Inflated monitors are owned here too.
pub struct ObjectArena {
    objects: Box<[ObjectHeader]>,
    allocated: usize,
    monitors: Vec<Box<ObjectMonitor>>,
}

impl ObjectArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: (0..capacity).map(|_| ObjectHeader::new()).collect(),
            allocated: 0,
            monitors: vec![],
        }
    }

    pub fn allocate(&mut self) -> ObjectRef {
        assert!(self.allocated < self.objects.len(), "object arena exhausted at {} objects", self.allocated);
        let res = ObjectRef::from_header(&self.objects[self.allocated]);
        self.allocated += 1;
        res
    }

    pub fn fast_lock(&self, obj: ObjectRef) {
        assert!(self.owns(obj));
        obj.header().set_mark(MarkWord::fast_locked());
    }

    pub fn inflate(&mut self, obj: ObjectRef, owner: MonitorOwner) -> &ObjectMonitor {
        assert!(self.owns(obj));
        let monitor = Box::new(ObjectMonitor::new(obj, owner));
        obj.header().set_mark(MarkWord::encode_monitor(&monitor));
        self.monitors.push(monitor);
        let last = self.monitors.len() - 1;
        &self.monitors[last]
    }

    pub fn owns(&self, obj: ObjectRef) -> bool {
        let start = self.objects.as_ptr() as usize;
        let end = start + self.allocated * size_of::<ObjectHeader>();
        (start..end).contains(&obj.address())
    }

    /// Encoding under which every object in this arena compresses to a non zero value.
    pub fn narrow_encoding(&self) -> NarrowOopEncoding {
        let shift = align_of::<ObjectHeader>().trailing_zeros();
        assert_eq!(size_of::<ObjectHeader>(), 1 << shift);
        NarrowOopEncoding {
            base: self.objects.as_ptr() as usize - size_of::<ObjectHeader>(),
            shift,
        }
    }
}
