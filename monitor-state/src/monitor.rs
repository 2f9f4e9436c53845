use std::fmt::{Debug, Error, Formatter};

use parking_lot::RwLock;

use crate::object::ObjectRef;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct JavaThreadId(pub u64);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MonitorOwner {
    Unowned,
    //inflated by a contender while the real owner still had it fast locked
    Anonymous,
    Thread(JavaThreadId),
}

pub struct ObjectMonitor {
    object: ObjectRef,
    owner: RwLock<MonitorOwner>,
}

impl Debug for ObjectMonitor {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "[ObjectMonitor:{:?} owner:{:?}]", self.object, *self.owner.read())
    }
}

impl ObjectMonitor {
    pub fn new(object: ObjectRef, owner: MonitorOwner) -> Self {
        Self {
            object,
            owner: RwLock::new(owner),
        }
    }

    pub fn object(&self) -> ObjectRef {
        self.object
    }

    pub fn owner(&self) -> MonitorOwner {
        *self.owner.read()
    }

    pub fn is_owner_anonymous(&self) -> bool {
        self.owner() == MonitorOwner::Anonymous
    }

    pub fn is_owner(&self, tid: JavaThreadId) -> bool {
        self.owner() == MonitorOwner::Thread(tid)
    }

    /// The one transition other threads may make while the owner is suspended: an anonymous owner
    /// becomes concrete. The reverse never happens while the owner holds the lock.
    pub fn set_owner_from_anonymous(&self, tid: JavaThreadId) {
        let mut owner = self.owner.write();
        assert_eq!(*owner, MonitorOwner::Anonymous, "only an anonymous owner can be made concrete");
        *owner = MonitorOwner::Thread(tid);
    }
}
