use strum_macros::{Display, EnumString};

pub mod object;
pub mod monitor;
pub mod thread;
pub mod arena;
pub mod fixup;


pub use arena::{NarrowOopEncoding, ObjectArena};
pub use fixup::FixupTable;
pub use monitor::{JavaThreadId, MonitorOwner, ObjectMonitor};
pub use object::{LockBits, MarkWord, ObjectHeader, ObjectRef};
pub use thread::{JavaThreadSnapshot, LockStack};

/// How uncontended locks are recorded. Only lightweight locking keeps fast-locked objects on the
/// per-thread lock stack, which is the only form allowed to need fixing inside a heap frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LockingMode {
    Legacy,
    #[default]
    Lightweight,
}
