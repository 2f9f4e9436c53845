use std::collections::HashSet;

use itertools::Itertools;

use crate::object::ObjectRef;

/// Lock objects whose ownership bookkeeping has to be repaired once their frames move.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FixupTable {
    objects: HashSet<ObjectRef>,
}

impl FixupTable {
    pub fn new() -> Self {
        Self { objects: HashSet::new() }
    }

    /// Returns true if `obj` was not already present.
    pub fn put_if_absent(&mut self, obj: ObjectRef) -> bool {
        self.objects.insert(obj)
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

    /// Objects in `self` that are not in `other`, in address order.
    pub fn missing_from<'l>(&'l self, other: &'l FixupTable) -> impl Iterator<Item=ObjectRef> + 'l {
        self.objects.iter().filter(move |obj| !other.contains(**obj)).copied().sorted()
    }
}

impl FromIterator<ObjectRef> for FixupTable {
    fn from_iter<T: IntoIterator<Item=ObjectRef>>(iter: T) -> Self {
        Self { objects: iter.into_iter().collect() }
    }
}
