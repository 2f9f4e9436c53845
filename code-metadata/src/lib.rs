pub mod method;
pub mod scope;
pub mod code_blob;
pub mod code_cache;

#[cfg(test)]
pub mod test;

pub use code_blob::{CodeBlob, CodeBlobKind, CompiledMethod};
pub use code_cache::{CodeCache, CodeCacheError};
pub use method::{InterpreterOopMap, Method, MethodFlags};
pub use scope::{Location, MonitorValue, ScopeDesc, ScopeValue, VMReg};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct MethodId(pub usize);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub struct BlobId(pub usize);
