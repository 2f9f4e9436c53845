use std::ops::Range;
use std::sync::Arc;

use itertools::Itertools;
use rangemap::RangeMap;
use thiserror::Error;

use frame_layout_common::CodeAddress;

use crate::{BlobId, MethodId};
use crate::code_blob::CodeBlob;
use crate::method::Method;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CodeCacheError {
    #[error("code blob {name} has an empty code range")]
    EmptyRange { name: String },
    #[error("code blob {name} overlaps already registered code: {existing}")]
    Overlap { name: String, existing: String },
}

/// Every method and code blob a frame's pc or header can refer to.
#[derive(Debug, Default)]
pub struct CodeCache {
    methods: Vec<Arc<Method>>,
    blobs: Vec<Arc<CodeBlob>>,
    blobs_by_pc: RangeMap<CodeAddress, BlobId>,
}

impl CodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_method(&mut self, mut method: Method) -> Arc<Method> {
        method.set_id(MethodId(self.methods.len()));
        let res = Arc::new(method);
        self.methods.push(res.clone());
        res
    }

    pub fn method(&self, method_id: MethodId) -> &Arc<Method> {
        match self.methods.get(method_id.0) {
            Some(method) => method,
            None => panic!("unknown {:?}, {} methods registered", method_id, self.methods.len()),
        }
    }

    pub fn add_blob(&mut self, mut blob: CodeBlob) -> Result<Arc<CodeBlob>, CodeCacheError> {
        let code: Range<CodeAddress> = blob.code().clone();
        if code.is_empty() {
            return Err(CodeCacheError::EmptyRange { name: blob.name().to_string() });
        }
        if self.blobs_by_pc.overlaps(&code) {
            let existing = self.blobs_by_pc.overlapping(&code)
                .map(|(_, blob_id)| self.blobs[blob_id.0].name().to_string())
                .join(", ");
            return Err(CodeCacheError::Overlap { name: blob.name().to_string(), existing });
        }
        let blob_id = BlobId(self.blobs.len());
        blob.set_id(blob_id);
        let res = Arc::new(blob);
        self.blobs.push(res.clone());
        self.blobs_by_pc.insert(code, blob_id);
        Ok(res)
    }

    pub fn find_blob(&self, pc: CodeAddress) -> Option<&Arc<CodeBlob>> {
        self.blobs_by_pc.get(&pc).map(|blob_id| &self.blobs[blob_id.0])
    }

    pub fn blob_by_id(&self, blob_id: BlobId) -> &Arc<CodeBlob> {
        &self.blobs[blob_id.0]
    }

    pub fn blobs(&self) -> impl Iterator<Item=&Arc<CodeBlob>> {
        self.blobs.iter()
    }
}
