use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use frame_layout_common::CodeAddress;

use crate::BlobId;
use crate::method::Method;
use crate::scope::ScopeDesc;

#[derive(Debug)]
pub struct CompiledMethod {
    method: Arc<Method>,
    stack_argsize: usize,
    pc_descs: BTreeMap<CodeAddress, Arc<ScopeDesc>>,
    deopt_handler: Option<CodeAddress>,
    deopt_mh_handler: Option<CodeAddress>,
    // native wrappers spill the receiver (or class mirror) to this word offset from unextended sp
    native_receiver_sp_offset: Option<usize>,
}

impl CompiledMethod {
    pub fn new(method: Arc<Method>, stack_argsize: usize) -> Self {
        Self {
            method,
            stack_argsize,
            pc_descs: BTreeMap::new(),
            deopt_handler: None,
            deopt_mh_handler: None,
            native_receiver_sp_offset: None,
        }
    }

    pub fn with_pc_desc(mut self, pc: CodeAddress, scope: Arc<ScopeDesc>) -> Self {
        self.pc_descs.insert(pc, scope);
        self
    }

    pub fn with_deopt_handlers(mut self, deopt_handler: CodeAddress, deopt_mh_handler: Option<CodeAddress>) -> Self {
        self.deopt_handler = Some(deopt_handler);
        self.deopt_mh_handler = deopt_mh_handler;
        self
    }

    pub fn with_native_receiver_sp_offset(mut self, offset: usize) -> Self {
        assert!(self.method.is_native(), "only native wrappers save a receiver");
        self.native_receiver_sp_offset = Some(offset);
        self
    }

    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    pub fn is_native_method(&self) -> bool {
        self.method.is_native()
    }

    pub fn is_java_method(&self) -> bool {
        !self.method.is_native()
    }

    pub fn stack_argsize(&self) -> usize {
        self.stack_argsize
    }

    pub fn has_monitors(&self) -> bool {
        self.method.is_synchronized() || self.pc_descs.values().any(|scope| scope.chain().any(|scope| !scope.monitors().is_empty()))
    }

    pub fn scope_desc_at(&self, pc: CodeAddress) -> &ScopeDesc {
        match self.pc_descs.get(&pc) {
            Some(scope) => scope.as_ref(),
            None => panic!("no pc desc for {:?} in {}", pc, self.method.name()),
        }
    }

    pub fn is_deopt_pc(&self, pc: CodeAddress) -> bool {
        self.deopt_handler == Some(pc) || self.deopt_mh_handler == Some(pc)
    }

    pub fn native_receiver_sp_offset(&self) -> usize {
        match self.native_receiver_sp_offset {
            Some(offset) => offset,
            None => panic!("native wrapper for {} has no saved receiver", self.method.name()),
        }
    }
}

#[derive(Debug)]
pub enum CodeBlobKind {
    Interpreter,
    Compiled(CompiledMethod),
    RuntimeStub,
    Adapter,
}

#[derive(Debug)]
pub struct CodeBlob {
    id: BlobId,
    name: String,
    code: Range<CodeAddress>,
    // words, including the return address and saved fp
    frame_size: usize,
    kind: CodeBlobKind,
}

impl CodeBlob {
    pub fn new(name: impl Into<String>, code: Range<CodeAddress>, frame_size: usize, kind: CodeBlobKind) -> Self {
        Self {
            id: BlobId(usize::MAX),
            name: name.into(),
            code,
            frame_size,
            kind,
        }
    }

    pub fn interpreter(code: Range<CodeAddress>) -> Self {
        Self::new("Interpreter", code, 0, CodeBlobKind::Interpreter)
    }

    pub fn runtime_stub(name: impl Into<String>, code: Range<CodeAddress>, frame_size: usize) -> Self {
        Self::new(name, code, frame_size, CodeBlobKind::RuntimeStub)
    }

    pub fn adapter(name: impl Into<String>, code: Range<CodeAddress>, frame_size: usize) -> Self {
        Self::new(name, code, frame_size, CodeBlobKind::Adapter)
    }

    pub fn compiled(code: Range<CodeAddress>, frame_size: usize, compiled_method: CompiledMethod) -> Self {
        let name = compiled_method.method().name().to_string();
        Self::new(name, code, frame_size, CodeBlobKind::Compiled(compiled_method))
    }

    pub(crate) fn set_id(&mut self, id: BlobId) {
        self.id = id;
    }

    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn code(&self) -> &Range<CodeAddress> {
        &self.code
    }

    pub fn contains(&self, pc: CodeAddress) -> bool {
        self.code.contains(&pc)
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn kind(&self) -> &CodeBlobKind {
        &self.kind
    }

    pub fn is_interpreter(&self) -> bool {
        matches!(self.kind, CodeBlobKind::Interpreter)
    }

    pub fn is_runtime_stub(&self) -> bool {
        matches!(self.kind, CodeBlobKind::RuntimeStub)
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self.kind, CodeBlobKind::Compiled(_))
    }

    pub fn as_compiled_method_opt(&self) -> Option<&CompiledMethod> {
        match &self.kind {
            CodeBlobKind::Compiled(compiled_method) => Some(compiled_method),
            _ => None,
        }
    }

    pub fn as_compiled_method(&self) -> &CompiledMethod {
        match self.as_compiled_method_opt() {
            Some(compiled_method) => compiled_method,
            None => panic!("{} is not a compiled method: {:?}", self.name, self.kind),
        }
    }
}
