use thiserror::Error;

use monitor_state::{FixupTable, ObjectRef};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum VerificationError {
    #[error("engine counted {engine} monitors to fix, frames hold {scanned}")]
    CountMismatch { engine: usize, scanned: usize },
    #[error("{0:?} needs fixing but the engine did not record it")]
    Unrecorded(ObjectRef),
    #[error("engine recorded {0:?} but no scanned frame holds it")]
    Spurious(ObjectRef),
}

/// Compares the engine's own fixup bookkeeping with what scanning its frames found.
pub fn verify_monitor_fixups(engine_count: usize, engine_table: &FixupTable, scanned_count: usize, scanned_table: &FixupTable) -> Result<(), VerificationError> {
    if let Some(obj) = scanned_table.missing_from(engine_table).next() {
        return Err(VerificationError::Unrecorded(obj));
    }
    if let Some(obj) = engine_table.missing_from(scanned_table).next() {
        return Err(VerificationError::Spurious(obj));
    }
    if engine_count != scanned_count {
        return Err(VerificationError::CountMismatch { engine: engine_count, scanned: scanned_count });
    }
    Ok(())
}
