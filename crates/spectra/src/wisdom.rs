//! Wisdom persistence on the process-wide runtime.
//!
//! The wisdom text is engine-defined; it is passed through untouched.
//! Every function here takes the planning lock.

use std::path::Path;

use spectra_core::SpectraError;

/// The current wisdom as text.
pub fn current() -> Result<String, SpectraError> {
    Ok(spectra_engine::global()?.wisdom())
}

/// Replace the accumulated wisdom with `text`.
///
/// Empty text forgets everything. Otherwise the text is merged into the
/// current wisdom; if the engine rejects it, nothing changes and
/// [`SpectraError::MalformedWisdom`] is returned.
pub fn set_current(text: &str) -> Result<(), SpectraError> {
    let runtime = spectra_engine::global()?;
    let session = runtime.session();
    if text.is_empty() {
        session.forget_wisdom();
        return Ok(());
    }
    if !session.import_wisdom(text) {
        return Err(SpectraError::MalformedWisdom);
    }
    Ok(())
}

/// Write the current wisdom to `path`. Returns whether the engine
/// succeeded.
pub fn export(path: impl AsRef<Path>) -> Result<bool, SpectraError> {
    Ok(spectra_engine::global()?
        .session()
        .export_wisdom_to_file(path.as_ref()))
}

/// Merge wisdom from `path`. Returns whether the engine accepted it.
pub fn import(path: impl AsRef<Path>) -> Result<bool, SpectraError> {
    Ok(spectra_engine::global()?
        .session()
        .import_wisdom_from_file(path.as_ref()))
}

/// Forget all accumulated wisdom.
pub fn clear() -> Result<(), SpectraError> {
    spectra_engine::global()?.session().forget_wisdom();
    Ok(())
}
