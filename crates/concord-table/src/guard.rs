//! Scoped ownership of a row source.

use std::ops::{Deref, DerefMut};

use concord_types::{RowSource, SourceResult};
use tracing::warn;

/// Owns a row source and closes it when dropped.
///
/// Call [`SourceGuard::close`] on the success path to see close errors; on
/// any other exit path the drop handler closes the source and logs a failure.
pub struct SourceGuard<S: RowSource> {
    source: S,
    closed: bool,
}

impl<S: RowSource> SourceGuard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            closed: false,
        }
    }

    pub fn close(&mut self) -> SourceResult<()> {
        self.closed = true;
        self.source.close()
    }
}

impl<S: RowSource> Deref for SourceGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: RowSource> DerefMut for SourceGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: RowSource> Drop for SourceGuard<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.source.close() {
            warn!(source = self.source.name(), error = %e, "failed to close row source");
        }
    }
}
