// In-flight guard for one-shot commands.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

/// Marks a command as running until dropped. A second `acquire` on the
/// same flag fails with [`CoreError::Busy`] instead of queueing.
pub(crate) struct Pending<'a>(&'a AtomicBool);

impl<'a> Pending<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool, operation: &'static str) -> Result<Self, CoreError> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(CoreError::Busy { operation });
        }
        Ok(Self(flag))
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
