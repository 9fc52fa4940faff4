use std::ptr::NonNull;

use lpkit_engine::Prob;
use tracing::trace;

use crate::error::{Error, Result};

/// Owns one engine problem object and destroys it exactly once.
#[derive(Debug)]
pub(crate) struct Handle {
    raw: NonNull<Prob>,
}

// The engine keeps no global state, so a handle may move between threads.
// It stays !Sync: the engine object tolerates no concurrent calls.
unsafe impl Send for Handle {}

impl Handle {
    pub fn new() -> Result<Self> {
        let raw = NonNull::new(lpkit_engine::create_prob()).ok_or(Error::AllocationFailed {
            target: "problem object",
        })?;
        trace!(component = "handle", operation = "create");
        Ok(Self { raw })
    }

    /// Deep copy of the problem data. Solutions are not copied.
    pub fn try_clone(&self) -> Result<Self> {
        // SAFETY: `self.raw` is live until drop.
        let copy = unsafe { lpkit_engine::copy_prob(self.raw.as_ptr()) };
        let raw = NonNull::new(copy).ok_or(Error::AllocationFailed {
            target: "problem copy",
        })?;
        trace!(component = "handle", operation = "copy");
        Ok(Self { raw })
    }

    pub fn as_ptr(&self) -> *mut Prob {
        self.raw.as_ptr()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        trace!(component = "handle", operation = "delete");
        // SAFETY: created by `create_prob`/`copy_prob` and released only here.
        unsafe { lpkit_engine::delete_prob(self.raw.as_ptr()) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_handle_is_send() {
        assert_send::<Handle>();
    }

    #[test]
    fn test_copy_is_independent() {
        let original = Handle::new().unwrap();
        unsafe {
            lpkit_engine::add_cols(original.as_ptr(), 3);
        }
        let copy = original.try_clone().unwrap();
        drop(original);
        assert_eq!(unsafe { lpkit_engine::get_num_cols(copy.as_ptr()) }, 3);
    }
}
