//! Output context lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};

/// Explicit handle for the shared audio output context.
///
/// Platforms with autoplay restrictions deliver the output context in a
/// suspended state until a user gesture; the graph owns this state
/// explicitly instead of leaving it as ambient global state. Starting music
/// playback resumes a suspended context before the play command takes
/// effect.
///
/// The context starts in the running state. Call [`suspend()`] to model a
/// platform-suspended context (e.g. in tests or when the host reports
/// suspension).
///
/// [`suspend()`]: OutputContext::suspend
#[derive(Debug)]
pub struct OutputContext {
    running: AtomicBool,
}

impl OutputContext {
    /// Creates a context in the running state.
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    /// Returns `true` if the context is running (not suspended).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Suspends the context.
    ///
    /// While suspended the render loop keeps producing chunks (the merged
    /// output always reflects attached sources); suspension only gates the
    /// play command ordering for music.
    pub fn suspend(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Resumes the context.
    ///
    /// Returns `true` if the context was suspended and is now running,
    /// `false` if it was already running.
    pub fn resume(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_running() {
        let ctx = OutputContext::new();
        assert!(ctx.is_running());
    }

    #[test]
    fn test_suspend_and_resume() {
        let ctx = OutputContext::new();
        ctx.suspend();
        assert!(!ctx.is_running());

        assert!(ctx.resume());
        assert!(ctx.is_running());
    }

    #[test]
    fn test_resume_when_already_running() {
        let ctx = OutputContext::new();
        assert!(!ctx.resume());
        assert!(ctx.is_running());
    }
}
