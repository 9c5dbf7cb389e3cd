use std::sync::atomic::{AtomicBool, Ordering};

/// Shared session context.
///
/// Holds the flag that keeps the read loop and the scheduler going. The flag
/// starts raised and is lowered exactly once, by the `exit` builtin or by end
/// of input; nothing ever raises it again. Relaxed ordering is enough because
/// the flag guards no other data.
pub struct ShellState {
    running: AtomicBool,
}

impl ShellState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
        }
    }

    /// Whether new lines and command groups may still be scheduled.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Lower the running flag. Commands already in flight are unaffected.
    pub fn request_exit(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_running() {
        let state = ShellState::new();
        assert!(state.is_running());
    }

    #[test]
    fn test_request_exit_lowers_flag_once() {
        let state = ShellState::new();
        state.request_exit();
        assert!(!state.is_running());

        // A second request changes nothing
        state.request_exit();
        assert!(!state.is_running());
    }
}
