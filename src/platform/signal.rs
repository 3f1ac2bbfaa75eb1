// Cooperative interrupt handling for the capture loops

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raised by Ctrl-C; capture loops poll it once per frame and prompts give up when it is set
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the process-wide Ctrl-C handler
    pub fn install() -> Result<Self, ctrlc::Error> {
        let flag = Self::new();
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || handler_flag.raise())?;
        Ok(flag)
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_shared_across_clones() {
        let flag = InterruptFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_raised());
        clone.raise();
        assert!(flag.is_raised());
    }
}
