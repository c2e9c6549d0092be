//! Ordered frame sequence and the leak skip policy.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::report::frame::Frame;

/// The stack of one reported error, innermost frame first, immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Decide whether a leak with this stack is non-actionable noise.
    ///
    /// Single linear pass, innermost frame first:
    /// - A runtime frame seen before any target-binary frame whose function
    ///   matches a skip pattern means the allocation was triggered by the
    ///   runtime before any target code ran.
    /// - A target-binary frame at the one-time init symbol is bounded by a
    ///   single execution and cannot cause unbounded growth.
    /// - A stack that never enters the target binary almost certainly is
    ///   not a leak in the binary under test.
    ///
    /// Only leak-class errors consult this; memory corruption is never
    /// filtered by provenance.
    pub fn skip(&self, config: &Configuration) -> bool {
        let mut seen_target = false;

        for frame in &self.frames {
            if frame.is_runtime(config) {
                if !seen_target {
                    if let Some(function) = frame.function.as_deref() {
                        if config.skip_patterns.iter().any(|p| p.matches(function)) {
                            return true;
                        }
                    }
                }
            } else if frame.is_target(config) {
                seen_target = true;

                if frame.function.as_deref() == Some(config.init_symbol.as_str()) {
                    return true;
                }
            }
        }

        !seen_target
    }
}
