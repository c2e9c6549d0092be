//! One reported error: kind, message, stack, optional suppression.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::{MemsiftError, Result};
use crate::report::stack::Stack;
use crate::report::suppression::Suppression;

/// A single error record decoded from a report file.
///
/// `kind` is the checker's namespaced kind string. Kinds under `Leak_`
/// (definite, indirect, possible) are eligible for provenance-based skip
/// filtering; every other kind — invalid reads/writes, use-after-free,
/// uninitialized-value conditions — is always reported, because memory
/// corruption can manifest anywhere regardless of where the fault
/// originated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValgrindError {
    pub kind: String,
    pub message: String,
    pub stack: Stack,
    pub suppression: Option<Suppression>,
}

impl ValgrindError {
    /// Assemble a record, aborting when a suppression block is present but
    /// the configuration has no destination for it.
    pub fn new(
        config: &Configuration,
        kind: String,
        message: String,
        stack: Stack,
        suppression: Option<Suppression>,
    ) -> Result<Self> {
        if suppression.is_some() && !config.generate_suppressions {
            return Err(MemsiftError::SuppressionNotConfigured {
                binary_name: config.binary_name.clone(),
            });
        }
        Ok(Self {
            kind,
            message,
            stack,
            suppression,
        })
    }

    /// Leak-class kinds read their message from the structured `xwhat`
    /// description and are eligible for skip filtering.
    pub fn is_leak(&self) -> bool {
        self.kind.starts_with("Leak_")
    }

    /// Whether this error should be dropped as non-actionable noise. Only
    /// leak-class errors consult the stack's skip policy.
    pub fn skip(&self, config: &Configuration) -> bool {
        self.is_leak() && self.stack.skip(config)
    }

    /// Render the error for the report output: the message line, one line
    /// per frame with target-binary frames marked `*`, and the suppression
    /// block when generation was requested.
    pub fn render(&self, config: &Configuration) -> String {
        let mut out = String::new();
        out.push_str(&self.message);
        out.push('\n');
        for frame in self.stack.frames() {
            if frame.is_target(config) {
                out.push_str(" *");
            } else {
                out.push_str("  ");
            }
            out.push_str(&frame.to_string());
            out.push('\n');
        }
        if config.generate_suppressions {
            if let Some(suppression) = &self.suppression {
                out.push_str(&suppression.to_string());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeVersion;
    use crate::report::frame::Frame;
    use crate::report::suppression::{PatternKind, SuppressionPattern};

    fn config() -> Configuration {
        Configuration::new(
            "my_ext",
            "/usr/bin/ruby",
            RuntimeVersion::new("ruby", "3.1.2", "20"),
        )
    }

    fn leak_stack() -> Stack {
        Stack::new(vec![
            Frame {
                function: Some("leaky_fn".to_string()),
                object: Some("/build/my_ext.so".to_string()),
                file: Some("my_ext.c".to_string()),
                line: Some("10".to_string()),
            },
            Frame {
                function: Some("vm_exec".to_string()),
                object: Some("/usr/bin/ruby".to_string()),
                ..Frame::default()
            },
        ])
    }

    fn suppression() -> Suppression {
        Suppression {
            name: "insert_a_suppression_name_here".to_string(),
            kind: "Memcheck:Leak".to_string(),
            aux: None,
            patterns: vec![SuppressionPattern {
                kind: PatternKind::Function,
                value: "malloc".to_string(),
            }],
        }
    }

    #[test]
    fn test_leak_classification() {
        let config = config();
        for kind in ["Leak_DefinitelyLost", "Leak_IndirectlyLost", "Leak_PossiblyLost"] {
            let error = ValgrindError::new(
                &config,
                kind.to_string(),
                "lost".to_string(),
                leak_stack(),
                None,
            )
            .unwrap();
            assert!(error.is_leak());
        }
        let error = ValgrindError::new(
            &config,
            "InvalidWrite".to_string(),
            "Invalid write of size 1".to_string(),
            leak_stack(),
            None,
        )
        .unwrap();
        assert!(!error.is_leak());
    }

    #[test]
    fn test_non_leak_never_skipped() {
        let config = config();
        // Every frame is a runtime frame, which would skip a leak.
        let stack = Stack::new(vec![Frame {
            function: Some("rb_funcall".to_string()),
            object: Some("/usr/bin/ruby".to_string()),
            ..Frame::default()
        }]);
        let error = ValgrindError::new(
            &config,
            "InvalidRead".to_string(),
            "Invalid read of size 8".to_string(),
            stack.clone(),
            None,
        )
        .unwrap();
        assert!(!error.skip(&config));

        let leak = ValgrindError::new(
            &config,
            "Leak_DefinitelyLost".to_string(),
            "lost".to_string(),
            stack,
            None,
        )
        .unwrap();
        assert!(leak.skip(&config));
    }

    #[test]
    fn test_render_marks_target_frames() {
        let config = config();
        let error = ValgrindError::new(
            &config,
            "Leak_DefinitelyLost".to_string(),
            "100 bytes in 1 blocks are definitely lost".to_string(),
            leak_stack(),
            None,
        )
        .unwrap();
        assert_eq!(
            error.render(&config),
            "100 bytes in 1 blocks are definitely lost\n\
             \x20*leaky_fn (my_ext.c:10)\n\
             \x20 vm_exec (at /usr/bin/ruby)\n"
        );
    }

    #[test]
    fn test_render_appends_suppression_when_configured() {
        let mut config = config();
        config.generate_suppressions = true;
        let error = ValgrindError::new(
            &config,
            "Leak_DefinitelyLost".to_string(),
            "lost".to_string(),
            leak_stack(),
            Some(suppression()),
        )
        .unwrap();
        let rendered = error.render(&config);
        assert!(rendered.contains("{\n  insert_a_suppression_name_here\n"));
        assert!(rendered.ends_with("  fun:malloc\n}\n"));
    }

    #[test]
    fn test_suppression_without_destination_is_fatal() {
        let config = config();
        let err = ValgrindError::new(
            &config,
            "Leak_DefinitelyLost".to_string(),
            "lost".to_string(),
            leak_stack(),
            Some(suppression()),
        )
        .unwrap_err();
        match err {
            MemsiftError::SuppressionNotConfigured { binary_name } => {
                assert_eq!(binary_name, "my_ext");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
