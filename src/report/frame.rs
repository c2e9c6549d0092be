//! A single stack-trace entry with provenance classification.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Configuration;

/// One frame of a reported error's stack. All fields are optional in the
/// report format; a frame with no object path belongs to neither the
/// runtime nor the target binary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Function name, if symbolized.
    pub function: Option<String>,
    /// Path of the binary or shared object the frame executes in.
    pub object: Option<String>,
    /// Source file, if debug info was available.
    pub file: Option<String>,
    /// Source line, kept as reported.
    pub line: Option<String>,
}

impl Frame {
    /// True if the frame executes inside the runtime interpreter: either
    /// the object path is the runtime binary itself, or its file name
    /// matches a configured runtime shared-object matcher (shared-library
    /// interpreter builds report e.g. `libruby.so.3.1.2` instead of the
    /// binary path).
    pub fn is_runtime(&self, config: &Configuration) -> bool {
        let Some(object) = self.object.as_deref() else {
            return false;
        };
        if Path::new(object) == config.runtime_path {
            return true;
        }
        let Some(name) = Path::new(object).file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        config
            .runtime_shared_objects
            .iter()
            .any(|m| m.matches(name))
    }

    /// True if the frame executes inside the binary under test: the object
    /// path with its extension stripped must end with the configured
    /// binary name at a path-component boundary, so a binary named `foo`
    /// never matches an unrelated `barfoo.so`.
    pub fn is_target(&self, config: &Configuration) -> bool {
        let Some(object) = self.object.as_deref() else {
            return false;
        };
        let path = Path::new(object);
        let Some(stem) = path.file_stem() else {
            return false;
        };
        let resolved = match path.parent() {
            Some(dir) => dir.join(stem),
            None => PathBuf::from(stem),
        };
        resolved.ends_with(&config.binary_name)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            let function = self.function.as_deref().unwrap_or("???");
            let line = self.line.as_deref().unwrap_or("?");
            write!(f, "{function} ({file}:{line})")
        } else {
            match (&self.function, &self.object) {
                (Some(function), Some(object)) => write!(f, "{function} (at {object})"),
                (Some(function), None) => f.write_str(function),
                (None, Some(object)) => write!(f, "??? (at {object})"),
                (None, None) => f.write_str("<unknown stack frame>"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeVersion;

    fn config() -> Configuration {
        Configuration::new(
            "my_ext",
            "/usr/bin/ruby",
            RuntimeVersion::new("ruby", "3.1.2", "20"),
        )
    }

    fn frame(object: &str) -> Frame {
        Frame {
            object: Some(object.to_string()),
            ..Frame::default()
        }
    }

    #[test]
    fn test_runtime_by_binary_path() {
        assert!(frame("/usr/bin/ruby").is_runtime(&config()));
        assert!(!frame("/usr/bin/python3").is_runtime(&config()));
    }

    #[test]
    fn test_runtime_by_shared_object() {
        assert!(frame("/usr/lib/libruby.so.3.1.2").is_runtime(&config()));
        assert!(!frame("/usr/lib/libruby.so.3.0.0").is_runtime(&config()));
    }

    #[test]
    fn test_target_by_object_stem() {
        assert!(frame("/build/lib/my_ext.so").is_target(&config()));
        assert!(frame("my_ext.so").is_target(&config()));
        assert!(!frame("/build/lib/other_ext.so").is_target(&config()));
    }

    #[test]
    fn test_target_requires_component_boundary() {
        // A binary named `my_ext` must not match `not_my_ext.so`.
        assert!(!frame("/build/lib/not_my_ext.so").is_target(&config()));
    }

    #[test]
    fn test_target_with_path_components() {
        let config = Configuration::new(
            "ext/my_ext",
            "/usr/bin/ruby",
            RuntimeVersion::new("ruby", "3.1.2", "20"),
        );
        assert!(frame("/build/ext/my_ext.so").is_target(&config));
        assert!(!frame("/build/my_ext.so").is_target(&config));
    }

    #[test]
    fn test_no_object_is_neither() {
        let frame = Frame {
            function: Some("malloc".to_string()),
            ..Frame::default()
        };
        assert!(!frame.is_runtime(&config()));
        assert!(!frame.is_target(&config()));
    }

    #[test]
    fn test_display_with_source_location() {
        let frame = Frame {
            function: Some("leaky_fn".to_string()),
            object: Some("/build/my_ext.so".to_string()),
            file: Some("my_ext.c".to_string()),
            line: Some("10".to_string()),
        };
        assert_eq!(frame.to_string(), "leaky_fn (my_ext.c:10)");
    }

    #[test]
    fn test_display_with_object_only() {
        let frame = Frame {
            function: Some("vm_exec".to_string()),
            object: Some("/usr/bin/ruby".to_string()),
            ..Frame::default()
        };
        assert_eq!(frame.to_string(), "vm_exec (at /usr/bin/ruby)");
    }

    #[test]
    fn test_display_unknown() {
        assert_eq!(Frame::default().to_string(), "<unknown stack frame>");
    }
}
