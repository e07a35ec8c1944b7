//! Applicability matching - decides which checks see which events
//!
//! Pure matching logic compiled once at startup. Invalid globs are a
//! configuration error and surface before any event is processed.

use glob::Pattern;

use crate::core::models::ChangeEvent;

/// Compiled applicability predicate for one check
#[derive(Debug, Clone)]
pub struct Applicability {
    enabled: bool,
    extensions: Vec<String>,
    globs: Vec<Pattern>,
}

impl Applicability {
    /// Compile a predicate from configuration
    ///
    /// `extensions` use the `".rs"` form; an empty list matches every
    /// extension. `globs` are standard glob patterns matched against
    /// the event path; an empty list matches every path.
    pub fn new(
        enabled: bool,
        extensions: Vec<String>,
        globs: &[String],
    ) -> Result<Self, glob::PatternError> {
        let globs = globs.iter().map(|g| Pattern::new(g)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { enabled, extensions, globs })
    }

    /// Predicate that matches everything (for tests and built-ins)
    #[must_use]
    pub fn any() -> Self {
        Self { enabled: true, extensions: Vec::new(), globs: Vec::new() }
    }

    /// Whether the check is enabled at all
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an event should be seen by the owning check
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if !self.enabled {
            return false;
        }

        if !self.extensions.is_empty() {
            let Some(ext) = event.extension() else { return false };
            if !self.extensions.iter().any(|e| e == &ext) {
                return false;
            }
        }

        if !self.globs.is_empty() {
            let path = event.path.to_string_lossy();
            if !self.globs.iter().any(|g| g.matches(&path)) {
                return false;
            }
        }

        true
    }
}
