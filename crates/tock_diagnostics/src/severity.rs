//! Diagnostic severity, derived from the code category.

use crate::code::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a diagnostic is. `Warning < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// An advisory that never stops simulation.
    Warning,
    /// A design defect that prevents simulation from starting.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl From<Category> for Severity {
    fn from(category: Category) -> Self {
        match category {
            Category::Error => Severity::Error,
            Category::Warning => Severity::Warning,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_errors_stop_elaboration() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn follows_code_category() {
        assert_eq!(Severity::from(Category::Error), Severity::Error);
        assert_eq!(Severity::from(Category::Warning), Severity::Warning);
        assert_eq!(Severity::from(Category::Warning).to_string(), "warning");
    }
}
