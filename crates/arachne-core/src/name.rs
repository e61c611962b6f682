//! Graph-name validation.

use crate::error::CoreError;

/// Validates a graph name.
///
/// A graph name must be non-empty and consist only of lowercase ASCII
/// letters, digits, `_`, and `-`. Backends use names as storage namespaces,
/// so the character set is deliberately narrow.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] describing the first violation.
pub fn validate_graph_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::validation("graph name must not be empty"));
    }
    for c in name.chars() {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
            return Err(CoreError::validation(format!(
                "graph name '{name}' contains invalid character '{c}'; allowed: [a-z0-9_-]"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["g", "my-graph", "graph_01", "a-b_c9"] {
            assert!(validate_graph_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_names() {
        for name in ["", "Graph", "my graph", "g/1", "café", "g.1"] {
            assert!(validate_graph_name(name).is_err(), "{name} should be invalid");
        }
    }

    proptest! {
        #[test]
        fn accepts_exactly_the_allowed_alphabet(name in "[a-z0-9_-]{1,32}") {
            prop_assert!(validate_graph_name(&name).is_ok());
        }

        #[test]
        fn rejects_uppercase(name in "[a-z0-9_-]{0,8}[A-Z][a-z0-9_-]{0,8}") {
            prop_assert!(validate_graph_name(&name).is_err());
        }
    }
}
