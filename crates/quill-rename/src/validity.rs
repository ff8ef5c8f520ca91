//! Replacement-name validity, checked before the engine runs.

use quill_syntax::ident;

use crate::RenameError;

/// A replacement is valid when it lexes as one identifier (verbatim form
/// allowed) and is not one of the contextual keywords that can never be
/// escaped into an identifier position.
pub fn is_valid_replacement(text: &str) -> bool {
    ident::is_valid_replacement(text)
}

pub fn ensure_valid_replacement(text: &str) -> Result<(), RenameError> {
    if is_valid_replacement(text) {
        Ok(())
    } else {
        Err(RenameError::InvalidReplacementText(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_listed_names_are_invalid() {
        for name in ["var", "dynamic", "unmanaged", "notnull"] {
            assert!(!is_valid_replacement(name), "{name} should be rejected");
        }
    }

    #[test]
    fn ordinary_and_verbatim_names_are_valid() {
        assert!(is_valid_replacement("Renamed"));
        assert!(is_valid_replacement("@class"));
        assert!(is_valid_replacement("\\u0061bc"));
    }

    #[test]
    fn non_identifiers_are_invalid() {
        assert!(!is_valid_replacement(""));
        assert!(!is_valid_replacement("a b"));
        assert!(!is_valid_replacement("1abc"));
    }
}
