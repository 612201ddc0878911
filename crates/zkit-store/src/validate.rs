//! Syntax rules for names and categories.
//!
//! - Named tokens (item names, variants, the buckets node name) are drawn
//!   from `[A-Za-z0-9_-]` and may be blank only where the field allows it.
//! - Categories additionally allow `/`, so they can look like paths
//!   (`widgets/2017`), and are always required.

use crate::error::ValidationError;

/// Pattern reported when a named token contains a forbidden character.
pub const NAME_PATTERN: &str = "^[A-Za-z0-9_-]*$";

/// Pattern reported when a category contains a forbidden character.
pub const CATEGORY_PATTERN: &str = "^[A-Za-z0-9_/-]+$";

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Validate a named token. `required` decides whether blank is allowed.
///
/// # Examples
///
/// ```
/// use zkit_store::validate::validate_named;
///
/// assert!(validate_named("item-1", true).is_ok());
/// assert!(validate_named("", false).is_ok());
/// assert!(validate_named("", true).is_err());
/// assert!(validate_named("a/b", false).is_err());
/// ```
pub fn validate_named(name: &str, required: bool) -> Result<(), ValidationError> {
    if name.trim() != name {
        return Err(ValidationError::Whitespace);
    }
    if required && name.is_empty() {
        return Err(ValidationError::Blank);
    }
    if !name.chars().all(is_name_char) {
        return Err(ValidationError::Pattern {
            pattern: NAME_PATTERN,
        });
    }
    Ok(())
}

/// Validate a category, which is required and may contain `/`.
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.trim().is_empty() {
        return Err(ValidationError::Blank);
    }
    if !category.chars().all(|c| is_name_char(c) || c == '/') {
        return Err(ValidationError::Pattern {
            pattern: CATEGORY_PATTERN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn named_tokens() {
        assert!(validate_named("foo", true).is_ok());
        assert!(validate_named("my-version_2", true).is_ok());
        assert_eq!(validate_named("", true), Err(ValidationError::Blank));
        assert_eq!(validate_named(" foo", true), Err(ValidationError::Whitespace));
        assert_eq!(validate_named("foo ", false), Err(ValidationError::Whitespace));
        assert!(matches!(
            validate_named("foo/bar", true),
            Err(ValidationError::Pattern { .. })
        ));
        assert!(validate_named("dotted.name", true).is_err());
    }

    #[test]
    fn categories() {
        assert!(validate_category("widgets").is_ok());
        assert!(validate_category("widgets/2017").is_ok());
        assert!(validate_category("/widgets/").is_ok());
        assert_eq!(validate_category(""), Err(ValidationError::Blank));
        assert_eq!(validate_category("   "), Err(ValidationError::Blank));
        assert!(validate_category("wid gets").is_err());
        assert!(validate_category("../etc").is_err());
    }

    #[test]
    fn pattern_message() {
        let err = validate_named("a b", false).unwrap_err();
        assert_eq!(err.to_string(), "must match ^[A-Za-z0-9_-]*$");
    }

    proptest! {
        #[test]
        fn accepted_names_use_only_token_chars(name in "\\PC{0,16}") {
            if validate_named(&name, false).is_ok() {
                prop_assert!(name.chars().all(is_name_char));
            }
        }

        #[test]
        fn token_names_always_accepted(name in "[A-Za-z0-9_-]{1,32}") {
            prop_assert!(validate_named(&name, true).is_ok());
            prop_assert!(validate_category(&name).is_ok());
        }
    }
}
