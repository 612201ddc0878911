//! Item identity: where an item lives and which version is addressed.

use std::fmt;

use serde::{Deserialize, Serialize};
use zkit_coord::ANY_VERSION;

use crate::error::ValidationError;
use crate::validate::{validate_category, validate_named};

/// Largest payload an item may carry.
pub const MAX_DATA_SIZE: usize = 1024 * 1024;

/// A logical item family: a category plus an item name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path-like namespace, e.g. `"widgets"` or `"widgets/2017"`.
    pub category: String,
    /// Item name; must not contain `/`.
    pub name: String,
}

impl Location {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Validate the name, then the category.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_named(&self.name, true).map_err(|e| ValidationError::Name(Box::new(e)))?;
        validate_category(&self.category).map_err(|e| ValidationError::Category(Box::new(e)))?;
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// An optional optimistic-concurrency token.
///
/// Unset means "ignore the version"; set means "only if the stored version
/// still equals this value".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Option<i32>);

impl Version {
    /// A version that is not checked.
    pub const fn unset() -> Self {
        Self(None)
    }

    /// A version that must match exactly.
    pub const fn new(version: i32) -> Self {
        Self(Some(version))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<i32> {
        self.0
    }
}

impl From<i32> for Version {
    fn from(version: i32) -> Self {
        Self::new(version)
    }
}

/// Identifies a stored item and, optionally, the version a write expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub location: Location,
    /// Named sub-version of the item; blank addresses the item itself.
    #[serde(default)]
    pub variant: String,
    #[serde(default)]
    pub version: Version,
}

impl Ident {
    /// Ident for the default instance of `location`.
    pub fn new(location: Location) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }

    /// Ident for a named variant of `location`.
    pub fn with_variant(location: Location, variant: impl Into<String>) -> Self {
        Self {
            location,
            variant: variant.into(),
            version: Version::unset(),
        }
    }

    /// Expect `version` on the next mutating call.
    pub fn set_version(&mut self, version: i32) {
        self.version = Version::new(version);
    }

    /// Stop checking the version.
    pub fn clear_version(&mut self) {
        self.version = Version::unset();
    }

    /// Whether this ident addresses a variant rather than the item itself.
    pub fn has_variant(&self) -> bool {
        !self.variant.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.location
            .validate()
            .map_err(|e| ValidationError::Location(Box::new(e)))?;
        validate_named(&self.variant, false).map_err(|e| ValidationError::Variant(Box::new(e)))?;
        Ok(())
    }

    /// The version as the backend understands it: [`ANY_VERSION`] when unset.
    pub(crate) fn actual_version(&self) -> i32 {
        self.version.get().unwrap_or(ANY_VERSION)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{loc={} variant={:?} version={:?}}}", self.location, self.variant, self.version.get())
    }
}

/// The data of a particular item in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub ident: Ident,
    pub data: Vec<u8>,
}

impl Item {
    pub fn new(ident: Ident, data: impl Into<Vec<u8>>) -> Self {
        Self {
            ident,
            data: data.into(),
        }
    }

    /// Validate the ident, then the payload size.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ident.validate()?;
        if self.data.len() > MAX_DATA_SIZE {
            return Err(ValidationError::DataTooLarge {
                size: self.data.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ident={} data={}B}}", self.ident, self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err_msg(ident: &Ident) -> String {
        ident.validate().err().map(|e| e.to_string()).unwrap_or_default()
    }

    #[test]
    fn ident_validation_messages() {
        let cases = [
            (Ident::default(), "invalid location: invalid name: cannot be blank"),
            (
                Ident::new(Location::new("", "foo")),
                "invalid location: invalid category: cannot be blank",
            ),
            (
                Ident::new(Location::new("", "foo/bar")),
                "invalid location: invalid name: must match ^[A-Za-z0-9_-]*$",
            ),
            (
                Ident::with_variant(Location::new("widgets", "foo"), "invalid/version"),
                "invalid variant: must match ^[A-Za-z0-9_-]*$",
            ),
            (Ident::with_variant(Location::new("widgets", "foo"), "my-version"), ""),
            (Ident::with_variant(Location::new("widgets/2017", "foo"), "my-version"), ""),
        ];
        for (ident, expected) in cases {
            assert_eq!(err_msg(&ident), expected, "ident: {ident}");
        }
    }

    #[test]
    fn location_and_variant_errors_are_distinguishable() {
        let bad_location = Ident::new(Location::new("widgets", ""));
        assert!(matches!(
            bad_location.validate(),
            Err(ValidationError::Location(_))
        ));

        let bad_variant = Ident::with_variant(Location::new("widgets", "foo"), " v1");
        assert!(matches!(
            bad_variant.validate(),
            Err(ValidationError::Variant(_))
        ));
    }

    #[test]
    fn actual_version() {
        let mut ident = Ident::default();
        assert_eq!(ident.actual_version(), -1);
        ident.set_version(0);
        assert_eq!(ident.actual_version(), 0);
        ident.set_version(1);
        assert_eq!(ident.actual_version(), 1);
        ident.set_version(-1);
        assert_eq!(ident.actual_version(), -1);
        ident.clear_version();
        assert!(!ident.version.is_set());
    }

    #[test]
    fn item_size_ceiling() {
        let ident = Ident::new(Location::new("widgets", "big"));
        assert!(Item::new(ident.clone(), vec![0u8; MAX_DATA_SIZE]).validate().is_ok());

        let err = Item::new(ident, vec![0u8; MAX_DATA_SIZE + 1])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::DataTooLarge { .. }));
    }

    #[test]
    fn item_validates_ident_first() {
        let item = Item::new(Ident::default(), vec![0u8; MAX_DATA_SIZE + 1]);
        assert!(matches!(item.validate(), Err(ValidationError::Location(_))));
    }

    #[test]
    fn version_serializes_as_optional_number() {
        let mut ident = Ident::new(Location::new("widgets", "foo"));
        assert!(serde_json::to_string(&ident).unwrap().contains("\"version\":null"));
        ident.set_version(3);
        let json = serde_json::to_string(&ident).unwrap();
        assert!(json.contains("\"version\":3"));
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ident);
    }
}
