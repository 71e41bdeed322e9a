//! Search-key filtering applied to listings.

use std::str::FromStr;

use strum::{Display, EnumString, IntoStaticStr};

use crate::entity::Record;
use crate::error::{ErrorCode, StorageError};

/// Field a listing can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SearchKey {
    /// The entity identifier.
    Id,
    /// The owning system identifier.
    SystemId,
    /// The parent pool identifier.
    PoolId,
    /// The exported file system identifier.
    FsId,
}

/// Validated `(key, value)` filter for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    key: SearchKey,
    value: String,
}

impl SearchFilter {
    /// Validates a raw key/value pair against the keys `T` supports.
    ///
    /// Returns `Ok(None)` when no key was given, so the listing is left
    /// unfiltered.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorCode::UnsupportedSearchKey`] when `key` is not one
    /// of `T::SEARCH_KEYS`, and with [`ErrorCode::InvalidArgument`] when a
    /// key arrives without a value.
    pub fn for_record<T: Record>(
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<Option<Self>, StorageError> {
        let Some(raw_key) = key else {
            return Ok(None);
        };
        let supported = SearchKey::from_str(raw_key)
            .ok()
            .filter(|parsed| T::SEARCH_KEYS.contains(parsed));
        let Some(search_key) = supported else {
            return Err(StorageError::new(
                ErrorCode::UnsupportedSearchKey,
                format!(
                    "search key '{raw_key}' is not supported for {}; expected one of [{}]",
                    T::CLASS,
                    supported_keys::<T>()
                ),
            ));
        };
        let Some(search_value) = value else {
            return Err(StorageError::invalid_argument(format!(
                "search key '{raw_key}' given without a search value"
            )));
        };
        Ok(Some(Self {
            key: search_key,
            value: search_value.to_owned(),
        }))
    }

    /// Returns the validated key.
    #[must_use]
    pub const fn key(&self) -> SearchKey {
        self.key
    }

    /// Returns the value compared against.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Reports whether `item` carries the filter value in the filter field.
    #[must_use]
    pub fn matches<T: Record>(&self, item: &T) -> bool {
        item.search_field(self.key) == Some(self.value.as_str())
    }
}

/// Filters `items` down to those whose `key` field equals `value`.
///
/// Order is preserved and the result is a subset of the input. With no key
/// the input comes back unchanged.
///
/// # Errors
///
/// Propagates the validation failures of [`SearchFilter::for_record`].
pub fn search<T: Record>(
    items: Vec<T>,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<Vec<T>, StorageError> {
    match SearchFilter::for_record::<T>(key, value)? {
        None => Ok(items),
        Some(filter) => Ok(items
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect()),
    }
}

fn supported_keys<T: Record>() -> String {
    T::SEARCH_KEYS
        .iter()
        .map(|key| <&'static str>::from(*key))
        .collect::<Vec<_>>()
        .join(", ")
}
