//! Connection URIs.
//!
//! A URI has the form `scheme[+transport]://[user@]host[:port]/?key=value&…`.
//! The part of the scheme before `+` names the plugin; everything else,
//! query included, is passed to the plugin verbatim at registration.

use std::fmt;

use url::Url;

use crate::StorageError;

/// Parsed connection URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    raw: String,
    url: Url,
}

impl StorageUri {
    /// Parses `raw`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `raw` is not a URI or its scheme is empty.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let url = Url::parse(raw)
            .map_err(|error| StorageError::invalid_argument(format!("invalid URI {raw:?}: {error}")))?;
        if url.scheme().split('+').next().is_none_or(str::is_empty) {
            return Err(StorageError::invalid_argument(format!(
                "URI {raw:?} names no plugin"
            )));
        }
        Ok(Self {
            raw: raw.to_owned(),
            url,
        })
    }

    /// Plugin name: the scheme up to any `+transport` suffix.
    #[must_use]
    pub fn plugin(&self) -> &str {
        let scheme = self.url.scheme();
        scheme.split_once('+').map_or(scheme, |(plugin, _)| plugin)
    }

    /// Transport suffix after `+`, if any.
    #[must_use]
    pub fn transport(&self) -> Option<&str> {
        self.url.scheme().split_once('+').map(|(_, transport)| transport)
    }

    /// User name, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        Some(self.url.username()).filter(|user| !user.is_empty())
    }

    /// Host, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.url.host_str().filter(|host| !host.is_empty())
    }

    /// Port, if any.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// First value of query parameter `key`, percent-decoded.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    /// The URI exactly as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests;
