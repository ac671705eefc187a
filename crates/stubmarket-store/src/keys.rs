//! Well-known storage keys.
//!
//! Key names match the browser local-storage keys of the web client, so a
//! state directory can be inspected with the same vocabulary.

use std::fmt;

/// A well-known storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The access token.
    Token,
    /// The refresh token.
    RefreshToken,
    /// The display name of the logged-in user.
    User,
    /// Whether labels are printed through the native app (JSON boolean).
    PrintByApp,
    /// The last protected path a login redirect was issued for.
    RedirectUrl,
    /// The UI theme, `"light"` or `"dark"`.
    ThemeMode,
}

impl StorageKey {
    /// All keys, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Token,
        Self::RefreshToken,
        Self::User,
        Self::PrintByApp,
        Self::RedirectUrl,
        Self::ThemeMode,
    ];

    /// The key name as stored on disk.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::RefreshToken => "refreshToken",
            Self::User => "user",
            Self::PrintByApp => "printByApp",
            Self::RedirectUrl => "redirectURL",
            Self::ThemeMode => "themeMode",
        }
    }

    /// The key name as raw bytes for the database.
    #[must_use]
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_match_local_storage() {
        assert_eq!(StorageKey::Token.as_str(), "token");
        assert_eq!(StorageKey::RefreshToken.as_str(), "refreshToken");
        assert_eq!(StorageKey::RedirectUrl.as_str(), "redirectURL");
        assert_eq!(StorageKey::ThemeMode.to_string(), "themeMode");
    }

    #[test]
    fn key_names_are_unique() {
        let mut names: Vec<_> = StorageKey::ALL.iter().map(StorageKey::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }
}
