//! Typed accessors over the raw key/value storage.

use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::keys::StorageKey;
use crate::types::{Credentials, ThemeMode};
use crate::Storage;

/// Typed view of the client's persisted state.
///
/// Cloning a `LocalStore` is cheap; clones share the same underlying storage.
#[derive(Clone)]
pub struct LocalStore {
    storage: Arc<dyn Storage>,
}

impl LocalStore {
    /// Wrap a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Access the raw storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Read the stored access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn access_token(&self) -> Result<Option<String>> {
        self.storage.get(StorageKey::Token)
    }

    /// Store an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save_access_token(&self, token: &str) -> Result<()> {
        self.storage.set(StorageKey::Token, token)
    }

    /// Read the stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.storage.get(StorageKey::RefreshToken)
    }

    /// Store a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save_refresh_token(&self, token: &str) -> Result<()> {
        self.storage.set(StorageKey::RefreshToken, token)
    }

    /// Store both tokens of a credential pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either storage write fails.
    pub fn save_credentials(&self, credentials: &Credentials) -> Result<()> {
        self.save_access_token(&credentials.access_token)?;
        self.save_refresh_token(&credentials.refresh_token)
    }

    /// Remove both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if either storage delete fails.
    pub fn clear_credentials(&self) -> Result<()> {
        self.storage.remove(StorageKey::Token)?;
        self.storage.remove(StorageKey::RefreshToken)
    }

    // =========================================================================
    // Profile and preferences
    // =========================================================================

    /// Read the display name of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn user(&self) -> Result<Option<String>> {
        self.storage.get(StorageKey::User)
    }

    /// Store the display name of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save_user(&self, user: &str) -> Result<()> {
        self.storage.set(StorageKey::User, user)
    }

    /// Whether labels are printed through the native app. Defaults to `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails or the value is not a JSON boolean.
    pub fn print_by_app(&self) -> Result<bool> {
        match self.storage.get(StorageKey::PrintByApp)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                StoreError::Serialization(format!("{}: {e}", StorageKey::PrintByApp))
            }),
            None => Ok(false),
        }
    }

    /// Store the print-by-app preference as a JSON boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn set_print_by_app(&self, enabled: bool) -> Result<()> {
        let raw = serde_json::to_string(&enabled)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.storage.set(StorageKey::PrintByApp, &raw)
    }

    /// Read the path a login redirect was issued for.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn redirect_url(&self) -> Result<Option<String>> {
        self.storage.get(StorageKey::RedirectUrl)
    }

    /// Remember the protected path to return to after login.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn save_redirect_url(&self, path: &str) -> Result<()> {
        self.storage.set(StorageKey::RedirectUrl, path)
    }

    /// Read and remove the post-login redirect path.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read or delete fails.
    pub fn take_redirect_url(&self) -> Result<Option<String>> {
        let url = self.redirect_url()?;
        if url.is_some() {
            self.storage.remove(StorageKey::RedirectUrl)?;
        }
        Ok(url)
    }

    /// Read the theme preference. Missing or unknown values read as light.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn theme_mode(&self) -> Result<ThemeMode> {
        Ok(self
            .storage
            .get(StorageKey::ThemeMode)?
            .map_or(ThemeMode::Light, |raw| ThemeMode::from_stored(&raw)))
    }

    /// Store the theme preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<()> {
        self.storage.set(StorageKey::ThemeMode, mode.as_str())
    }

    /// Flip the theme preference and return the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read or write fails.
    pub fn toggle_theme_mode(&self) -> Result<ThemeMode> {
        let next = self.theme_mode()?.toggled();
        self.set_theme_mode(next)?;
        Ok(next)
    }

    /// Forget the logged-in session: tokens, user, and the print preference.
    ///
    /// Theme and redirect path are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if any storage operation fails.
    pub fn clear_session(&self) -> Result<()> {
        self.clear_credentials()?;
        self.storage.remove(StorageKey::User)?;
        self.set_print_by_app(false)?;
        tracing::debug!("Cleared stored session");
        Ok(())
    }
}
