use crate::domain::error::{AppError, Result};
use keyring::Entry;

/// Portal passwords in the OS credential store, one entry per portal and user.
pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, portal: &str, username: &str) -> Result<Entry> {
        Entry::new(&self.service, &format!("{}:{}", portal, username))
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))
    }

    pub fn set_password(&self, portal: &str, username: &str, password: &str) -> Result<()> {
        self.entry(portal, username)?
            .set_password(password)
            .map_err(|e| AppError::SecurityError(format!("Failed to store password: {}", e)))
    }

    /// `None` when nothing is stored for this user.
    pub fn get_password(&self, portal: &str, username: &str) -> Result<Option<String>> {
        match self.entry(portal, username)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to read password: {}",
                e
            ))),
        }
    }

    pub fn delete_password(&self, portal: &str, username: &str) -> Result<()> {
        self.entry(portal, username)?
            .delete_credential()
            .map_err(|e| AppError::SecurityError(format!("Failed to delete password: {}", e)))
    }
}
