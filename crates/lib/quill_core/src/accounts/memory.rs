//! In-process account store for tests and local runs.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::{AccountId, AccountRecord, NewAccount};

#[derive(Debug)]
pub struct MemoryAccountStore {
    accounts: DashMap<AccountId, AccountRecord>,
    next_id: AtomicI64,
    // Serializes uniqueness check + insert.
    create_lock: Mutex<()>,
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
            create_lock: Mutex::new(()),
        }
    }
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a fully specified record, keeping its id.
    pub fn insert(&self, record: AccountRecord) {
        self.next_id.fetch_max(record.id + 1, Ordering::SeqCst);
        self.accounts.insert(record.id, record);
    }

    /// Flip the account-state flags. Returns `false` if the account is unknown.
    pub fn set_flags(&self, id: AccountId, is_active: bool, email_verified: bool) -> bool {
        self.update(id, |record| {
            record.is_active = is_active;
            record.email_verified = email_verified;
        })
    }

    pub fn remove(&self, id: AccountId) -> Option<AccountRecord> {
        self.accounts.remove(&id).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn update(&self, id: AccountId, apply: impl FnOnce(&mut AccountRecord)) -> bool {
        match self.accounts.get_mut(&id) {
            Some(mut record) => {
                apply(&mut record);
                true
            }
            None => false,
        }
    }

    fn find(&self, predicate: impl Fn(&AccountRecord) -> bool) -> Option<AccountRecord> {
        self.accounts
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }

    fn insert_new(&self, account: NewAccount) -> Result<AccountRecord, AuthError> {
        let _guard = self
            .create_lock
            .lock()
            .map_err(|_| AuthError::Internal("account store lock poisoned".into()))?;

        if self.find(|r| r.email == account.email).is_some() {
            return Err(AuthError::ValidationError(
                "Email is already registered".into(),
            ));
        }
        if self.find(|r| r.username == account.username).is_some() {
            return Err(AuthError::ValidationError("Username is already taken".into()));
        }

        let record = AccountRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: account.email,
            username: account.username,
            password_hash: account.password_hash,
            display_name: account.display_name,
            avatar_url: None,
            is_active: true,
            email_verified: false,
        };
        self.accounts.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, AuthError> {
        Ok(self.accounts.get(&id).map(|record| record.clone()))
    }

    async fn find_by_email_or_username(
        &self,
        login: &str,
    ) -> Result<Option<AccountRecord>, AuthError> {
        Ok(self
            .find(|r| r.email == login)
            .or_else(|| self.find(|r| r.username == login)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.find(|r| r.email == email).is_some())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.find(|r| r.username == username).is_some())
    }

    async fn create(&self, account: NewAccount) -> Result<AccountRecord, AuthError> {
        self.insert_new(account)
    }

    async fn set_email_verified(&self, id: AccountId) -> Result<bool, AuthError> {
        Ok(self.update(id, |record| record.email_verified = true))
    }

    async fn deactivate(&self, id: AccountId) -> Result<bool, AuthError> {
        Ok(self.update(id, |record| record.is_active = false))
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        Ok(self.update(id, |record| {
            record.password_hash = password_hash.to_string();
        }))
    }
}
