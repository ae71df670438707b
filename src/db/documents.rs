// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed document operations.
//!
//! Provides high-level operations for:
//! - Accounts (credentials, username reservations)
//! - Profiles, pets and streaks (seeded at signup)
//! - Biometrics (merge-upsert through an atomic update)
//! - Meal plans, activity logs and focus sessions (append-only)
//! - Password reset tokens

use crate::config::DatabaseBackend;
use crate::db::collections;
use crate::db::{FirestoreStore, MemoryStore};
use crate::error::AppError;
use crate::models::{
    Account, ActivityLog, BiometricRecord, FocusSession, MealPlan, PasswordResetToken, PetData,
    Profile, StreakData, UsernameClaim,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

/// Document store handle shared by all requests.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

/// Why account creation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupConflict {
    Email,
    Username,
}

impl Db {
    /// Build the store selected by configuration.
    pub fn from_config(database: &DatabaseBackend) -> Self {
        match database {
            DatabaseBackend::Firestore { project_id } => Self::firestore(project_id),
            DatabaseBackend::Memory => Self::memory(),
        }
    }

    pub fn firestore(project_id: &str) -> Self {
        Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id)),
        }
    }

    /// Process-local store (tests, local development).
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
        }
    }

    /// Establish the backing connection eagerly.
    pub async fn connect(&self) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.connect().await,
            Backend::Memory(_) => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
        }
    }

    // ─── Backend Dispatch ────────────────────────────────────────

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.get(collection, id).await,
            Backend::Memory(store) => store.get(collection, id).await,
        }
    }

    async fn set<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.set(collection, id, value).await,
            Backend::Memory(store) => store.set(collection, id, value).await,
        }
    }

    async fn insert<T>(&self, collection: &str, id: &str, value: &T) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.insert(collection, id, value).await,
            Backend::Memory(store) => store.insert(collection, id, value).await,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.delete(collection, id).await,
            Backend::Memory(store) => store.delete(collection, id).await,
        }
    }

    async fn find_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        order_field: &str,
        limit: u32,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => {
                store
                    .find_eq(collection, field, value, order_field, limit)
                    .await
            }
            Backend::Memory(store) => {
                store
                    .find_eq(collection, field, value, order_field, limit)
                    .await
            }
        }
    }

    async fn modify<T, R, F>(&self, collection: &str, id: &str, f: F) -> Result<R, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
        R: Send,
        F: FnOnce(Option<T>) -> Result<(Option<T>, R), AppError> + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.modify(collection, id, f).await,
            Backend::Memory(store) => store.modify(collection, id, f).await,
        }
    }

    // ─── Account Operations ──────────────────────────────────────

    /// Get an account by normalized email.
    pub async fn get_account(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.get(collections::ACCOUNTS, email).await
    }

    /// Create an account together with its profile, pet and streak.
    ///
    /// The email and username are reserved with insert-only writes. If the
    /// username is taken after the email was reserved, the email reservation
    /// is released again.
    pub async fn create_account(
        &self,
        account: &Account,
        profile: &Profile,
    ) -> Result<std::result::Result<(), SignupConflict>, AppError> {
        if !self
            .insert(collections::ACCOUNTS, &account.email, account)
            .await?
        {
            return Ok(Err(SignupConflict::Email));
        }

        let claim = UsernameClaim {
            username: account.username.clone(),
            email: account.email.clone(),
        };
        let username_key = account.username.to_lowercase();
        if !self
            .insert(collections::USERNAMES, &username_key, &claim)
            .await?
        {
            self.delete(collections::ACCOUNTS, &account.email).await?;
            return Ok(Err(SignupConflict::Username));
        }

        self.set(collections::PROFILES, &account.email, profile)
            .await?;
        self.set(
            collections::PETS,
            &account.email,
            &PetData::starter(&account.email),
        )
        .await?;
        self.set(
            collections::STREAKS,
            &account.email,
            &StreakData::starter(&account.email),
        )
        .await?;

        tracing::info!(email = %account.email, "Account created");
        Ok(Ok(()))
    }

    /// Replace the password hash of an existing account.
    pub async fn set_password_hash(&self, email: &str, password_hash: &str) -> Result<(), AppError> {
        let password_hash = password_hash.to_string();
        let updated = self
            .modify(collections::ACCOUNTS, email, move |current: Option<Account>| {
                Ok(match current {
                    Some(mut account) => {
                        account.password_hash = password_hash;
                        (Some(account), true)
                    }
                    None => (None, false),
                })
            })
            .await?;

        if updated {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".to_string()))
        }
    }

    // ─── Profile / Pet / Streak Operations ───────────────────────

    pub async fn get_profile(&self, email: &str) -> Result<Option<Profile>, AppError> {
        self.get(collections::PROFILES, email).await
    }

    pub async fn set_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.set(collections::PROFILES, &profile.email, profile)
            .await
    }

    pub async fn get_pet(&self, email: &str) -> Result<Option<PetData>, AppError> {
        self.get(collections::PETS, email).await
    }

    pub async fn get_streak(&self, email: &str) -> Result<Option<StreakData>, AppError> {
        self.get(collections::STREAKS, email).await
    }

    /// Record a log for `today` and return the resulting streak.
    pub async fn record_streak_log(
        &self,
        email: &str,
        today: NaiveDate,
    ) -> Result<StreakData, AppError> {
        let email_owned = email.to_string();
        self.modify(collections::STREAKS, email, move |current: Option<StreakData>| {
            let mut streak = current.unwrap_or_else(|| StreakData::starter(&email_owned));
            if streak.record_log(today) {
                Ok((Some(streak.clone()), streak))
            } else {
                Ok((None, streak))
            }
        })
        .await
    }

    // ─── Biometrics Operations ───────────────────────────────────

    pub async fn get_biometrics(&self, email: &str) -> Result<Option<BiometricRecord>, AppError> {
        self.get(collections::BIOMETRICS, email).await
    }

    /// Atomically merge into the stored biometrics.
    ///
    /// `build` receives the record as it is at write time and returns the
    /// record to store. Two concurrent updates each see the other's result
    /// instead of both merging over the same stale snapshot.
    pub async fn update_biometrics_atomic<F>(
        &self,
        email: &str,
        build: F,
    ) -> Result<BiometricRecord, AppError>
    where
        F: FnOnce(Option<BiometricRecord>) -> Result<BiometricRecord, AppError> + Send,
    {
        self.modify(collections::BIOMETRICS, email, move |current| {
            let record = build(current)?;
            Ok((Some(record.clone()), record))
        })
        .await
    }

    // ─── Meal Plan Operations ────────────────────────────────────

    /// Store a new plan. Plans are never updated.
    pub async fn insert_meal_plan(&self, plan: &MealPlan) -> Result<(), AppError> {
        if !self
            .insert(collections::MEAL_PLANS, &plan.id, plan)
            .await?
        {
            return Err(AppError::Database(format!(
                "Meal plan id collision: {}",
                plan.id
            )));
        }
        Ok(())
    }

    /// The most recently created plan for a user.
    pub async fn latest_meal_plan(&self, email: &str) -> Result<Option<MealPlan>, AppError> {
        let plans: Vec<MealPlan> = self
            .find_eq(collections::MEAL_PLANS, "email", email, "createdAt", 1)
            .await?;
        Ok(plans.into_iter().next())
    }

    // ─── Activity / Focus Operations ─────────────────────────────

    pub async fn insert_activity(&self, activity: &ActivityLog) -> Result<(), AppError> {
        self.set(collections::ACTIVITIES, &activity.id, activity)
            .await
    }

    /// Most recent activity logs for a user, newest first.
    pub async fn recent_activities(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, AppError> {
        self.find_eq(collections::ACTIVITIES, "email", email, "loggedAt", limit)
            .await
    }

    pub async fn insert_focus_session(&self, session: &FocusSession) -> Result<(), AppError> {
        self.set(collections::FOCUS_SESSIONS, &session.id, session)
            .await
    }

    // ─── Password Reset Operations ───────────────────────────────

    pub async fn insert_reset_token(&self, token: &PasswordResetToken) -> Result<(), AppError> {
        self.set(collections::PASSWORD_RESET_TOKENS, &token.token_hash, token)
            .await
    }

    /// Mark a reset token used if it is still valid at `now`.
    ///
    /// Returns the token when it was consumed by this call. A token can be
    /// consumed at most once even under concurrent requests.
    pub async fn consume_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, AppError> {
        self.modify(
            collections::PASSWORD_RESET_TOKENS,
            token_hash,
            move |current: Option<PasswordResetToken>| {
                Ok(match current {
                    Some(mut token) if token.is_valid_at(now) => {
                        token.used = true;
                        (Some(token.clone()), Some(token))
                    }
                    _ => (None, None),
                })
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::now_rfc3339;

    fn account(email: &str, username: &str) -> (Account, Profile) {
        let account = Account {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            created_at: now_rfc3339(),
        };
        let profile = Profile {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            date_of_birth: "01/01/2000".to_string(),
            bio: String::new(),
            avatar: String::new(),
            username: username.to_string(),
            updated_at: now_rfc3339(),
        };
        (account, profile)
    }

    #[tokio::test]
    async fn test_create_account_seeds_side_documents() {
        let db = Db::memory();
        let (acct, profile) = account("a@b.com", "alice");

        assert_eq!(db.create_account(&acct, &profile).await.unwrap(), Ok(()));
        assert!(db.get_profile("a@b.com").await.unwrap().is_some());
        assert_eq!(db.get_pet("a@b.com").await.unwrap().unwrap().health, 100);
        assert_eq!(
            db.get_streak("a@b.com").await.unwrap().unwrap().current_streak,
            0
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_releases_email() {
        let db = Db::memory();
        let (first, profile) = account("a@b.com", "alice");
        db.create_account(&first, &profile).await.unwrap().unwrap();

        let (second, profile) = account("c@d.com", "ALICE");
        assert_eq!(
            db.create_account(&second, &profile).await.unwrap(),
            Err(SignupConflict::Username)
        );
        assert!(db.get_account("c@d.com").await.unwrap().is_none());

        let (third, profile) = account("a@b.com", "bob");
        assert_eq!(
            db.create_account(&third, &profile).await.unwrap(),
            Err(SignupConflict::Email)
        );
    }

    #[tokio::test]
    async fn test_reset_token_consumed_once() {
        let db = Db::memory();
        let now = Utc::now();
        let token = PasswordResetToken::issue("h1".to_string(), "a@b.com", now);
        db.insert_reset_token(&token).await.unwrap();

        assert!(db.consume_reset_token("h1", now).await.unwrap().is_some());
        assert!(db.consume_reset_token("h1", now).await.unwrap().is_none());
        assert!(db.consume_reset_token("missing", now).await.unwrap().is_none());
    }
}
