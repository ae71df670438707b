//! Database layer (document store).
//!
//! `Db` is the typed facade used by handlers. It dispatches to Firestore in
//! production or to a process-local store for tests and local development.

pub mod documents;
pub mod firestore;
pub mod memory;

pub use documents::{Db, SignupConflict};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const ACCOUNTS: &str = "accounts";
    /// Username reservations (keyed by lowercase username)
    pub const USERNAMES: &str = "usernames";
    pub const PROFILES: &str = "profiles";
    pub const BIOMETRICS: &str = "biometrics";
    pub const PETS: &str = "pets";
    pub const STREAKS: &str = "streaks";
    pub const MEAL_PLANS: &str = "meal_plans";
    pub const ACTIVITIES: &str = "activities";
    pub const FOCUS_SESSIONS: &str = "focus_sessions";
    /// Keyed by SHA-256 of the emailed token
    pub const PASSWORD_RESET_TOKENS: &str = "password_reset_tokens";
}
