// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend with untyped collection operations.
//!
//! The client is created lazily on first use. Concurrent first callers all
//! await the same in-flight connection attempt instead of opening their own.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Firestore-backed document store.
#[derive(Clone)]
pub struct FirestoreStore {
    project_id: String,
    client: Arc<OnceCell<firestore::FirestoreDb>>,
}

impl FirestoreStore {
    /// Create a store for `project_id`. No network traffic until first use.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            client: Arc::new(OnceCell::new()),
        }
    }

    /// Connect now instead of on the first request.
    pub async fn connect(&self) -> Result<(), AppError> {
        self.get_client().await.map(|_| ())
    }

    /// Get the client, connecting exactly once.
    async fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .get_or_try_init(|| connect_client(&self.project_id))
            .await
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()
            .await?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite a document.
    pub async fn set<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()
            .await?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(value)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a document only if the id is free.
    ///
    /// Returns `false` when a document with that id already exists.
    pub async fn insert<T>(&self, collection: &str, id: &str, value: &T) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let result: Result<(), firestore::errors::FirestoreError> = self
            .get_client()
            .await?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(value)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()
            .await?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Documents whose string `field` equals `value`, newest `order_field` first.
    pub async fn find_eq<T>(
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
        let value = value.to_string();
        self.get_client()
            .await?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .order_by([(order_field, firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read-modify-write a single document inside a transaction.
    ///
    /// `f` receives the current document and returns the replacement (or
    /// `None` to leave it untouched) plus a value handed back to the caller.
    pub async fn modify<T, R, F>(&self, collection: &str, id: &str, f: F) -> Result<R, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
        R: Send,
        F: FnOnce(Option<T>) -> Result<(Option<T>, R), AppError> + Send,
    {
        let client = self.get_client().await?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // Reads through this handle take the transaction's document lock
        let reader = client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );
        let current: Option<T> = reader
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read {} in transaction: {}", collection, e))
            })?;

        let (replacement, output) = match f(current) {
            Ok(result) => result,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        let Some(replacement) = replacement else {
            let _ = transaction.rollback().await;
            return Ok(output);
        };

        client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&replacement)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add {} to transaction: {}", collection, e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(output)
    }
}

async fn connect_client(project_id: &str) -> Result<firestore::FirestoreDb, AppError> {
    // If the emulator environment variable is set, use unauthenticated connection
    // to avoid local credential warnings and leakage.
    if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
        return create_emulator_client(project_id).await;
    }

    let client = firestore::FirestoreDb::new(project_id)
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

    tracing::info!(project = project_id, "Connected to Firestore");
    Ok(client)
}

/// Create a Firestore client for the emulator with unauthenticated access.
async fn create_emulator_client(project_id: &str) -> Result<firestore::FirestoreDb, AppError> {
    tracing::info!("Using unauthenticated connection for Firestore Emulator");

    let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(
                "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                    .to_string()
                    .into(),
            ),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });

    let options = firestore::FirestoreDbOptions::new(project_id.to_string());

    let client = firestore::FirestoreDb::with_options_token_source(
        options,
        gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
    )
    .await
    .map_err(|e| AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e)))?;

    tracing::info!(
        project = project_id,
        "Connected to Firestore (Emulator/Unauthenticated)"
    );

    Ok(client)
}
