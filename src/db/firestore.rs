// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper for the `users` collection.

use crate::db::{collections, UserStore};
use crate::error::AppError;
use crate::models::{FieldMap, UserDocument};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJvd25lciJ9."
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
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, uid: &str) -> Result<Option<UserDocument>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, uid: &str, doc: &UserDocument) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Partial update through a field mask.
    ///
    /// The patch is laid over a default document so it serializes with the
    /// collection's types; only the masked keys are written.
    async fn update_user(&self, uid: &str, fields: &FieldMap) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }

        let doc = UserDocument::default()
            .apply_fields(fields)
            .map_err(|e| AppError::BadRequest(format!("Invalid user fields: {}", e)))?;

        let _: () = self
            .client
            .fluent()
            .update()
            .fields(fields.keys())
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read-increment-write inside a transaction so concurrent logins on two
    /// devices both count.
    async fn record_login(&self, uid: &str, now: &str) -> Result<(), AppError> {
        let client = &self.client;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<UserDocument> = client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut doc) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("User {} not found", uid)));
        };

        doc.last_login_at = Some(now.to_string());
        doc.login_count += 1;

        client
            .fluent()
            .update()
            .fields(["lastLoginAt", "loginCount"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add login to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(uid, login_count = doc.login_count, "Login recorded");
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        tracing::info!(uid, "Deleted user document");
        Ok(())
    }
}
