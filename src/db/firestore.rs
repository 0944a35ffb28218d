// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Accounts and role profiles (members, trainers)
//! - Workout and diet plans
//! - Calendar events
//! - Coupons, orders, and payment redemptions

use crate::db::collections;
use crate::error::AppError;
use crate::models::payment::OrderStatus;
use crate::models::{
    Account, Coupon, Event, Member, Order, Plan, PlanDay, Redemption, Review, Trainer,
};
use crate::time_utils::sortable_timestamp;
use chrono::{DateTime, Utc};
use firestore::{
    paths_camel_case, FirestoreConsistencySelector, FirestoreQueryDirection,
    FirestoreTransaction, FirestoreWritePrecondition,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
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
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Helpers ───────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        read_doc(self.get_client()?, collection, id).await
    }

    /// Overwrite only `fields` of an existing document.
    ///
    /// Other fields keep whatever a concurrent writer stored. The document
    /// must exist, so a write racing a deletion does not resurrect it.
    async fn set_doc_fields<T>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
        fields: Vec<String>,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collection)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents in `collection` whose `field` equals `value`.
    async fn query_eq<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.field(field).eq(value))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Account Operations ─────────────────────────────────────

    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        self.get_doc(collections::ACCOUNTS, id).await
    }

    pub async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let accounts: Vec<Account> = self
            .query_eq(collections::ACCOUNTS, "username", username)
            .await?;
        Ok(accounts.into_iter().next())
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts: Vec<Account> = self.query_eq(collections::ACCOUNTS, "email", email).await?;
        Ok(accounts.into_iter().next())
    }

    /// Store the account's contact phone, leaving the credentials untouched.
    pub async fn update_account_phone(&self, account: &Account) -> Result<(), AppError> {
        self.set_doc_fields(
            collections::ACCOUNTS,
            &account.id,
            account,
            paths_camel_case!(Account::{ phone }),
        )
        .await
    }

    /// Create an account and its member profile in one transaction.
    pub async fn create_member_account(
        &self,
        account: &Account,
        member: &Member,
    ) -> Result<(), AppError> {
        self.create_account_with_profile(account, collections::MEMBERS, member)
            .await
    }

    /// Create an account and its trainer profile in one transaction.
    pub async fn create_trainer_account(
        &self,
        account: &Account,
        trainer: &Trainer,
    ) -> Result<(), AppError> {
        self.create_account_with_profile(account, collections::TRAINERS, trainer)
            .await
    }

    async fn create_account_with_profile<P>(
        &self,
        account: &Account,
        profile_collection: &str,
        profile: &P,
    ) -> Result<(), AppError>
    where
        P: Serialize + DeserializeOwned + Send + Sync,
    {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::ACCOUNTS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&account.id)
            .object(account)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add account to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(profile_collection)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&account.id)
            .object(profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            account_id = %account.id,
            role = %account.role,
            "Account created"
        );

        Ok(())
    }

    // ─── Member Operations ──────────────────────────────────────

    pub async fn get_member(&self, id: &str) -> Result<Option<Member>, AppError> {
        self.get_doc(collections::MEMBERS, id).await
    }

    /// Store the member's self-editable profile fields.
    ///
    /// `membership` and `assignedTrainer` are not written, so a payment
    /// verified meanwhile is never rolled back by a profile edit.
    pub async fn update_member_profile(&self, member: &Member) -> Result<(), AppError> {
        self.set_doc_fields(
            collections::MEMBERS,
            &member.id,
            member,
            paths_camel_case!(Member::{
                phone,
                age,
                gender,
                emergency_contact,
                health_conditions,
                updated_at
            }),
        )
        .await
    }

    /// Store the member's trainer assignment.
    pub async fn update_member_trainer(&self, member: &Member) -> Result<(), AppError> {
        self.set_doc_fields(
            collections::MEMBERS,
            &member.id,
            member,
            paths_camel_case!(Member::{ assigned_trainer, updated_at }),
        )
        .await
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERS)
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Members whose `assignedTrainer` is `trainer_id` (the trainer's clients).
    pub async fn list_members_for_trainer(&self, trainer_id: &str) -> Result<Vec<Member>, AppError> {
        self.query_eq(collections::MEMBERS, "assignedTrainer", trainer_id)
            .await
    }

    // ─── Trainer Operations ─────────────────────────────────────

    pub async fn get_trainer(&self, id: &str) -> Result<Option<Trainer>, AppError> {
        self.get_doc(collections::TRAINERS, id).await
    }

    /// Store the trainer's self-editable profile fields.
    pub async fn update_trainer_profile(&self, trainer: &Trainer) -> Result<(), AppError> {
        self.set_doc_fields(
            collections::TRAINERS,
            &trainer.id,
            trainer,
            paths_camel_case!(Trainer::{
                full_name,
                phone,
                age,
                gender,
                specialization,
                experience,
                certification,
                fee_per_month,
                availability,
                updated_at
            }),
        )
        .await
    }

    pub async fn update_trainer_photo(&self, trainer: &Trainer) -> Result<(), AppError> {
        self.set_doc_fields(
            collections::TRAINERS,
            &trainer.id,
            trainer,
            paths_camel_case!(Trainer::{ photo, updated_at }),
        )
        .await
    }

    /// Add or replace a member's review and recompute the rating.
    ///
    /// The trainer is read inside the transaction, so two members reviewing
    /// at once cannot drop each other's review.
    pub async fn add_review_atomic(
        &self,
        trainer_id: &str,
        review: Review,
    ) -> Result<Trainer, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = transaction_reader(client, &transaction);

        let mut trainer: Trainer = match read_doc(&reader, collections::TRAINERS, trainer_id).await
        {
            Ok(Some(trainer)) => trainer,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Trainer {} not found", trainer_id)));
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        trainer.updated_at = review.created_at.clone();
        trainer.upsert_review(review);

        client
            .fluent()
            .update()
            .fields(paths_camel_case!(Trainer::{ reviews, rating, updated_at }))
            .in_col(collections::TRAINERS)
            .document_id(&trainer.id)
            .object(&trainer)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add trainer to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(trainer)
    }

    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRAINERS)
            .order_by([("rating", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Plan Operations ────────────────────────────────────────

    pub async fn get_plan<D: PlanDay>(&self, plan_id: &str) -> Result<Option<Plan<D>>, AppError> {
        self.get_doc(D::COLLECTION, plan_id).await
    }

    pub async fn upsert_plan<D: PlanDay>(&self, plan: &Plan<D>) -> Result<(), AppError> {
        self.set_doc(D::COLLECTION, &plan.id, plan).await
    }

    /// The most recently created plan for a member, regardless of author.
    pub async fn latest_plan_for_member<D: PlanDay>(
        &self,
        member_id: &str,
    ) -> Result<Option<Plan<D>>, AppError> {
        let plans: Vec<Plan<D>> = self
            .get_client()?
            .fluent()
            .select()
            .from(D::COLLECTION)
            .filter(|q| q.field("memberId").eq(member_id))
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(plans.into_iter().next())
    }

    /// All plans authored by a trainer, newest first.
    pub async fn plans_for_trainer<D: PlanDay>(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<Plan<D>>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(D::COLLECTION)
            .filter(|q| q.field("trainerId").eq(trainer_id))
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Event Operations ───────────────────────────────────────

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        self.get_doc(collections::EVENTS, id).await
    }

    pub async fn upsert_event(&self, event: &Event) -> Result<(), AppError> {
        self.set_doc(collections::EVENTS, &event.id, event).await
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::EVENTS, id).await
    }

    /// All events owned by `owner_id`, by date ascending.
    pub async fn list_events_for_owner(&self, owner_id: &str) -> Result<Vec<Event>, AppError> {
        let mut events: Vec<Event> = self
            .query_eq(collections::EVENTS, "ownerId", owner_id)
            .await?;
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    // ─── Coupon Operations ──────────────────────────────────────

    /// Look up a coupon by code (case-insensitive).
    pub async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>, AppError> {
        self.get_doc(collections::COUPONS, &crate::models::coupon::coupon_doc_id(code))
            .await
    }

    pub async fn upsert_coupon(&self, coupon: &Coupon) -> Result<(), AppError> {
        let doc_id = crate::models::coupon::coupon_doc_id(&coupon.code);
        self.set_doc(collections::COUPONS, &doc_id, coupon).await
    }

    pub async fn delete_coupon(&self, code: &str) -> Result<(), AppError> {
        self.delete_doc(collections::COUPONS, &crate::models::coupon::coupon_doc_id(code))
            .await
    }

    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COUPONS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Order & Payment Operations ─────────────────────────────

    pub async fn get_order(&self, order_ref: &str) -> Result<Option<Order>, AppError> {
        self.get_doc(collections::ORDERS, order_ref).await
    }

    pub async fn get_redemption(&self, payment_ref: &str) -> Result<Option<Redemption>, AppError> {
        self.get_doc(collections::PAYMENT_REDEMPTIONS, payment_ref)
            .await
    }

    /// Persist a new order and move the member to `pending` together.
    ///
    /// The member is re-read inside the transaction: an active membership
    /// stays active, and only `membership` and `updatedAt` are written.
    /// Returns the member as committed.
    pub async fn create_order_atomic(
        &self,
        order: &Order,
        member_id: &str,
        now: &str,
    ) -> Result<Member, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = transaction_reader(client, &transaction);

        let mut member: Member = match read_doc(&reader, collections::MEMBERS, member_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Member {} not found", member_id)));
            }
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(e);
            }
        };

        client
            .fluent()
            .update()
            .in_col(collections::ORDERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&order.order_ref)
            .object(order)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add order to transaction: {}", e)))?;

        if member.membership.mark_pending() {
            member.updated_at = now.to_string();
            client
                .fluent()
                .update()
                .fields(paths_camel_case!(Member::{ membership, updated_at }))
                .in_col(collections::MEMBERS)
                .document_id(&member.id)
                .object(&member)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add member to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(member)
    }

    /// Atomically consume a verified payment and activate the membership.
    ///
    /// Writes the redemption record (create-only), marks the order paid, and
    /// activates the member in one transaction. A payment or order that was
    /// already consumed yields `Conflict`; an order that is missing or owned
    /// by someone else yields `NotFound`.
    ///
    /// The signature must have been verified by the caller.
    pub async fn redeem_payment_atomic(
        &self,
        order_ref: &str,
        payment_ref: &str,
        member_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Member, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = transaction_reader(client, &transaction);

        let (mut order, mut member) =
            match load_redeemable(&reader, order_ref, payment_ref, member_id).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };

        let stamp = sortable_timestamp(now);
        member.membership.activate(&order.plan_name, now);
        member.updated_at = stamp.clone();
        order.status = OrderStatus::Paid;
        order.paid_at = Some(stamp.clone());

        let redemption = Redemption {
            payment_ref: payment_ref.to_string(),
            order_ref: order.order_ref.clone(),
            member_id: member_id.to_string(),
            plan_name: order.plan_name.clone(),
            amount: order.amount,
            redeemed_at: stamp,
        };

        // Create-only: a concurrent redemption of the same payment fails the commit.
        client
            .fluent()
            .update()
            .in_col(collections::PAYMENT_REDEMPTIONS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(payment_ref)
            .object(&redemption)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add redemption to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::ORDERS)
            .document_id(&order.order_ref)
            .object(&order)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add order to transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .fields(paths_camel_case!(Member::{ membership, updated_at }))
            .in_col(collections::MEMBERS)
            .document_id(&member.id)
            .object(&member)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add member to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            // Lost a race with another verification of the same payment.
            if self.get_redemption(payment_ref).await?.is_some() {
                tracing::warn!(
                    order_ref,
                    payment_ref,
                    "Concurrent redemption detected, rejecting replay"
                );
                return Err(AppError::Conflict(format!(
                    "Payment {} has already been redeemed",
                    payment_ref
                )));
            }
            return Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                e
            )));
        }

        tracing::info!(
            member_id,
            order_ref,
            payment_ref,
            plan = %order.plan_name,
            "Membership activated"
        );

        Ok(member)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    async fn delete_plans_for_member<D: PlanDay>(&self, member_id: &str) -> Result<usize, AppError> {
        let plans: Vec<Plan<D>> = self
            .query_eq(D::COLLECTION, "memberId", member_id)
            .await?;
        self.batch_delete(&plans, D::COLLECTION, |p: &Plan<D>| p.id.clone())
            .await?;
        Ok(plans.len())
    }

    // ─── Member Deletion (admin) ────────────────────────────────────

    /// Delete a member and everything keyed to them.
    ///
    /// Deletes:
    /// - `events` owned by the member
    /// - `workout_plans` and `diet_plans` for the member
    /// - `members/{id}`
    /// - `accounts/{id}`
    ///
    /// Orders and redemptions are kept as payment records.
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_member_data(&self, member_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        // 1. Events
        let events: Vec<Event> = self
            .query_eq(collections::EVENTS, "ownerId", member_id)
            .await?;
        self.batch_delete(&events, collections::EVENTS, |e: &Event| e.id.clone())
            .await?;
        deleted_count += events.len();
        tracing::debug!(member_id, count = events.len(), "Deleted events");

        // 2. Plans
        deleted_count += self
            .delete_plans_for_member::<crate::models::plan::WorkoutDay>(member_id)
            .await?;
        deleted_count += self
            .delete_plans_for_member::<crate::models::plan::DietDay>(member_id)
            .await?;

        // 3. Profile and credentials
        self.delete_doc(collections::MEMBERS, member_id).await?;
        self.delete_doc(collections::ACCOUNTS, member_id).await?;
        deleted_count += 2;

        tracing::info!(member_id, deleted_count, "Member data deletion complete");

        Ok(deleted_count)
    }
}

/// A handle whose reads join `transaction`.
///
/// Documents read through it are locked until the transaction commits or
/// rolls back, so the writes that follow are based on current data.
fn transaction_reader(
    client: &firestore::FirestoreDb,
    transaction: &FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

async fn read_doc<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Read the order and member for a redemption, refusing replays.
async fn load_redeemable(
    reader: &firestore::FirestoreDb,
    order_ref: &str,
    payment_ref: &str,
    member_id: &str,
) -> Result<(Order, Member), AppError> {
    let order: Order = read_doc(reader, collections::ORDERS, order_ref)
        .await?
        .filter(|o: &Order| o.member_id == member_id)
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_ref)))?;

    if order.status == OrderStatus::Paid {
        return Err(AppError::Conflict(format!(
            "Order {} has already been paid",
            order_ref
        )));
    }

    let redeemed: Option<Redemption> =
        read_doc(reader, collections::PAYMENT_REDEMPTIONS, payment_ref).await?;
    if redeemed.is_some() {
        return Err(AppError::Conflict(format!(
            "Payment {} has already been redeemed",
            payment_ref
        )));
    }

    let member: Member = read_doc(reader, collections::MEMBERS, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;

    Ok((order, member))
}
