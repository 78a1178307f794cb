//! Packaging type catalog service
//!
//! Deposit types are the categories of returnable packaging (crate of 24,
//! 1L bottle, ...) carrying the unit deposit amount and the on-site stock of
//! empty units. Stock is mutated only by the deposit ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::models::{CreateDepositTypeInput, UpdateDepositTypeInput};
use shared::validation::{validate_deposit_amount, validate_type_code};

/// Service for managing the packaging type catalog
#[derive(Clone)]
pub struct DepositTypeService {
    db: PgPool,
}

/// A returnable packaging category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepositType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub name_fr: Option<String>,
    pub unit_deposit_amount: Decimal,
    pub initial_stock: i32,
    pub current_stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DEPOSIT_TYPE_COLUMNS: &str = "id, code, name, name_fr, unit_deposit_amount, initial_stock, \
                                    current_stock, is_active, created_at, updated_at";

impl DepositTypeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a packaging type; the initial stock seeds the current stock
    pub async fn create(&self, input: CreateDepositTypeInput) -> AppResult<DepositType> {
        input.validate()?;

        if let Err(msg) = validate_type_code(&input.code) {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: msg.to_string(),
                message_fr: "Le code doit contenir 3 à 10 caractères alphanumériques majuscules"
                    .to_string(),
            });
        }

        if let Err(msg) = validate_deposit_amount(input.unit_deposit_amount) {
            return Err(AppError::Validation {
                field: "unit_deposit_amount".to_string(),
                message: msg.to_string(),
                message_fr: "Le montant de consigne ne peut pas être négatif".to_string(),
            });
        }

        let code_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM deposit_types WHERE code = $1)",
        )
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if code_taken {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let initial_stock = input.initial_stock.unwrap_or(0);

        let deposit_type = sqlx::query_as::<_, DepositType>(&format!(
            r#"
            INSERT INTO deposit_types (code, name, name_fr, unit_deposit_amount, initial_stock, current_stock)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {DEPOSIT_TYPE_COLUMNS}
            "#,
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.name_fr)
        .bind(input.unit_deposit_amount)
        .bind(initial_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(deposit_type)
    }

    /// Update name, unit amount or active flag of a packaging type
    pub async fn update(&self, type_id: Uuid, input: UpdateDepositTypeInput) -> AppResult<DepositType> {
        input.validate()?;

        let existing = self.get(type_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let name_fr = input.name_fr.or(existing.name_fr);
        let unit_deposit_amount = input.unit_deposit_amount.unwrap_or(existing.unit_deposit_amount);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        if let Err(msg) = validate_deposit_amount(unit_deposit_amount) {
            return Err(AppError::Validation {
                field: "unit_deposit_amount".to_string(),
                message: msg.to_string(),
                message_fr: "Le montant de consigne ne peut pas être négatif".to_string(),
            });
        }

        let deposit_type = sqlx::query_as::<_, DepositType>(&format!(
            r#"
            UPDATE deposit_types
            SET name = $1, name_fr = $2, unit_deposit_amount = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {DEPOSIT_TYPE_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&name_fr)
        .bind(unit_deposit_amount)
        .bind(is_active)
        .bind(type_id)
        .fetch_one(&self.db)
        .await?;

        Ok(deposit_type)
    }

    /// Get a packaging type by ID
    pub async fn get(&self, type_id: Uuid) -> AppResult<DepositType> {
        let deposit_type = sqlx::query_as::<_, DepositType>(&format!(
            "SELECT {DEPOSIT_TYPE_COLUMNS} FROM deposit_types WHERE id = $1",
        ))
        .bind(type_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Packaging type".to_string()))?;

        Ok(deposit_type)
    }

    /// List packaging types, optionally only active ones
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<DepositType>> {
        let deposit_types = sqlx::query_as::<_, DepositType>(&format!(
            r#"
            SELECT {DEPOSIT_TYPE_COLUMNS}
            FROM deposit_types
            WHERE ($1 = false OR is_active = true)
            ORDER BY code
            "#,
        ))
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(deposit_types)
    }

    /// Delete a packaging type that no deposit references
    pub async fn delete(&self, type_id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM deposits WHERE deposit_type_id = $1)",
        )
        .bind(type_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::DepositTypeInUse);
        }

        let result = sqlx::query("DELETE FROM deposit_types WHERE id = $1")
            .bind(type_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Packaging type".to_string()));
        }

        Ok(())
    }
}
