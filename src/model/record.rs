use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use super::Model;
use super::policy::is_fillable;
use crate::connection::Database;
use crate::error::SqlRecordError;
use crate::query::FromRow;
use crate::results::CustomDbRow;
use crate::types::RowValues;

/// Lifecycle of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Built in memory; `original` has no id.
    Transient,
    /// Backed by a row; `original` holds its id.
    Persisted,
    /// Deleted from storage; both attribute maps are empty.
    Deleted,
}

/// One row of model `M`: the current attributes plus the last persisted snapshot.
///
/// Writes go through the model's fillable/guarded policy. Reads are unchecked.
pub struct Record<M: Model> {
    attributes: BTreeMap<String, RowValues>,
    original: BTreeMap<String, RowValues>,
    deleted: bool,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> Record<M> {
    /// A transient record holding the fillable subset of `attributes`.
    pub fn new<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        let mut record = Self::empty();
        record.fill(attributes);
        record
    }

    /// A persisted record built from stored values, bypassing the fillable policy.
    pub fn hydrate<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        let mut record = Self::empty();
        record.attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        record.sync_original();
        record
    }

    fn empty() -> Self {
        Self {
            attributes: BTreeMap::new(),
            original: BTreeMap::new(),
            deleted: false,
            model: PhantomData,
        }
    }

    #[must_use]
    pub fn is_fillable(&self, key: &str) -> bool {
        is_fillable(M::FILLABLE, M::GUARDED, key)
    }

    /// Write one attribute if the policy allows it; returns whether it was written.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RowValues>) -> bool {
        let key = key.into();
        if !self.is_fillable(&key) {
            warn!(table = M::TABLE, key = %key, "attribute is not fillable");
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    /// Write every allowed attribute; rejected keys are skipped.
    pub fn fill<I, K, V>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        for (key, value) in attributes {
            self.set(key, value);
        }
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RowValues> {
        self.attributes.get(key)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, RowValues> {
        &self.attributes
    }

    /// The last persisted snapshot.
    #[must_use]
    pub fn original(&self) -> &BTreeMap<String, RowValues> {
        &self.original
    }

    /// Current `id` attribute, if it is an integer.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.attributes.get("id").and_then(RowValues::as_int).copied()
    }

    fn original_id(&self) -> Option<RowValues> {
        self.original.get("id").filter(|id| !id.is_null()).cloned()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.original_id().is_some()
    }

    #[must_use]
    pub fn state(&self) -> RecordState {
        if self.deleted {
            RecordState::Deleted
        } else if self.exists() {
            RecordState::Persisted
        } else {
            RecordState::Transient
        }
    }

    /// Attributes whose value differs from the persisted snapshot.
    #[must_use]
    pub fn dirty(&self) -> BTreeMap<&str, &RowValues> {
        self.attributes
            .iter()
            .filter(|(key, value)| self.original.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.attributes.len() != self.original.len() || !self.dirty().is_empty()
    }

    /// Make the snapshot equal to the current attributes.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    /// Attributes without the model's hidden keys.
    #[must_use]
    pub fn to_array(&self) -> BTreeMap<String, RowValues> {
        self.attributes
            .iter()
            .filter(|(key, _)| !M::HIDDEN.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// [`to_array`](Self::to_array) as a JSON object.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        let object: Map<String, JsonValue> = self
            .to_array()
            .into_iter()
            .map(|(key, value)| (key, value.to_json_value()))
            .collect();
        JsonValue::Object(object)
    }

    /// [`to_array`](Self::to_array) serialized as a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }

    /// Insert a transient record or update a persisted one.
    ///
    /// An insert adopts the new identity into `id`. An update writes every attribute
    /// except `id`, keyed by the persisted id; a changed `id` attribute is reset to
    /// that key. Either way the snapshot is refreshed.
    ///
    /// # Errors
    /// Returns `UsageError` for a deleted record, otherwise backend errors.
    pub async fn save(&mut self, db: &Database) -> Result<(), SqlRecordError> {
        match self.state() {
            RecordState::Deleted => {
                return Err(SqlRecordError::UsageError(format!(
                    "Cannot save a deleted {} record.",
                    M::TABLE
                )));
            }
            RecordState::Persisted => {
                let key = self.original_id().unwrap_or(RowValues::Null);
                let data: Vec<(String, RowValues)> = self
                    .attributes
                    .iter()
                    .filter(|(column, _)| column.as_str() != "id")
                    .map(|(column, value)| (column.clone(), value.clone()))
                    .collect();
                if !data.is_empty() {
                    db.table(M::TABLE).update(data, [("id", key.clone())]).await?;
                }
                // id is not written, so the row keeps the key it was found by
                if self.attributes.get("id") != Some(&key) {
                    warn!(table = M::TABLE, "id change ignored on save");
                    self.attributes.insert("id".to_string(), key);
                }
            }
            RecordState::Transient => {
                let data: Vec<(String, RowValues)> = self
                    .attributes
                    .iter()
                    .filter(|(column, value)| !(column.as_str() == "id" && value.is_null()))
                    .map(|(column, value)| (column.clone(), value.clone()))
                    .collect();
                let id = db.table(M::TABLE).insert(data).await?;
                self.attributes.insert("id".to_string(), RowValues::Int(id));
            }
        }
        self.sync_original();
        Ok(())
    }

    /// Delete the stored row. On success both attribute maps are cleared.
    ///
    /// # Errors
    /// Returns `UsageError` if the record is not persisted, otherwise backend errors.
    pub async fn delete(&mut self, db: &Database) -> Result<bool, SqlRecordError> {
        let key = self.original_id().ok_or_else(|| {
            SqlRecordError::UsageError("No ID found for delete operation.".into())
        })?;
        let affected = db.table(M::TABLE).filter("id", "=", key).delete().await?;
        if affected > 0 {
            self.attributes.clear();
            self.original.clear();
            self.deleted = true;
        }
        Ok(affected > 0)
    }

    /// Merge the fillable subset of `attributes` and update just those columns.
    ///
    /// Returns whether a row was affected; nothing is sent when no key is accepted.
    ///
    /// # Errors
    /// Returns `UsageError` if the record is not persisted, otherwise backend errors.
    pub async fn update_attributes<I, K, V>(
        &mut self,
        db: &Database,
        attributes: I,
    ) -> Result<bool, SqlRecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RowValues>,
    {
        let key = self.original_id().ok_or_else(|| {
            SqlRecordError::UsageError("No ID found for update operation.".into())
        })?;
        let mut accepted: Vec<(String, RowValues)> = Vec::new();
        for (column, value) in attributes {
            let column = column.into();
            let value = value.into();
            if self.set(column.clone(), value.clone()) {
                accepted.push((column, value));
            }
        }
        if accepted.is_empty() {
            return Ok(false);
        }

        let affected = db
            .table(M::TABLE)
            .update(accepted.clone(), [("id", key)])
            .await?;
        if affected > 0 {
            self.original.extend(accepted);
        }
        Ok(affected > 0)
    }
}

impl<M: Model> FromRow for Record<M> {
    fn from_row(row: CustomDbRow) -> Result<Self, SqlRecordError> {
        let CustomDbRow {
            column_names, rows, ..
        } = row;
        Ok(Self::hydrate(column_names.iter().cloned().zip(rows)))
    }
}

impl<M: Model> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            original: self.original.clone(),
            deleted: self.deleted,
            model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &M::TABLE)
            .field("state", &self.state())
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}
