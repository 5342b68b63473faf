use serde_json::{Map, Value};
use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{authorize, rules::validate, Operation, PolicyError, Table};
use crate::store::{ListFilter, RawRecord, RecordStore};

/// One caller's view of one table.
pub struct ScopedAccess<'a> {
    store: &'a dyn RecordStore,
    table: &'static Table,
    caller: Uuid,
}

impl<'a> ScopedAccess<'a> {
    pub fn new(store: &'a dyn RecordStore, table: &'static Table, caller: Uuid) -> Self {
        Self {
            store,
            table,
            caller,
        }
    }

    fn owner_filter(&self) -> Option<Uuid> {
        self.table.is_owned().then_some(self.caller)
    }

    pub async fn list(
        &self,
        since: Option<Date>,
        until: Option<Date>,
    ) -> Result<Vec<RawRecord>, PolicyError> {
        let filter = ListFilter {
            owner: self.owner_filter(),
            since,
            until,
        };
        self.store
            .list(self.table, filter)
            .await
            .map_err(|e| PolicyError::store(self.table, Operation::List, e))
    }

    async fn load(&self, id: Uuid, op: Operation) -> Result<RawRecord, PolicyError> {
        let record = self
            .store
            .fetch(self.table, id)
            .await
            .map_err(|e| PolicyError::store(self.table, Operation::Retrieve, e))?
            .ok_or(PolicyError::NotFound(self.table.label))?;
        if let Err(e) = authorize(self.table, op, self.caller, record.owner) {
            warn!(kind = self.table.label, %id, caller = %self.caller, op = op.verb(), "access denied");
            return Err(e);
        }
        Ok(record)
    }

    pub async fn retrieve(&self, id: Uuid) -> Result<RawRecord, PolicyError> {
        self.load(id, Operation::Retrieve).await
    }

    pub async fn create(&self, payload: &Map<String, Value>) -> Result<RawRecord, PolicyError> {
        authorize(self.table, Operation::Create, self.caller, None)?;
        let fields = validate(self.table.rules, None, payload).map_err(PolicyError::Invalid)?;
        let record = self
            .store
            .insert(self.table, self.owner_filter(), fields)
            .await
            .map_err(|e| PolicyError::store(self.table, Operation::Create, e))?;
        debug!(kind = self.table.label, id = %record.id, "created");
        Ok(record)
    }

    /// Merge `payload` over the stored fields. Full and partial updates share
    /// this path; omitted fields keep their values.
    pub async fn update(
        &self,
        id: Uuid,
        payload: &Map<String, Value>,
    ) -> Result<RawRecord, PolicyError> {
        let current = self.load(id, Operation::Update).await?;
        let fields = validate(self.table.rules, Some(&current.fields), payload)
            .map_err(PolicyError::Invalid)?;
        let record = self
            .store
            .update(self.table, id, fields)
            .await
            .map_err(|e| PolicyError::store(self.table, Operation::Update, e))?
            .ok_or(PolicyError::NotFound(self.table.label))?;
        debug!(kind = self.table.label, %id, "updated");
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PolicyError> {
        self.load(id, Operation::Delete).await?;
        let deleted = self
            .store
            .delete(self.table, id)
            .await
            .map_err(|e| PolicyError::store(self.table, Operation::Delete, e))?;
        if !deleted {
            return Err(PolicyError::NotFound(self.table.label));
        }
        debug!(kind = self.table.label, %id, "deleted");
        Ok(())
    }
}
