use mongodb::{bson::Document, Database};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::store::{DocumentStore, Filter, Patch, Record};

use super::{Coll, Id};

/// A [`DocumentStore`] backed by a MongoDB collection.
pub struct MongoStore<R: Record> {
    records: Coll<R>,
    new_records: Coll<R::New>,
}

impl<R: Record> MongoStore<R> {
    /// Get a handle on the record's collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self {
            records: Coll::from_db(db),
            new_records: Coll::from_db(db),
        }
    }
}

impl From<&Filter> for Document {
    fn from(filter: &Filter) -> Self {
        let mut doc = Document::new();
        if let Some(id) = filter.id {
            doc.insert("_id", id);
        }
        if let Some(owner) = &filter.created_by {
            doc.insert("created_by", owner.as_str());
        }
        if let Some(survey_id) = filter.survey_id {
            doc.insert("survey_id", survey_id);
        }
        doc
    }
}

#[rocket::async_trait]
impl<R: Record> DocumentStore<R> for MongoStore<R> {
    async fn insert_one(&self, record: R::New) -> Result<Id> {
        let result = self.new_records.insert_one(record, None).await?;
        result
            .inserted_id
            .as_object_id()
            .map(Id::from)
            .ok_or_else(|| {
                Error::Store(format!(
                    "Insert into {} returned a non-ObjectId key: {}",
                    R::NAME,
                    result.inserted_id
                ))
            })
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<R>> {
        Ok(self.records.find_one(Document::from(filter), None).await?)
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<R>> {
        let cursor = self.records.find(Document::from(filter), None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_one(&self, filter: &Filter, patch: &R::Patch) -> Result<bool> {
        let result = self
            .records
            .update_one(Document::from(filter), patch.to_update(), None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool> {
        let result = self
            .records
            .delete_one(Document::from(filter), None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
