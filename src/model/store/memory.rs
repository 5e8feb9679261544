use rocket::tokio::sync::RwLock;

use crate::error::Result;
use crate::model::mongodb::Id;

use super::{DocumentStore, Filter, Patch, Record};

/// An in-process collection. Records are kept in insertion order, which
/// mirrors MongoDB's natural order for an append-only workload.
pub struct MemoryStore<R> {
    records: RwLock<Vec<R>>,
}

// `Derive(Default)` would only derive if `R: Default`, but we don't need that bound.
impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

#[rocket::async_trait]
impl<R: Record> DocumentStore<R> for MemoryStore<R> {
    async fn insert_one(&self, record: R::New) -> Result<Id> {
        let id = Id::new();
        self.records.write().await.push(R::with_id(id, record));
        Ok(id)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<R>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| filter.matches(*r)).cloned())
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<R>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filter.matches(*r))
            .cloned()
            .collect())
    }

    async fn update_one(&self, filter: &Filter, patch: &R::Patch) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| filter.matches(&**r)) {
            Some(record) => {
                patch.apply(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter().position(|r| filter.matches(r)) {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::db::question::{NewQuestion, Question, QuestionPatch};

    #[rocket::async_test]
    async fn crud_cycle() {
        let store = MemoryStore::<Question>::default();
        let first = store
            .insert_one(NewQuestion::example("alice", None))
            .await
            .unwrap();
        let second = store
            .insert_one(NewQuestion::example("alice", None))
            .await
            .unwrap();
        assert_ne!(first, second);

        let all = store.find_many(&Filter::by_owner("alice")).await.unwrap();
        assert_eq!(
            vec![first, second],
            all.iter().map(|q| q.id).collect::<Vec<_>>()
        );

        let patch = QuestionPatch::retitle("Renamed");
        assert!(store.update_one(&Filter::by_id(first), &patch).await.unwrap());
        let renamed = store.find_one(&Filter::by_id(first)).await.unwrap().unwrap();
        assert_eq!("Renamed", renamed.title);

        assert!(store.delete_one(&Filter::by_id(first)).await.unwrap());
        assert!(!store.delete_one(&Filter::by_id(first)).await.unwrap());
        assert!(store.find_one(&Filter::by_id(first)).await.unwrap().is_none());
    }

    #[rocket::async_test]
    async fn unmatched_update_reports_no_match() {
        let store = MemoryStore::<Question>::default();
        let patch = QuestionPatch::retitle("Nothing");
        assert!(!store.update_one(&Filter::by_id(Id::new()), &patch).await.unwrap());
    }
}
