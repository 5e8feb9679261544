//! The document store seam.
//!
//! Services only ever talk to a collection through [`DocumentStore`], which
//! offers the five primitives the survey core needs. Filters are equality
//! predicates on a record's ID, owner, or owning survey; updates are typed
//! per collection. Two adapters implement it: MongoDB for production, and an
//! in-memory store for tests and database-less local runs.

use std::sync::Arc;

use mongodb::{bson::Document, Database};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::model::{
    auth::Owned,
    db::{question::Question, survey::Survey},
    mongodb::{Id, MongoCollection, MongoStore},
};

pub mod memory;

pub use memory::MemoryStore;

/// A record type that lives in its own collection.
pub trait Record:
    Owned + MongoCollection + DeserializeOwned + Clone + Unpin + Send + Sync + 'static
{
    /// Human-readable name of the record kind, used in error messages.
    const KIND: &'static str;
    /// The same record before the store has assigned it an ID.
    type New: MongoCollection + Serialize + Send + Sync + 'static;
    /// Partial in-place modifications supported on this collection.
    type Patch: Patch<Self>;

    /// Unique ID.
    fn id(&self) -> Id;

    /// The survey this record belongs to, if the collection has such a reference.
    fn survey_id(&self) -> Option<Id> {
        None
    }

    /// Combine a new record with its freshly-assigned ID.
    fn with_id(id: Id, new: Self::New) -> Self;
}

/// A partial modification of a stored record.
pub trait Patch<R>: Send + Sync {
    /// Apply the modification to an in-memory record.
    fn apply(&self, record: &mut R);

    /// Render the modification as a MongoDB update document.
    fn to_update(&self) -> Document;
}

/// An equality filter over the fields every collection can be keyed by.
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub id: Option<Id>,
    pub created_by: Option<String>,
    pub survey_id: Option<Id>,
}

impl Filter {
    /// Select the record with the given ID.
    pub fn by_id(id: Id) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Select every record created by the given user.
    pub fn by_owner(owner: &str) -> Self {
        Self {
            created_by: Some(owner.to_string()),
            ..Default::default()
        }
    }

    /// Further restrict to records attached to the given survey.
    pub fn in_survey(mut self, survey_id: Id) -> Self {
        self.survey_id = Some(survey_id);
        self
    }

    /// Does the given record satisfy every set predicate?
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.id.map_or(true, |id| record.id() == id)
            && self
                .created_by
                .as_deref()
                .map_or(true, |owner| record.owner() == owner)
            && self
                .survey_id
                .map_or(true, |survey| record.survey_id() == Some(survey))
    }
}

/// CRUD primitives over a single collection.
#[rocket::async_trait]
pub trait DocumentStore<R: Record>: Send + Sync {
    /// Insert a new record, returning its assigned ID.
    async fn insert_one(&self, record: R::New) -> Result<Id>;

    /// Find the first record matching the filter.
    async fn find_one(&self, filter: &Filter) -> Result<Option<R>>;

    /// Find every record matching the filter, in store order.
    async fn find_many(&self, filter: &Filter) -> Result<Vec<R>>;

    /// Apply a patch to the first record matching the filter.
    /// Returns whether any record matched.
    async fn update_one(&self, filter: &Filter, patch: &R::Patch) -> Result<bool>;

    /// Delete the first record matching the filter.
    /// Returns whether any record was deleted.
    async fn delete_one(&self, filter: &Filter) -> Result<bool>;
}

/// The process-wide handle on both collections.
///
/// Constructed once at ignite and shared through managed state; cloning only
/// clones the reference.
#[derive(Clone)]
pub struct Store {
    pub surveys: Arc<dyn DocumentStore<Survey>>,
    pub questions: Arc<dyn DocumentStore<Question>>,
}

impl Store {
    /// A store backed by the given MongoDB database.
    pub fn mongo(db: &Database) -> Self {
        Self {
            surveys: Arc::new(MongoStore::<Survey>::from_db(db)),
            questions: Arc::new(MongoStore::<Question>::from_db(db)),
        }
    }

    /// A store that lives entirely in process memory.
    pub fn memory() -> Self {
        Self {
            surveys: Arc::new(MemoryStore::<Survey>::default()),
            questions: Arc::new(MemoryStore::<Question>::default()),
        }
    }
}
