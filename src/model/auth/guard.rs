//! Ownership is the only access-control relation: a record may be read or
//! mutated by the identity that created it, and by nobody else.

use std::fmt::Display;

use crate::error::{Error, Result};
use crate::model::{
    mongodb::Id,
    store::{DocumentStore, Filter, Record},
};

/// A record that carries the identity of its creator.
pub trait Owned {
    fn owner(&self) -> &str;
}

/// The outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Forbidden,
}

/// May `caller` access `record`?
pub fn check<T: Owned + ?Sized>(record: &T, caller: &str) -> Access {
    if record.owner() == caller {
        Access::Allowed
    } else {
        Access::Forbidden
    }
}

/// Turn the result of a lookup into the record itself, failing with
/// [`Error::NotFound`] if it is absent and [`Error::Forbidden`] if the caller
/// does not own it.
pub fn authorize<T: Owned>(record: Option<T>, caller: &str, what: impl Display) -> Result<T> {
    let record = record.ok_or_else(|| Error::NotFound(what.to_string()))?;
    match check(&record, caller) {
        Access::Allowed => Ok(record),
        Access::Forbidden => Err(Error::Forbidden(format!("{what} is owned by another user"))),
    }
}

/// Fetch a single record by ID on behalf of `caller`.
pub async fn fetch_owned<R: Record>(
    store: &dyn DocumentStore<R>,
    id: Id,
    caller: &str,
) -> Result<R> {
    let record = store.find_one(&Filter::by_id(id)).await?;
    authorize(record, caller, format!("{} {id}", R::KIND))
}

/// Reject an empty caller identity before any store access happens.
pub fn require_caller(caller: &str) -> Result<&str> {
    if caller.trim().is_empty() {
        Err(Error::InvalidInput("Caller identity is empty".to_string()))
    } else {
        Ok(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note(&'static str);

    impl Owned for Note {
        fn owner(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn owner_is_allowed_others_are_not() {
        assert_eq!(Access::Allowed, check(&Note("alice"), "alice"));
        assert_eq!(Access::Forbidden, check(&Note("alice"), "bob"));
        assert_eq!(Access::Forbidden, check(&Note("alice"), "Alice"));
    }

    #[test]
    fn authorize_distinguishes_missing_from_forbidden() {
        assert!(matches!(
            authorize(None::<Note>, "alice", "note"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            authorize(Some(Note("alice")), "bob", "note"),
            Err(Error::Forbidden(_))
        ));
        assert!(authorize(Some(Note("alice")), "alice", "note").is_ok());
    }

    #[test]
    fn blank_caller_is_invalid() {
        assert!(matches!(require_caller(""), Err(Error::InvalidInput(_))));
        assert!(matches!(require_caller("  "), Err(Error::InvalidInput(_))));
        assert_eq!("alice", require_caller("alice").unwrap());
    }
}
