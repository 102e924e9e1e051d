use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Filter, pagination and sorting for a list query.
///
/// # Filtering
/// `where` is the entity's sparse where-input: every field that is set adds an
/// equality (or id-membership) predicate, and all predicates must hold.
///
/// # Pagination
/// `skip` drops that many matching rows and `take` caps the window size. Leaving
/// either unset means "no skip" and "no limit".
///
/// # Sorting
/// `sort_by` entries are `"field"`, `"field:asc"` or `"field:desc"`. Sorting is
/// applied to the already-paginated window, so "top N by X" needs the full set
/// sorted by the caller.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FindManyArgs<W> {
    #[serde(rename = "where", default)]
    pub filter: W,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub sort_by: Option<Vec<String>>,
}

impl<W: Default> FindManyArgs<W> {
    /// Arguments matching every row under `filter`, unpaginated and unsorted.
    #[must_use]
    pub fn filtered(filter: W) -> Self {
        Self {
            filter,
            skip: None,
            take: None,
            sort_by: None,
        }
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    #[must_use]
    pub fn sort_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Number of rows matching a filter, ignoring pagination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MetadataDto {
    pub count: u64,
}
