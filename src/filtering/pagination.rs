use sea_orm::QuerySelect;

/// Largest offset or limit the backends accept; they bind both as signed 64-bit.
pub const MAX_WINDOW: u64 = i64::MAX.unsigned_abs();

/// Skip the first `skip` matching rows. Unset never skips.
///
/// Values past [`MAX_WINDOW`] are clamped to it, which skips every row.
pub fn apply_skip<Q: QuerySelect>(query: Q, skip: Option<u64>) -> Q {
    match skip {
        Some(skip) => query.offset(skip.min(MAX_WINDOW)),
        None => query,
    }
}

/// Cap the window at `take` rows. Unset is unbounded.
///
/// Values past [`MAX_WINDOW`] are clamped to it.
pub fn apply_take<Q: QuerySelect>(query: Q, take: Option<u64>) -> Q {
    match take {
        Some(take) => query.limit(take.min(MAX_WINDOW)),
        None => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderEntity;
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};

    fn sql(skip: Option<u64>, take: Option<u64>) -> String {
        apply_take(apply_skip(OrderEntity::find(), skip), take)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_unset_is_unbounded() {
        let sql = sql(None, None);
        assert!(!sql.contains("LIMIT"), "{sql}");
        assert!(!sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn test_skip_and_take() {
        let sql = sql(Some(5), Some(10));
        assert!(sql.contains("LIMIT 10"), "{sql}");
        assert!(sql.contains("OFFSET 5"), "{sql}");
    }

    #[test]
    fn test_take_without_skip() {
        let sql = sql(None, Some(3));
        assert!(sql.contains("LIMIT 3"), "{sql}");
        assert!(!sql.contains("OFFSET"), "{sql}");
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let sql = sql(Some(u64::MAX), Some(u64::MAX));
        assert!(sql.contains("LIMIT 9223372036854775807"), "{sql}");
        assert!(sql.contains("OFFSET 9223372036854775807"), "{sql}");
    }
}
