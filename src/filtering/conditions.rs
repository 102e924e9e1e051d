use sea_orm::{
    ColumnTrait, Condition, EntityTrait,
    sea_query::{Expr, Query, SimpleExpr},
};

/// Sparse filter criteria for one entity.
///
/// Each set field contributes one predicate and the predicates are AND-ed. An
/// input with every field unset yields an empty `Condition::all()`, which matches
/// every row.
pub trait ApplyWhere {
    fn condition(&self) -> Condition;
}

/// Equality predicate on `column`, or nothing when the criterion is unset.
pub fn eq_opt<C, V>(column: C, value: Option<&V>) -> Option<SimpleExpr>
where
    C: ColumnTrait,
    V: Clone + Into<sea_orm::Value>,
{
    value.map(|v| column.eq(v.clone()))
}

/// Membership of `column` in `ids`, or nothing when the criterion is unset.
///
/// An empty id list is a set criterion that nothing belongs to, so it matches no
/// rows.
pub fn in_ids<C: ColumnTrait>(column: C, ids: Option<&Vec<String>>) -> Option<SimpleExpr> {
    ids.map(|ids| column.is_in(ids.iter().cloned()))
}

/// Parent rows owning at least one of the child rows `ids`.
///
/// Emits `parent_id IN (SELECT foreign_key FROM child WHERE child_id IN ids)`.
pub fn contains_child<P, E, C>(
    parent_id: P,
    child: E,
    child_id: C,
    foreign_key: C,
    ids: Option<&Vec<String>>,
) -> Option<SimpleExpr>
where
    P: ColumnTrait,
    E: EntityTrait,
    C: ColumnTrait,
{
    ids.map(|ids| {
        let owners = Query::select()
            .column(foreign_key)
            .from(child)
            .and_where(Expr::col(child_id).is_in(ids.iter().cloned()))
            .and_where(Expr::col(foreign_key).is_not_null())
            .to_owned();
        parent_id.in_subquery(owners)
    })
}
