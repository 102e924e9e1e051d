use sea_orm::sea_query::Order;
use std::cmp::Ordering;

const DESCENDING: &str = "DESC";

/// Typed comparison of one sortable field between two rows.
pub type FieldComparator<M> = fn(&M, &M) -> Ordering;

#[derive(Clone, Debug, PartialEq)]
pub struct SortField {
    pub field: String,
    pub direction: Order,
}

/// Convert sort order string to Order enum; anything but `desc` is ascending
fn parse_order(sort_order: &str) -> Order {
    if sort_order.eq_ignore_ascii_case(DESCENDING) {
        Order::Desc
    } else {
        Order::Asc
    }
}

/// Parse `sort_by` entries of the form `field`, `field:asc` or `field:desc`.
///
/// Blank entries are dropped. A missing, empty or unrecognised direction
/// sorts ascending.
#[must_use]
pub fn parse_sort_by(sort_by: &[String]) -> Vec<SortField> {
    sort_by
        .iter()
        .filter_map(|entry| {
            let (field, direction) = match entry.split_once(':') {
                Some((field, direction)) => (field.trim(), parse_order(direction.trim())),
                None => (entry.trim(), Order::Asc),
            };
            (!field.is_empty()).then(|| SortField {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

/// Order `rows` in place by the requested fields, first field first.
///
/// Fields missing from `comparators` are ignored. The sort is stable, so an
/// unset or fully-ignored `sort_by` leaves the window in the order the store
/// returned it.
pub fn apply_order_by<M>(
    rows: &mut [M],
    sort_by: Option<&[String]>,
    comparators: &[(&'static str, FieldComparator<M>)],
) {
    let Some(sort_by) = sort_by else {
        return;
    };

    let keys: Vec<(FieldComparator<M>, Order)> = parse_sort_by(sort_by)
        .into_iter()
        .filter_map(|sort| {
            let comparator = comparators
                .iter()
                .find(|(name, _)| *name == sort.field)
                .map(|(_, comparator)| *comparator);
            if comparator.is_none() {
                tracing::warn!(field = %sort.field, "Ignoring unknown sort field");
            }
            comparator.map(|comparator| (comparator, sort.direction))
        })
        .collect();

    if keys.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        keys.iter().fold(Ordering::Equal, |ordering, (comparator, direction)| {
            ordering.then_with(|| match direction {
                Order::Desc => comparator(a, b).reverse(),
                _ => comparator(a, b),
            })
        })
    });
}
