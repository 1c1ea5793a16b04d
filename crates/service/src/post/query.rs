//! Listing query: raw query-string pairs to a typed SeaORM query.
//!
//! Filters go through the `FIELDS` allow-list; nothing from the request is
//! ever spliced into SQL.

use chrono::DateTime;
use configs::ListingConfig;
use models::post::{self, DisplayContact, JobType, PostType};
use sea_orm::{ColumnTrait, Condition, Order, Value};
use uuid::Uuid;

use crate::errors::{FieldErrors, ServiceError};
use crate::pagination::Pagination;

#[derive(Clone, Copy, Debug, PartialEq)]
enum FieldKind {
    Text,
    Float,
    Integer,
    Uuid,
    Timestamp,
    Choice(&'static [&'static str]),
}

impl FieldKind {
    fn supports(&self, op: FilterOp) -> bool {
        match self {
            FieldKind::Uuid | FieldKind::Choice(_) => matches!(op, FilterOp::Eq | FilterOp::In),
            _ => true,
        }
    }

    fn coerce(&self, field: &str, raw: &str) -> Result<Value, ServiceError> {
        let raw = raw.trim();
        let bad = |what: &str| ServiceError::invalid(field, format!("{field} must be {what}, got '{raw}'"));
        match self {
            FieldKind::Text => Ok(Value::from(raw.to_string())),
            FieldKind::Float => raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::from).ok_or_else(|| bad("a number")),
            FieldKind::Integer => raw.parse::<i32>().map(Value::from).map_err(|_| bad("an integer")),
            FieldKind::Uuid => Uuid::parse_str(raw).map(Value::from).map_err(|_| bad("a valid id")),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw).map(Value::from).map_err(|_| bad("an RFC 3339 timestamp")),
            FieldKind::Choice(allowed) => {
                if allowed.contains(&raw) {
                    Ok(Value::from(raw.to_string()))
                } else {
                    Err(bad(&format!("one of {}", allowed.join(", "))))
                }
            }
        }
    }
}

struct FieldRule {
    name: &'static str,
    column: post::Column,
    /// `None` for fields that can be selected and sorted but not filtered.
    filter: Option<FieldKind>,
}

const POST_TYPES: &[&str] = &["job", "service"];
const JOB_TYPES: &[&str] = &["Full-time", "Part-time", "Contract", "Internship", "Temporary"];
const DISPLAY_CONTACTS: &[&str] = &["email", "phone", "both"];

const FIELDS: &[FieldRule] = &[
    FieldRule { name: "id", column: post::Column::Id, filter: None },
    FieldRule { name: "title", column: post::Column::Title, filter: Some(FieldKind::Text) },
    FieldRule { name: "description", column: post::Column::Description, filter: None },
    FieldRule { name: "type", column: post::Column::PostType, filter: Some(FieldKind::Choice(POST_TYPES)) },
    FieldRule { name: "category", column: post::Column::Category, filter: Some(FieldKind::Text) },
    FieldRule { name: "location", column: post::Column::Location, filter: Some(FieldKind::Text) },
    FieldRule { name: "contactEmail", column: post::Column::ContactEmail, filter: None },
    FieldRule { name: "contactPhone", column: post::Column::ContactPhone, filter: None },
    FieldRule { name: "displayContact", column: post::Column::DisplayContact, filter: Some(FieldKind::Choice(DISPLAY_CONTACTS)) },
    FieldRule { name: "company", column: post::Column::Company, filter: Some(FieldKind::Text) },
    FieldRule { name: "jobType", column: post::Column::JobType, filter: Some(FieldKind::Choice(JOB_TYPES)) },
    FieldRule { name: "salary", column: post::Column::Salary, filter: Some(FieldKind::Text) },
    FieldRule { name: "requirements", column: post::Column::Requirements, filter: None },
    FieldRule { name: "provider", column: post::Column::Provider, filter: Some(FieldKind::Text) },
    FieldRule { name: "rating", column: post::Column::Rating, filter: Some(FieldKind::Float) },
    FieldRule { name: "ratingCount", column: post::Column::RatingCount, filter: Some(FieldKind::Integer) },
    FieldRule { name: "user", column: post::Column::UserId, filter: Some(FieldKind::Uuid) },
    FieldRule { name: "createdAt", column: post::Column::CreatedAt, filter: Some(FieldKind::Timestamp) },
];

fn field(name: &str) -> Option<&'static FieldRule> {
    FIELDS.iter().find(|f| f.name == name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            "in" => Some(FilterOp::In),
            _ => None,
        }
    }
}

/// Split `rating[gte]` into `("rating", "gte")`; plain keys have no operator.
fn split_key(key: &str) -> Result<(&str, Option<&str>), ServiceError> {
    match key.find('[') {
        None => Ok((key, None)),
        Some(open) => {
            let name = &key[..open];
            let op = key[open + 1..]
                .strip_suffix(']')
                .filter(|op| !op.contains(['[', ']']))
                .ok_or_else(|| ServiceError::invalid(name, format!("malformed filter key '{key}'")))?;
            Ok((name, Some(op)))
        }
    }
}

/// Query-string pairs with the control parameters pulled out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub select: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "select" => params.select = Some(value),
                "sort" => params.sort = Some(value),
                "page" => params.page = Some(value),
                "limit" => params.limit = Some(value),
                _ => params.filters.push((key, value)),
            }
        }
        params
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SortKey {
    pub field: &'static str,
    pub column: post::Column,
    pub descending: bool,
}

impl SortKey {
    pub fn order(&self) -> Order {
        if self.descending { Order::Desc } else { Order::Asc }
    }
}

/// Everything the repository needs to fetch one page of posts.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub condition: Condition,
    pub order: Vec<SortKey>,
    /// Response fields to keep; `None` keeps all of them.
    pub projection: Option<Vec<&'static str>>,
    pub pagination: Pagination,
}

impl PostQuery {
    pub fn build(params: &ListParams, listing: &ListingConfig) -> Result<Self, ServiceError> {
        let mut errors = FieldErrors::new();
        let condition = collect(&mut errors, build_condition(&params.filters));
        let order = collect(&mut errors, build_order(params.sort.as_deref()));
        let projection = collect(&mut errors, build_projection(params.select.as_deref()));
        let page = collect(&mut errors, parse_count("page", params.page.as_deref(), 1));
        let limit = collect(&mut errors, parse_count("limit", params.limit.as_deref(), listing.default_page_size));
        errors.into_result()?;

        match (condition, order, projection, page, limit) {
            (Some(condition), Some(order), Some(projection), Some(page), Some(limit)) => {
                let pagination = Pagination { page, limit }.normalize(listing.max_page_size);
                if pagination.checked_skip().is_none() {
                    return Err(ServiceError::invalid("page", "page is out of range"));
                }
                Ok(Self { condition, order, projection, pagination })
            }
            _ => Err(ServiceError::invalid("query", "invalid listing query")),
        }
    }
}

fn collect<T>(errors: &mut FieldErrors, result: Result<T, ServiceError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(ServiceError::Validation(fields)) => {
            for f in fields {
                errors.push(&f.field, f.message);
            }
            None
        }
        Err(other) => {
            errors.push("query", other.to_string());
            None
        }
    }
}

fn parse_count(name: &str, raw: Option<&str>, default: u64) -> Result<u64, ServiceError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ServiceError::invalid(name, format!("{name} must be a non-negative integer"))),
    }
}

fn build_condition(filters: &[(String, String)]) -> Result<Condition, ServiceError> {
    let mut errors = FieldErrors::new();
    let mut condition = Condition::all();
    // Plain keys are gathered first: one value is equality, repeats mean `in`.
    let mut plain: Vec<(&'static FieldRule, Vec<Value>)> = Vec::new();

    for (key, raw) in filters {
        let (name, op) = match split_key(key) {
            Ok(parts) => parts,
            Err(e) => {
                collect(&mut errors, Err::<(), _>(e));
                continue;
            }
        };
        let Some(rule) = field(name) else {
            errors.push(name, format!("unknown filter field '{name}'"));
            continue;
        };
        let Some(kind) = rule.filter else {
            errors.push(name, format!("{name} cannot be filtered"));
            continue;
        };
        let op = match op {
            None => FilterOp::Eq,
            Some(op) => match FilterOp::parse(op) {
                Some(op) => op,
                None => {
                    errors.push(name, format!("unsupported operator '{op}'"));
                    continue;
                }
            },
        };
        if !kind.supports(op) {
            errors.push(name, format!("operator '{}' is not supported for {name}", op.as_str()));
            continue;
        }

        match op {
            FilterOp::In => {
                let values: Vec<Value> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .filter_map(|v| collect(&mut errors, kind.coerce(name, v)))
                    .collect();
                if raw.split(',').all(|v| v.trim().is_empty()) {
                    errors.push(name, format!("{name}[in] needs at least one value"));
                    continue;
                }
                condition = condition.add(rule.column.is_in(values));
            }
            FilterOp::Eq => {
                let Some(value) = collect(&mut errors, kind.coerce(name, raw)) else { continue };
                match plain.iter_mut().find(|(s, _)| s.name == rule.name) {
                    Some((_, values)) => values.push(value),
                    None => plain.push((rule, vec![value])),
                }
            }
            range => {
                let Some(value) = collect(&mut errors, kind.coerce(name, raw)) else { continue };
                let expr = match range {
                    FilterOp::Gt => rule.column.gt(value),
                    FilterOp::Gte => rule.column.gte(value),
                    FilterOp::Lt => rule.column.lt(value),
                    _ => rule.column.lte(value),
                };
                condition = condition.add(expr);
            }
        }
    }

    for (rule, mut values) in plain {
        condition = if values.len() == 1 {
            condition.add(rule.column.eq(values.remove(0)))
        } else {
            condition.add(rule.column.is_in(values))
        };
    }

    errors.into_result()?;
    Ok(condition)
}

fn build_order(sort: Option<&str>) -> Result<Vec<SortKey>, ServiceError> {
    let sort = sort.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("-createdAt");
    let mut order: Vec<SortKey> = Vec::new();
    for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        let (name, descending) = match key.strip_prefix('-') {
            Some(name) => (name, true),
            None => (key.strip_prefix('+').unwrap_or(key), false),
        };
        let rule = field(name).ok_or_else(|| ServiceError::invalid("sort", format!("cannot sort by '{name}'")))?;
        if !order.iter().any(|k| k.field == rule.name) {
            order.push(SortKey { field: rule.name, column: rule.column, descending });
        }
    }
    if !order.iter().any(|k| k.field == "id") {
        order.push(SortKey { field: "id", column: post::Column::Id, descending: false });
    }
    Ok(order)
}

fn build_projection(select: Option<&str>) -> Result<Option<Vec<&'static str>>, ServiceError> {
    let Some(select) = select.map(str::trim).filter(|s| !s.is_empty()) else { return Ok(None) };
    let mut keep = vec!["id"];
    for name in select.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let rule = field(name).ok_or_else(|| ServiceError::invalid("select", format!("unknown field '{name}'")))?;
        if !keep.contains(&rule.name) {
            keep.push(rule.name);
        }
    }
    Ok(Some(keep))
}

/// Keep only `fields` of a serialized post.
pub fn project(value: serde_json::Value, fields: &[&str]) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            serde_json::Value::Object(map.into_iter().filter(|(k, _)| fields.contains(&k.as_str())).collect())
        }
        other => other,
    }
}

// The wire spellings above must stay in step with the model enums.
#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{EntityTrait, QueryFilter, QueryTrait, DbBackend};

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    fn sql(q: &PostQuery) -> String {
        post::Entity::find().filter(q.condition.clone()).build(DbBackend::Postgres).to_string()
    }

    fn error_fields(err: ServiceError) -> Vec<String> {
        match err {
            ServiceError::Validation(f) => f.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn choice_lists_match_model_enums() {
        assert_eq!(POST_TYPES, PostType::ALL.map(|t| t.as_str()).as_slice());
        assert_eq!(JOB_TYPES, JobType::ALL.map(|t| t.as_str()).as_slice());
        assert_eq!(DISPLAY_CONTACTS, DisplayContact::ALL.map(|d| d.as_str()).as_slice());
    }

    #[test]
    fn control_params_are_not_filters() {
        let p = params(&[("type", "job"), ("select", "title"), ("sort", "-rating"), ("page", "2"), ("limit", "5")]);
        assert_eq!(p.filters, vec![("type".to_string(), "job".to_string())]);
        assert_eq!(p.select.as_deref(), Some("title"));
        assert_eq!(p.page.as_deref(), Some("2"));
    }

    #[test]
    fn equality_filters_are_anded() {
        let q = PostQuery::build(&params(&[("type", "job"), ("category", "IT")]), &ListingConfig::default()).unwrap();
        let s = sql(&q);
        assert!(s.contains(r#""post"."post_type" = 'job'"#), "{s}");
        assert!(s.contains(r#""post"."category" = 'IT'"#), "{s}");
        assert!(s.contains(" AND "), "{s}");
    }

    #[test]
    fn range_and_in_operators() {
        let q = PostQuery::build(
            &params(&[("rating[gte]", "4"), ("rating[lt]", "5"), ("location[in]", "Shimla, Kullu")]),
            &ListingConfig::default(),
        )
        .unwrap();
        let s = sql(&q);
        assert!(s.contains(r#""post"."rating" >= 4"#), "{s}");
        assert!(s.contains(r#""post"."rating" < 5"#), "{s}");
        assert!(s.contains(r#""post"."location" IN ('Shimla', 'Kullu')"#), "{s}");
    }

    #[test]
    fn repeated_plain_key_becomes_in() {
        let q = PostQuery::build(&params(&[("category", "IT"), ("category", "Home")]), &ListingConfig::default()).unwrap();
        assert!(sql(&q).contains(r#""post"."category" IN ('IT', 'Home')"#));
    }

    #[test]
    fn bad_filters_are_reported_per_field() {
        let err = PostQuery::build(
            &params(&[
                ("salaryRange", "1"),
                ("rating[gte]", "high"),
                ("type[gt]", "job"),
                ("jobType", "Gig"),
                ("title[regex]", "x"),
                ("user", "not-a-uuid"),
            ]),
            &ListingConfig::default(),
        )
        .unwrap_err();
        assert_eq!(error_fields(err), vec!["salaryRange", "rating", "type", "jobType", "title", "user"]);
    }

    #[test]
    fn injection_shaped_keys_are_rejected() {
        let err = PostQuery::build(&params(&[("title[$where]", "1")]), &ListingConfig::default()).unwrap_err();
        assert_eq!(error_fields(err), vec!["title"]);
        let err = PostQuery::build(&params(&[("title[gt", "a")]), &ListingConfig::default()).unwrap_err();
        assert_eq!(error_fields(err), vec!["title"]);
    }

    fn sort_keys(q: &PostQuery) -> Vec<(&'static str, bool)> {
        q.order.iter().map(|k| (k.field, k.descending)).collect()
    }

    #[test]
    fn default_sort_is_newest_first_with_id_tiebreak() {
        let q = PostQuery::build(&ListParams::default(), &ListingConfig::default()).unwrap();
        assert_eq!(sort_keys(&q), vec![("createdAt", true), ("id", false)]);
    }

    #[test]
    fn multi_key_sort() {
        let q = PostQuery::build(&params(&[("sort", "-rating,title")]), &ListingConfig::default()).unwrap();
        assert_eq!(sort_keys(&q), vec![("rating", true), ("title", false), ("id", false)]);
        let err = PostQuery::build(&params(&[("sort", "password")]), &ListingConfig::default()).unwrap_err();
        assert_eq!(error_fields(err), vec!["sort"]);
    }

    #[test]
    fn select_always_keeps_id() {
        let q = PostQuery::build(&params(&[("select", "title,rating")]), &ListingConfig::default()).unwrap();
        assert_eq!(q.projection, Some(vec!["id", "title", "rating"]));
        let projected = project(serde_json::json!({"id": "1", "title": "t", "rating": 4.5, "company": "c"}), &["id", "title", "rating"]);
        assert_eq!(projected, serde_json::json!({"id": "1", "title": "t", "rating": 4.5}));
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let listing = ListingConfig { default_page_size: 10, max_page_size: 100 };
        let q = PostQuery::build(&ListParams::default(), &listing).unwrap();
        assert_eq!(q.pagination, Pagination { page: 1, limit: 10 });
        let q = PostQuery::build(&params(&[("page", "0"), ("limit", "500")]), &listing).unwrap();
        assert_eq!(q.pagination, Pagination { page: 1, limit: 100 });
        let err = PostQuery::build(&params(&[("page", "two"), ("limit", "-1")]), &listing).unwrap_err();
        assert_eq!(error_fields(err), vec!["page", "limit"]);
    }

    #[test]
    fn page_past_the_offset_range_is_rejected() {
        let listing = ListingConfig::default();
        let err = PostQuery::build(&params(&[("page", "9223372036854775808")]), &listing).unwrap_err();
        assert_eq!(error_fields(err), vec!["page"]);
        let err = PostQuery::build(&params(&[("page", "18446744073709551615"), ("limit", "2")]), &listing).unwrap_err();
        assert_eq!(error_fields(err), vec!["page"]);
        let q = PostQuery::build(&params(&[("page", "1000"), ("limit", "100")]), &listing).unwrap();
        assert_eq!(q.pagination.checked_skip(), Some(99_900));
    }

    #[test]
    fn timestamp_filter_accepts_rfc3339_only() {
        assert!(PostQuery::build(&params(&[("createdAt[gte]", "2025-01-01T00:00:00Z")]), &ListingConfig::default()).is_ok());
        let err = PostQuery::build(&params(&[("createdAt[gte]", "yesterday")]), &ListingConfig::default()).unwrap_err();
        assert_eq!(error_fields(err), vec!["createdAt"]);
    }
}
