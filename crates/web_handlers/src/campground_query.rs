//! Parsing of the campground listing query string: field filters with comparison
//! operators, projection, sorting and pagination.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use crate::campground_types::CampgroundError;

/// Page used when none is requested
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when none is requested
pub const DEFAULT_LIMIT: i64 = 25;
/// Largest accepted page size
pub const MAX_LIMIT: i64 = 100;

const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Campground field that can be filtered or sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampgroundField {
    /// `name`
    Name,
    /// `address`
    Address,
    /// `telephone`
    Telephone,
    /// `dailyCapacity`
    DailyCapacity,
    /// `createdAt`, sorting only
    CreatedAt,
}

impl CampgroundField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "telephone" => Some(Self::Telephone),
            "dailyCapacity" => Some(Self::DailyCapacity),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column backing the field
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Telephone => "telephone",
            Self::DailyCapacity => "daily_capacity",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `field=value`
    Eq,
    /// `field[gt]=value`
    Gt,
    /// `field[gte]=value`
    Gte,
    /// `field[lt]=value`
    Lt,
    /// `field[lte]=value`
    Lte,
    /// `field[in]=a,b,c`
    In,
}

impl FilterOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "= ANY",
        }
    }
}

/// Typed value of a filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A single text value
    Text(String),
    /// A single integer value
    Int(i32),
    /// Text values for `in`
    TextList(Vec<String>),
    /// Integer values for `in`
    IntList(Vec<i32>),
}

/// One `field[op]=value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Filtered field
    pub field: CampgroundField,
    /// Comparison
    pub op: FilterOp,
    /// Operand
    pub value: FilterValue,
}

/// One sort key, `-field` for descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Sorted field
    pub field: CampgroundField,
    /// Whether the order is descending
    pub descending: bool,
}

/// Fully parsed listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampgroundListQuery {
    /// Conditions joined with AND, in key order
    pub filters: Vec<Filter>,
    /// Fields to keep in each item, `None` for all
    pub select: Option<Vec<String>>,
    /// Sort keys, most significant first
    pub sort: Vec<SortKey>,
    /// 1-based page number
    pub page: i64,
    /// Page size
    pub limit: i64,
}

impl Default for CampgroundListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            select: None,
            sort: vec![SortKey {
                field: CampgroundField::CreatedAt,
                descending: true,
            }],
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl CampgroundListQuery {
    /// Parses raw query parameters
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, CampgroundError> {
        let mut query = Self::default();

        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| !RESERVED_PARAMS.contains(&k.as_str()))
            .collect();
        keys.sort();
        for key in keys {
            query.filters.push(parse_filter(key, &params[key])?);
        }

        if let Some(select) = params.get("select") {
            let fields: Vec<String> = split_list(select).map(str::to_string).collect();
            if !fields.is_empty() {
                query.select = Some(fields);
            }
        }

        if let Some(sort) = params.get("sort") {
            let keys = split_list(sort).map(parse_sort_key).collect::<Result<Vec<_>, _>>()?;
            if !keys.is_empty() {
                query.sort = keys;
            }
        }

        // Unparseable or non-positive values fall back to the defaults
        query.page = params
            .get("page")
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PAGE);
        query.limit = params
            .get("limit")
            .and_then(|l| l.parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);

        Ok(query)
    }

    /// Number of rows skipped before the page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Appends the `WHERE` clause for the filters
    pub fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for (i, filter) in self.filters.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(filter.field.column());
            builder.push(" ");
            builder.push(filter.op.sql());
            builder.push(if filter.op == FilterOp::In { "(" } else { " " });
            match &filter.value {
                FilterValue::Text(v) => builder.push_bind(v.clone()),
                FilterValue::Int(v) => builder.push_bind(*v),
                FilterValue::TextList(v) => builder.push_bind(v.clone()),
                FilterValue::IntList(v) => builder.push_bind(v.clone()),
            };
            if filter.op == FilterOp::In {
                builder.push(")");
            }
        }
    }

    /// Appends `ORDER BY`, `LIMIT` and `OFFSET`
    pub fn push_order_and_page(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" ORDER BY ");
        for key in &self.sort {
            builder.push(key.field.column());
            builder.push(if key.descending { " DESC, " } else { " ASC, " });
        }
        builder.push("id ASC");
        builder.push(" LIMIT ");
        builder.push_bind(self.limit);
        builder.push(" OFFSET ");
        builder.push_bind(self.offset());
    }

    /// Keeps only the selected fields of a serialized item; `id` is always kept
    pub fn project(&self, item: Value) -> Value {
        let Some(fields) = &self.select else {
            return item;
        };
        match item {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Links to the neighbouring pages given the total number of matches
    pub fn pagination(&self, total: i64) -> Pagination {
        let end = self.page.saturating_mul(self.limit);
        Pagination {
            next: self
                .page
                .checked_add(1)
                .filter(|_| end < total)
                .map(|page| PageLink {
                    page,
                    limit: self.limit,
                }),
            prev: (self.page > 1).then(|| PageLink {
                page: self.page - 1,
                limit: self.limit,
            }),
        }
    }
}

/// Pointer to another page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    /// Page number
    pub page: i64,
    /// Page size
    pub limit: i64,
}

/// Neighbouring pages of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Following page, when more rows exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    /// Preceding page, when this is not the first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_filter(key: &str, raw: &str) -> Result<Filter, CampgroundError> {
    let (name, op) = match key.split_once('[') {
        Some((name, rest)) => {
            let op = rest
                .strip_suffix(']')
                .and_then(FilterOp::parse)
                .ok_or_else(|| {
                    CampgroundError::InvalidQuery(format!("unsupported operator in '{}'", key))
                })?;
            (name, op)
        }
        None => (key, FilterOp::Eq),
    };

    let field = CampgroundField::parse(name)
        .filter(|f| *f != CampgroundField::CreatedAt)
        .ok_or_else(|| CampgroundError::InvalidQuery(format!("unknown filter field '{}'", name)))?;

    let value = match (field, op) {
        (CampgroundField::DailyCapacity, FilterOp::In) => FilterValue::IntList(
            split_list(raw)
                .map(|v| parse_int(name, v))
                .collect::<Result<_, _>>()?,
        ),
        (CampgroundField::DailyCapacity, _) => FilterValue::Int(parse_int(name, raw.trim())?),
        (_, FilterOp::In) => FilterValue::TextList(split_list(raw).map(str::to_string).collect()),
        _ => FilterValue::Text(raw.to_string()),
    };

    Ok(Filter { field, op, value })
}

fn parse_int(field: &str, raw: &str) -> Result<i32, CampgroundError> {
    raw.parse().map_err(|_| {
        CampgroundError::InvalidQuery(format!("'{}' is not a number for {}", raw, field))
    })
}

fn parse_sort_key(raw: &str) -> Result<SortKey, CampgroundError> {
    let (name, descending) = match raw.strip_prefix('-') {
        Some(name) => (name, true),
        None => (raw, false),
    };
    let field = CampgroundField::parse(name)
        .ok_or_else(|| CampgroundError::InvalidQuery(format!("unknown sort field '{}'", name)))?;
    Ok(SortKey { field, descending })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let query = CampgroundListQuery::parse(&HashMap::new()).unwrap();

        assert_eq!(query, CampgroundListQuery::default());
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 25);
        assert_eq!(query.offset(), 0);
        assert_eq!(
            query.sort,
            vec![SortKey {
                field: CampgroundField::CreatedAt,
                descending: true
            }]
        );
    }

    #[test]
    fn test_filters_with_operators() {
        let query = CampgroundListQuery::parse(&params(&[
            ("dailyCapacity[gte]", "2"),
            ("name[in]", "Pine Ridge, Lakeside"),
            ("address", "1 Ridge Road"),
        ]))
        .unwrap();

        assert_eq!(
            query.filters,
            vec![
                Filter {
                    field: CampgroundField::Address,
                    op: FilterOp::Eq,
                    value: FilterValue::Text("1 Ridge Road".to_string()),
                },
                Filter {
                    field: CampgroundField::DailyCapacity,
                    op: FilterOp::Gte,
                    value: FilterValue::Int(2),
                },
                Filter {
                    field: CampgroundField::Name,
                    op: FilterOp::In,
                    value: FilterValue::TextList(vec![
                        "Pine Ridge".to_string(),
                        "Lakeside".to_string()
                    ]),
                },
            ]
        );
    }

    #[test]
    fn test_filter_sql() {
        let query = CampgroundListQuery::parse(&params(&[
            ("dailyCapacity[in]", "1,2"),
            ("name[lt]", "M"),
        ]))
        .unwrap();

        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM campgrounds");
        query.push_filters(&mut builder);
        query.push_order_and_page(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT id FROM campgrounds WHERE daily_capacity = ANY($1) AND name < $2 \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_invalid_filters_are_rejected() {
        for (key, value) in [
            ("owner", "x"),
            ("dailyCapacity[gte]", "many"),
            ("name[regex]", "x"),
            ("createdAt[gt]", "2025-01-01"),
            ("dailyCapacity[in]", "1,x"),
        ] {
            let result = CampgroundListQuery::parse(&params(&[(key, value)]));
            assert!(
                matches!(result, Err(CampgroundError::InvalidQuery(_))),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_sort_keys() {
        let query =
            CampgroundListQuery::parse(&params(&[("sort", "-dailyCapacity,name")])).unwrap();

        assert_eq!(
            query.sort,
            vec![
                SortKey {
                    field: CampgroundField::DailyCapacity,
                    descending: true
                },
                SortKey {
                    field: CampgroundField::Name,
                    descending: false
                },
            ]
        );
        assert!(CampgroundListQuery::parse(&params(&[("sort", "password")])).is_err());
    }

    #[test]
    fn test_page_and_limit() {
        let query =
            CampgroundListQuery::parse(&params(&[("page", "3"), ("limit", "10")])).unwrap();
        assert_eq!(query.offset(), 20);

        let query =
            CampgroundListQuery::parse(&params(&[("page", "zero"), ("limit", "-4")])).unwrap();
        assert_eq!(query.page, DEFAULT_PAGE);
        assert_eq!(query.limit, DEFAULT_LIMIT);

        let query = CampgroundListQuery::parse(&params(&[("limit", "5000")])).unwrap();
        assert_eq!(query.limit, MAX_LIMIT);
    }

    #[test]
    fn test_pagination_links() {
        let first = CampgroundListQuery {
            page: 1,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(
            first.pagination(25),
            Pagination {
                next: Some(PageLink { page: 2, limit: 10 }),
                prev: None,
            }
        );

        let last = CampgroundListQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(
            last.pagination(25),
            Pagination {
                next: None,
                prev: Some(PageLink { page: 2, limit: 10 }),
            }
        );

        let exact = CampgroundListQuery {
            page: 1,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(exact.pagination(25), Pagination { next: None, prev: None });
        assert_eq!(
            serde_json::to_value(exact.pagination(25)).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let query =
            CampgroundListQuery::parse(&params(&[("page", &i64::MAX.to_string())])).unwrap();
        assert_eq!(query.page, i64::MAX);
        assert_eq!(query.offset(), i64::MAX);

        assert_eq!(
            query.pagination(10),
            Pagination {
                next: None,
                prev: Some(PageLink {
                    page: i64::MAX - 1,
                    limit: DEFAULT_LIMIT
                }),
            }
        );
        assert_eq!(query.pagination(i64::MAX).next, None);
    }

    #[test]
    fn test_projection_keeps_id() {
        let query = CampgroundListQuery::parse(&params(&[("select", "name,telephone")])).unwrap();
        let item = serde_json::json!({
            "id": "abc",
            "name": "Pine Ridge",
            "address": "1 Ridge Road",
            "telephone": "0123456789",
            "appointments": []
        });

        assert_eq!(
            query.project(item),
            serde_json::json!({
                "id": "abc",
                "name": "Pine Ridge",
                "telephone": "0123456789"
            })
        );
    }

    #[test]
    fn test_no_projection_without_select() {
        let item = serde_json::json!({"id": "abc", "name": "Pine Ridge"});
        assert_eq!(CampgroundListQuery::default().project(item.clone()), item);
    }
}
