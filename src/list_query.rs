//! Query-string driven filtering, sorting, field selection and pagination for
//! list endpoints.
//!
//! Supported parameters:
//! - `select=a,b`: only return these fields (the `id` is always returned),
//! - `sort=-created_at,name`: sort keys, a leading `-` sorts in descending order,
//! - `page` and `limit`: which page of results to return and its size,
//! - `field=value` or `field[op]=value`: filters, where `op` is one of
//!   `gt`, `gte`, `lt`, `lte` or `in` (`in` takes a comma-separated list).

use serde::Serialize;
use serde_json::Value;

use crate::{
    Error,
    pagination::{Pagination, PaginationConfig, create_pagination},
};

/// A field that clients may filter, sort and select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// The name of the field in query strings and JSON responses.
    pub name: &'static str,
    /// The SQL expression for the field, qualified with its table.
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Operator {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    column: &'static str,
    operator: Operator,
    values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SortKey {
    column: &'static str,
    descending: bool,
}

const SELECT: &str = "select";
const SORT: &str = "sort";
const PAGE: &str = "page";
const LIMIT: &str = "limit";

/// A parsed list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    filters: Vec<Filter>,
    sort: Vec<SortKey>,
    select: Option<Vec<&'static str>>,
    tie_breaker: Option<&'static str>,
    /// The requested page, starting at one.
    pub page: u64,
    /// The number of items per page.
    pub limit: u64,
    offset: u64,
}

impl ListQuery {
    /// Parse the query string pairs of a list request against the fields of a collection.
    ///
    /// Results are sorted by `created_at` in descending order unless `sort` is given,
    /// and ties are always broken by `id`.
    ///
    /// # Errors
    /// Returns [Error::InvalidQuery] if a parameter names an unknown field or
    /// operator, if `page` or `limit` are not positive integers, or if the
    /// page starts past the largest row offset SQLite accepts.
    pub fn parse(
        params: &[(String, String)],
        fields: &'static [Field],
        config: &PaginationConfig,
    ) -> Result<Self, Error> {
        let mut filters = Vec::new();
        let mut sort = None;
        let mut select = None;
        let mut page = config.default_page;
        let mut limit = config.default_page_size;

        for (key, value) in params {
            match key.as_str() {
                SELECT => {
                    let names = split_list(value)
                        .map(|name| find_field(fields, name).map(|field| field.name))
                        .collect::<Result<Vec<_>, _>>()?;
                    select = Some(names);
                }
                SORT => {
                    let keys = split_list(value)
                        .map(|name| {
                            let (name, descending) = match name.strip_prefix('-') {
                                Some(name) => (name, true),
                                None => (name, false),
                            };

                            find_field(fields, name).map(|field| SortKey {
                                column: field.column,
                                descending,
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    sort = Some(keys);
                }
                PAGE => page = parse_positive(PAGE, value)?,
                LIMIT => {
                    limit = parse_positive(LIMIT, value)?;

                    if limit > config.max_page_size {
                        return Err(Error::InvalidQuery(format!(
                            "limit must be at most {}",
                            config.max_page_size
                        )));
                    }
                }
                _ => filters.push(parse_filter(key, value, fields)?),
            }
        }

        let offset = page
            .saturating_sub(1)
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| Error::InvalidQuery(format!("page {page} is out of range")))?;

        let sort = match sort {
            Some(keys) if !keys.is_empty() => keys,
            _ => find_field(fields, "created_at")
                .map(|field| {
                    vec![SortKey {
                        column: field.column,
                        descending: true,
                    }]
                })
                .unwrap_or_default(),
        };

        Ok(Self {
            filters,
            sort,
            select,
            tie_breaker: find_field(fields, "id").ok().map(|field| field.column),
            page,
            limit,
            offset,
        })
    }

    /// The SQL `WHERE` clause (empty if there are no filters) and the values
    /// to bind to its positional parameters, in order.
    pub fn where_clause(&self) -> (String, Vec<String>) {
        if self.filters.is_empty() {
            return (String::new(), Vec::new());
        }

        let mut conditions = Vec::with_capacity(self.filters.len());
        let mut values = Vec::new();

        for filter in &self.filters {
            let condition = match filter.operator {
                Operator::In => {
                    let placeholders = vec!["?"; filter.values.len()].join(", ");
                    format!("{} IN ({placeholders})", filter.column)
                }
                operator => format!("{} {} ?", filter.column, operator.as_sql()),
            };

            conditions.push(condition);
            values.extend(filter.values.iter().cloned());
        }

        (format!("WHERE {}", conditions.join(" AND ")), values)
    }

    /// The SQL `ORDER BY` clause.
    pub fn order_by_clause(&self) -> String {
        let mut keys: Vec<String> = self
            .sort
            .iter()
            .map(|key| {
                let direction = if key.descending { "DESC" } else { "ASC" };
                format!("{} {direction}", key.column)
            })
            .collect();

        if let Some(id_column) = self.tie_breaker {
            keys.push(format!("{id_column} ASC"));
        }

        if keys.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", keys.join(", "))
        }
    }

    /// The SQL `LIMIT ... OFFSET ...` clause for the requested page.
    pub fn limit_clause(&self) -> String {
        format!("LIMIT {} OFFSET {}", self.limit, self.offset)
    }

    /// The links to the neighbouring pages given the `total` number of matching items.
    pub fn pagination(&self, total: u64) -> Pagination {
        create_pagination(self.page, self.limit, total)
    }

    /// Serialize `items`, keeping only the selected fields (and `id`) if the
    /// request had a `select` parameter.
    ///
    /// # Errors
    /// Returns [Error::JSONSerializationError] if an item cannot be serialized.
    pub fn project<T: Serialize>(&self, items: Vec<T>) -> Result<Vec<Value>, Error> {
        items
            .into_iter()
            .map(|item| {
                let mut value = serde_json::to_value(item)
                    .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

                if let (Some(select), Value::Object(map)) = (&self.select, &mut value) {
                    map.retain(|key, _| key == "id" || select.contains(&key.as_str()));
                }

                Ok(value)
            })
            .collect()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn find_field(fields: &'static [Field], name: &str) -> Result<&'static Field, Error> {
    fields
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| Error::InvalidQuery(format!("unknown field \"{name}\"")))
}

fn parse_positive(name: &str, raw: &str) -> Result<u64, Error> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::InvalidQuery(format!(
            "{name} must be a positive integer, got \"{raw}\""
        ))),
    }
}

fn parse_filter(key: &str, value: &str, fields: &'static [Field]) -> Result<Filter, Error> {
    let (name, operator) = match key.split_once('[') {
        Some((name, rest)) => {
            let operator = rest
                .strip_suffix(']')
                .and_then(Operator::parse)
                .ok_or_else(|| Error::InvalidQuery(format!("unknown operator in \"{key}\"")))?;

            (name, operator)
        }
        None => (key, Operator::Eq),
    };

    let field = find_field(fields, name)?;

    let values = match operator {
        Operator::In => {
            let values: Vec<String> = split_list(value).map(str::to_owned).collect();

            if values.is_empty() {
                return Err(Error::InvalidQuery(format!(
                    "\"{key}\" needs at least one value"
                )));
            }

            values
        }
        _ => vec![value.to_owned()],
    };

    Ok(Filter {
        column: field.column,
        operator,
        values,
    })
}
