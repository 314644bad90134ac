//! Defines the transaction model, its table and the queries on it.

use rusqlite::{Connection, Row, params_from_iter};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    database_id::{DepartmentId, TransactionId},
    department::DepartmentSummary,
    list_query::{Field, ListQuery},
};

/// The smallest amount a transaction may have.
pub const MIN_AMOUNT: f64 = 1.0;
/// The largest amount a transaction may have.
pub const MAX_AMOUNT: f64 = 10.0;

/// The fields of a transaction that list requests may filter, sort and select on.
pub const TRANSACTION_FIELDS: &[Field] = &[
    Field {
        name: "id",
        column: "tx.id",
    },
    Field {
        name: "title",
        column: "tx.title",
    },
    Field {
        name: "description",
        column: "tx.description",
    },
    Field {
        name: "author",
        column: "tx.author",
    },
    Field {
        name: "amount",
        column: "tx.amount",
    },
    Field {
        name: "created_at",
        column: "tx.created_at",
    },
    Field {
        name: "updated_at",
        column: "tx.updated_at",
    },
    Field {
        name: "department",
        column: "tx.department_id",
    },
    Field {
        name: "user",
        column: "tx.user_id",
    },
];

/// An amount of something recorded against a department.
///
/// `D` is how the department is shown: its id, or a [DepartmentSummary]
/// when the transaction is fetched on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction<D = DepartmentId> {
    /// The id for the transaction.
    pub id: TransactionId,
    /// A short name for the transaction, trimmed.
    pub title: String,
    /// What the transaction was for.
    pub description: String,
    /// Who recorded the transaction.
    pub author: String,
    /// Between [MIN_AMOUNT] and [MAX_AMOUNT], inclusive.
    pub amount: f64,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// The department the transaction belongs to.
    pub department: D,
    /// The user that created the transaction.
    pub user: UserID,
}

/// The fields a client sends to create or update a transaction.
///
/// `department` is only read when creating a transaction through the
/// top-level route. On update, only the other fields that are set are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    /// The title of the transaction.
    pub title: Option<String>,
    /// What the transaction was for.
    pub description: Option<String>,
    /// Who recorded the transaction.
    pub author: Option<String>,
    /// The amount, between [MIN_AMOUNT] and [MAX_AMOUNT].
    pub amount: Option<f64>,
    /// The department to create the transaction in.
    pub department: Option<DepartmentId>,
}

/// A validated transaction that is ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    title: String,
    description: String,
    author: String,
    amount: f64,
    department: DepartmentId,
    user: UserID,
}

impl NewTransaction {
    /// Check the transaction fields, trimming the title.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every field that is invalid.
    pub fn new(form: TransactionForm, department: DepartmentId, user: UserID) -> Result<Self, Error> {
        let title = form.title.unwrap_or_default().trim().to_owned();
        let description = form.description.unwrap_or_default();
        let author = form.author.unwrap_or_default();

        let amount = validate_fields(&title, &description, &author, form.amount)?;

        Ok(Self {
            title,
            description,
            author,
            amount,
            department,
            user,
        })
    }
}

fn validate_fields(
    title: &str,
    description: &str,
    author: &str,
    amount: Option<f64>,
) -> Result<f64, Error> {
    let mut messages = Vec::new();

    if title.is_empty() {
        messages.push("Please add a transaction title".to_owned());
    }

    if description.is_empty() {
        messages.push("Please add a description".to_owned());
    }

    if author.is_empty() {
        messages.push("Please add an author".to_owned());
    }

    let amount = amount.filter(|amount| (MIN_AMOUNT..=MAX_AMOUNT).contains(amount));

    if amount.is_none() {
        messages.push(format!(
            "Please add an amount between {MIN_AMOUNT} and {MAX_AMOUNT}"
        ));
    }

    match amount {
        Some(amount) if messages.is_empty() => Ok(amount),
        _ => Err(Error::Validation(messages)),
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            author TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 1 AND amount <= 10),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            department_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            FOREIGN KEY(department_id) REFERENCES department(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_department_id ON \"transaction\"(department_id)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "tx.id, tx.title, tx.description, tx.author, tx.amount, tx.created_at, tx.updated_at, tx.department_id, tx.user_id";

const RETURNING_TRANSACTION: &str = "RETURNING id, title, description, author, amount, created_at, updated_at, department_id, user_id";

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author: row.get(3)?,
        amount: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        department: row.get(7)?,
        user: UserID::new(row.get(8)?),
    })
}

/// Map a row of [TRANSACTION_COLUMNS] followed by the department's name and description.
fn map_transaction_with_department_row(
    row: &Row,
) -> Result<Transaction<DepartmentSummary>, rusqlite::Error> {
    let transaction = map_transaction_row(row)?;

    Ok(Transaction {
        id: transaction.id,
        title: transaction.title,
        description: transaction.description,
        author: transaction.author,
        amount: transaction.amount,
        created_at: transaction.created_at,
        updated_at: transaction.updated_at,
        department: DepartmentSummary {
            id: transaction.department,
            name: row.get(9)?,
            description: row.get(10)?,
        },
        user: transaction.user,
    })
}

fn select_with_department() -> String {
    format!(
        "SELECT {TRANSACTION_COLUMNS}, dept.name, dept.description
         FROM \"transaction\" AS tx
         INNER JOIN department AS dept ON dept.id = tx.department_id"
    )
}

/// Insert a transaction.
///
/// # Errors
/// Returns [Error::InvalidReference] if the department or user does not exist,
/// or [Error::SqlError] if some other SQL error occurred.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (title, description, author, amount, created_at, updated_at, department_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             {RETURNING_TRANSACTION}"
        ))?
        .query_row(
            (
                &transaction.title,
                &transaction.description,
                &transaction.author,
                transaction.amount,
                now,
                now,
                transaction.department,
                transaction.user.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Get a transaction by its id.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the id.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" AS tx WHERE tx.id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::TransactionNotFound(id),
            error => error,
        })
}

/// Get a transaction by its id along with a summary of its department.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the id.
pub fn get_transaction_with_department(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction<DepartmentSummary>, Error> {
    connection
        .prepare(&format!("{} WHERE tx.id = :id", select_with_department()))?
        .query_row(&[(":id", &id)], map_transaction_with_department_row)
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::TransactionNotFound(id),
            error => error,
        })
}

/// Apply the fields set in `changes` to the transaction with `id`.
///
/// The department and owner of a transaction never change.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the id,
/// or [Error::Validation] if the merged transaction is invalid.
pub fn update_transaction(
    id: TransactionId,
    changes: TransactionForm,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let current = get_transaction(id, connection)?;

    let title = match changes.title {
        Some(title) => title.trim().to_owned(),
        None => current.title,
    };
    let description = changes.description.unwrap_or(current.description);
    let author = changes.author.unwrap_or(current.author);
    let amount = changes.amount.or(Some(current.amount));

    let amount = validate_fields(&title, &description, &author, amount)?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET title = ?1, description = ?2, author = ?3, amount = ?4, updated_at = ?5
             WHERE id = ?6
             {RETURNING_TRANSACTION}"
        ))?
        .query_row(
            (
                &title,
                &description,
                &author,
                amount,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_transaction_row,
        )
        .map_err(|error| error.into())
}

/// Delete a transaction.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if no transaction has the id.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::TransactionNotFound(id));
    }

    Ok(())
}

/// Get one page of the transactions matching `query` with their department
/// summaries, and the number of transactions matching `query` across all pages.
pub fn query_transactions(
    query: &ListQuery,
    connection: &Connection,
) -> Result<(Vec<Transaction<DepartmentSummary>>, u64), Error> {
    let (where_clause, values) = query.where_clause();

    let total: i64 = connection
        .prepare(&format!(
            "SELECT COUNT(*) FROM \"transaction\" AS tx {where_clause}"
        ))?
        .query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    let transactions = connection
        .prepare(&format!(
            "{} {where_clause} {} {}",
            select_with_department(),
            query.order_by_clause(),
            query.limit_clause()
        ))?
        .query_map(
            params_from_iter(values.iter()),
            map_transaction_with_department_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok((transactions, total as u64))
}

/// Get every transaction of the departments in `department_ids`, oldest first.
pub fn get_transactions_by_department(
    department_ids: &[DepartmentId],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    if department_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; department_ids.len()].join(", ");

    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" AS tx
             WHERE tx.department_id IN ({placeholders})
             ORDER BY tx.created_at ASC, tx.id ASC"
        ))?
        .query_map(params_from_iter(department_ids.iter()), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.into())
}
