//! Departments: the top-level resource that users publish and attach transactions to.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod get_endpoint;
mod list_endpoint;
mod photo_endpoint;
mod update_endpoint;

pub use core::{DepartmentSummary, create_department_table, get_department};
pub use create_endpoint::create_department_endpoint;
pub use delete_endpoint::delete_department_endpoint;
pub use get_endpoint::get_department_endpoint;
pub use list_endpoint::list_departments_endpoint;
pub use photo_endpoint::upload_photo_endpoint;
pub use update_endpoint::update_department_endpoint;

#[cfg(test)]
pub use core::{DepartmentForm, NewDepartment, create_department, delete_department};
