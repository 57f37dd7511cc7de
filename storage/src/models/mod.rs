//! Query, value and row models shared by every connector.

mod query;
mod row;
mod value;

pub use query::{BindError, Query};
pub use row::{ResultSet, Row};
pub use value::Value;
