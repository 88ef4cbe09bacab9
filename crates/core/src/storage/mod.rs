mod error;
mod query;
mod traits;

pub use error::{RepositoryError, Result};
pub use query::{build_list_statement, ListQuery, ListStatement, DELETED_FILTER};
pub use traits::{EntityRepository, RecordId};
