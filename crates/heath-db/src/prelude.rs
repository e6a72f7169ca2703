//! Commonly used types: `use heath_db::prelude::*;`

pub use crate::{BlockStream, DbError, DbResult, Driver, DriverOptions};
pub use crate::{CloseFn, Resource, SharedBuffer, noop_close};
pub use crate::{VerifyError, open_file, open_from_config, verify_stream};
