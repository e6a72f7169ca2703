//! Named registry of storage backends.
//!
//! The registry is fixed at build time. Tools and tests iterate it to run
//! the same code against every backend.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::codec::{BinaryCodec, JsonLinesCodec, RecordCodec};
use crate::driver::Driver;
use crate::error::{DbError, DbResult};
use crate::log::{DriverOptions, LogDriver};
use crate::resource::{CloseFn, Resource};

/// Builds a driver over a resource and its close callback.
pub type DriverFactory =
    fn(Box<dyn Resource>, CloseFn, &DriverOptions) -> DbResult<Box<dyn Driver>>;

/// Name of the backend used when none is configured.
pub const DEFAULT_DRIVER: &str = BinaryCodec::NAME;

static DRIVERS: LazyLock<BTreeMap<&'static str, DriverFactory>> = LazyLock::new(|| {
    let mut drivers: BTreeMap<&'static str, DriverFactory> = BTreeMap::new();
    drivers.insert(BinaryCodec::NAME, open_log::<BinaryCodec>);
    drivers.insert(JsonLinesCodec::NAME, open_log::<JsonLinesCodec>);
    drivers
});

fn open_log<C: RecordCodec>(
    resource: Box<dyn Resource>,
    close: CloseFn,
    options: &DriverOptions,
) -> DbResult<Box<dyn Driver>> {
    Ok(Box::new(LogDriver::<C>::open(resource, close, options)?))
}

/// Every registered backend, ordered by name.
pub fn drivers() -> impl Iterator<Item = (&'static str, DriverFactory)> {
    DRIVERS.iter().map(|(name, factory)| (*name, *factory))
}

/// Names of every registered backend.
#[must_use]
pub fn names() -> Vec<&'static str> {
    DRIVERS.keys().copied().collect()
}

/// Look up a backend by name.
///
/// # Errors
///
/// Returns [`DbError::UnknownDriver`] if nothing is registered as `name`.
pub fn factory(name: &str) -> DbResult<DriverFactory> {
    DRIVERS
        .get(name)
        .copied()
        .ok_or_else(|| DbError::UnknownDriver {
            name: name.to_string(),
        })
}

/// Open `resource` with the backend registered as `name`, default options.
///
/// # Errors
///
/// Returns [`DbError::UnknownDriver`] or the backend's open error.
pub fn open(name: &str, resource: Box<dyn Resource>, close: CloseFn) -> DbResult<Box<dyn Driver>> {
    open_with(name, resource, close, &DriverOptions::default())
}

/// Open `resource` with the backend registered as `name`.
///
/// # Errors
///
/// Returns [`DbError::UnknownDriver`] or the backend's open error.
pub fn open_with(
    name: &str,
    resource: Box<dyn Resource>,
    close: CloseFn,
    options: &DriverOptions,
) -> DbResult<Box<dyn Driver>> {
    factory(name)?(resource, close, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SharedBuffer;
    use crate::resource::noop_close;

    #[test]
    fn test_registered_backends() {
        assert_eq!(names(), vec!["binary", "jsonl"]);
        assert!(names().contains(&DEFAULT_DRIVER));
    }

    #[test]
    fn test_factories_report_their_name() {
        for (name, factory) in drivers() {
            let driver = factory(
                Box::new(SharedBuffer::new()),
                noop_close(),
                &DriverOptions::default(),
            )
            .unwrap();
            assert_eq!(driver.name(), name);
        }
    }

    #[test]
    fn test_unknown_driver() {
        let Err(err) = open("sqlite", Box::new(SharedBuffer::new()), noop_close()) else {
            panic!("unknown driver opened");
        };
        assert!(matches!(err, DbError::UnknownDriver { name } if name == "sqlite"));
    }
}
