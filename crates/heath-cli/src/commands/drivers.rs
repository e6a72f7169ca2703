//! Drivers command: list registered storage backends.

use heath_db::{DEFAULT_DRIVER, registry};

pub(crate) fn list(configured: &str) {
    for name in registry::names() {
        let mut notes = Vec::new();
        if name == DEFAULT_DRIVER {
            notes.push("default");
        }
        if name == configured {
            notes.push("configured");
        }

        if notes.is_empty() {
            println!("{name}");
        } else {
            println!("{name} ({})", notes.join(", "));
        }
    }
}
