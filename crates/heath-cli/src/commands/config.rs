//! Config command: print the resolved configuration.

use heath_config::{Config, ResolvedConfig};

pub(crate) fn show(resolved: &ResolvedConfig, effective: &Config) -> anyhow::Result<()> {
    match &resolved.loaded_file {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults"),
    }
    for var in &resolved.env_overrides {
        println!("# overridden by {var}");
    }
    print!("{}", effective.to_toml()?);
    Ok(())
}
