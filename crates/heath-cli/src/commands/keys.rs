//! Keygen command: create or show the signing key.

use std::path::Path;

use anyhow::Context;
use heath_crypto::{KeyPair, Signer};

/// Load the key at `path`, generating it on first use, and print its identity.
pub(crate) fn keygen(path: &Path) -> anyhow::Result<()> {
    let existed = path.exists();
    let key = KeyPair::load_or_generate(path)
        .with_context(|| format!("loading signing key {}", path.display()))?;

    if existed {
        println!("Loaded existing key.");
    } else {
        println!("New key generated.");
    }
    println!("  Key ID:     {}", key.key_id_hex());
    println!("  Public key: {}", key.public_key().to_base64());
    println!("  Key file:   {}", path.display());

    Ok(())
}
