//! Verify command: check the stored chain end to end.

use anyhow::Context;
use heath_block::ChainVerifier;
use heath_config::Config;
use heath_crypto::{PublicKey, TrustedKeys};
use heath_db::{open_from_config, verify_stream_with};
use tokio_util::sync::CancellationToken;

/// Stream and verify every block. `trusted` holds base64 public keys; when
/// non-empty, blocks signed by any other key fail verification.
pub(crate) async fn verify(config: &Config, trusted: &[String]) -> anyhow::Result<()> {
    let mut verifier = ChainVerifier::new();
    if !trusted.is_empty() {
        let keys = trusted
            .iter()
            .map(|k| PublicKey::from_base64(k))
            .collect::<Result<TrustedKeys, _>>()
            .context("parsing --trusted key")?;
        verifier = verifier.with_trusted_keys(keys);
    }

    let driver = open_from_config(&config.store)?;
    let result = verify_stream_with(driver.stream_blocks(CancellationToken::new()), verifier).await;
    driver.close()?;

    let verified = result.context("chain verification failed")?;
    println!("chain OK: {verified} block(s)");
    Ok(())
}
