//! Append, get and dump commands.

use std::io::Write;

use anyhow::{Context, bail};
use heath_block::{Block, Signature};
use heath_config::Config;
use heath_crypto::{ContentHash, KeyPair};
use heath_db::{Driver, open_from_config};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Chain a new block carrying `payload` onto the head of the log.
pub(crate) async fn append(config: &Config, payload: Vec<u8>) -> anyhow::Result<()> {
    let key_path = &config.keys.signing_key;
    let key = KeyPair::load_or_generate(key_path)
        .with_context(|| format!("loading signing key {}", key_path.display()))?;

    let driver = open_from_config(&config.store)?;
    let result = append_to(driver.as_ref(), &key, payload).await;
    driver.close()?;

    let block = result?;
    println!("{}", block.content_hash());
    Ok(())
}

async fn append_to(driver: &dyn Driver, key: &KeyPair, payload: Vec<u8>) -> anyhow::Result<Block> {
    let previous = head(driver).await?;
    let block = Block::new(previous.as_ref(), key, payload)?;
    driver.write(&block)?;

    info!(
        content_hash = %block.content_hash().short(),
        genesis = previous.is_none(),
        "appended block"
    );
    Ok(block)
}

/// Signature of the last stored block.
async fn head(driver: &dyn Driver) -> anyhow::Result<Option<Signature>> {
    let mut stream = driver.stream_blocks(CancellationToken::new());
    let mut last = None;
    while let Some(block) = stream.next().await {
        last = Some(*block.signature());
    }
    stream
        .finish()
        .await
        .context("reading the chain head; run `heath verify` for details")?;
    Ok(last)
}

/// Print one block by content hash. With `raw` only the payload bytes are
/// written.
pub(crate) fn get(config: &Config, hash: &str, raw: bool) -> anyhow::Result<()> {
    let hash: ContentHash = hash
        .parse()
        .context("content hash must be 64 hex characters")?;

    let driver = open_from_config(&config.store)?;
    let found = driver.get_block_by_content_hash(&hash);
    driver.close()?;

    let block = match found {
        Ok(block) => block,
        Err(e) if e.is_not_found() => bail!("no block with content hash {hash}"),
        Err(e) => return Err(e.into()),
    };

    if raw {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(block.payload())?;
        stdout.flush()?;
    } else {
        let sig = block.signature();
        println!("content hash: {}", sig.content_hash());
        println!("previous:     {}", sig.previous());
        println!("signer:       {}", sig.signer().to_base64());
        println!("signature:    {}", sig.signature_bytes().to_base64());
        println!("length:       {}", block.payload().len());
        println!();
        println!("{}", String::from_utf8_lossy(block.payload()));
    }
    Ok(())
}

/// Print every block, one line each, in write order.
pub(crate) async fn dump(config: &Config, payloads: bool) -> anyhow::Result<()> {
    let driver = open_from_config(&config.store)?;
    let mut stream = driver.stream_blocks(CancellationToken::new());

    let mut index: usize = 0;
    while let Some(block) = stream.next().await {
        println!("{}", summary(index, &block, payloads));
        index = index.saturating_add(1);
    }

    let result = stream.finish().await;
    driver.close()?;
    result?;
    Ok(())
}

fn summary(index: usize, block: &Block, payload: bool) -> String {
    let sig = block.signature();
    let previous = if sig.is_genesis() {
        "genesis".to_string()
    } else {
        sig.previous().short()
    };
    let mut line = format!(
        "{index:>6} {} prev={previous} signer={} len={}",
        sig.content_hash(),
        sig.signer().key_id_hex(),
        block.payload().len()
    );
    if payload {
        line.push(' ');
        line.push_str(&String::from_utf8_lossy(block.payload()).escape_debug().to_string());
    }
    line
}
