//! Scripted editing session replayed by each simulated client
//!
//! connect → login → settle → fast phase → pause → slow phase → linger → close

use crate::client::SimulatedClient;
use crate::config::ScriptConfig;
use crate::error::ClientError;
use crate::stats::Tally;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Run the full script for client `index`.
///
/// Returns on the first failed step without retrying. Success is not
/// recorded here; the caller owns the tally update.
pub async fn run_client(
    index: usize,
    url: &str,
    session: &str,
    script: &ScriptConfig,
    tally: Arc<Tally>,
) -> Result<(), ClientError> {
    let mut client = SimulatedClient::connect(url, index, session, tally).await?;

    client.login().await?;
    info!("{}: logged in", index);

    sleep(script.settle).await;
    send_phase(&mut client, script.messages, script.fast_interval).await?;

    sleep(script.pause).await;
    send_phase(&mut client, script.messages, script.slow_interval).await?;

    sleep(script.linger).await;
    client.close().await?;
    debug!("{}: closed", index);

    Ok(())
}

/// Send `messages` changes, sleeping `interval` after each one
async fn send_phase(
    client: &mut SimulatedClient,
    messages: usize,
    interval: Duration,
) -> Result<(), ClientError> {
    for seq in 0..messages {
        let bytes = client.send_change(seq).await?;
        debug!("{} ({}): sent change, {} bytes", client.index(), seq, bytes);
        sleep(interval).await;
    }
    Ok(())
}
