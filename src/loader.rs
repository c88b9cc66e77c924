use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::config::DatasetConfig;
use crate::dataset::{EnergyDataCache, TableSource, load_energy_data};
use crate::error::error_chain;
use crate::state::{Delta, LoaderCommand};

/// Run dataset loads on a background thread. The thread owns the dataset
/// cache, so repeated `Load` commands inside the freshness window are
/// answered without touching the network.
pub fn spawn_loader<T>(
    source: T,
    cfg: DatasetConfig,
    ttl: ChronoDuration,
    tx: Sender<Delta>,
    cmd_rx: Receiver<LoaderCommand>,
) -> JoinHandle<()>
where
    T: TableSource + Send + 'static,
{
    thread::spawn(move || {
        let mut cache = EnergyDataCache::new(ttl);
        info!(ttl_hours = cache.ttl().num_hours(), "dataset loader started");
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                LoaderCommand::Load { force } => {
                    if force {
                        cache.invalidate();
                    }
                    let now = Utc::now();
                    let from_cache = cache.is_fresh(now);
                    let delta = match cache.get_or_refresh(now, || load_energy_data(&source, &cfg)) {
                        Ok(data) => {
                            info!(countries = data.len(), from_cache, "dataset delivered");
                            Delta::DataLoaded { data, from_cache }
                        }
                        Err(err) => {
                            let message = error_chain(&err);
                            warn!(error = %message, "dataset load failed");
                            Delta::LoadFailed {
                                message,
                                retryable: err.is_retryable(),
                            }
                        }
                    };
                    if tx.send(delta).is_err() {
                        break;
                    }
                }
                LoaderCommand::Shutdown => break,
            }
        }
    })
}
