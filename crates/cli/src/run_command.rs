use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Result,
    corelink_bridge::{InboundBridge, OutboundBridge},
    corelink_config::{CorelinkConfig, Severity},
    corelink_connection::{ConnectionConfig, ConnectionManager, WsTransport},
    corelink_onebot::OneBotClient,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::config_commands::load_effective;

/// Run the bridge until Ctrl-C.
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_effective(config_path.as_deref())?;
    report_diagnostics(&config)?;

    let cancel = CancellationToken::new();

    let (platform_tx, platform_rx) = mpsc::unbounded_channel();
    let onebot = Arc::new(OneBotClient::spawn(
        &config.platform,
        platform_tx,
        cancel.clone(),
    ));

    let (manager, engine_rx) = ConnectionManager::new(Arc::new(WsTransport));
    manager.connect(ConnectionConfig::from(&config.core))?;

    let inbound = Arc::new(InboundBridge::new(
        Arc::new(manager.clone()),
        onebot.clone(),
        config.bridge.clone(),
    ));
    let outbound = Arc::new(OutboundBridge::new(onebot));
    tokio::spawn(inbound.run(platform_rx));
    tokio::spawn(outbound.run(engine_rx));

    #[cfg(unix)]
    tokio::spawn(watch_reloads(
        config_path,
        config,
        manager.clone(),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    manager.disconnect();
    cancel.cancel();
    Ok(())
}

/// Log config diagnostics; refuse to start on errors.
fn report_diagnostics(config: &CorelinkConfig) -> Result<()> {
    let result = corelink_config::validate_config(config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => debug!(path = %d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        anyhow::bail!(
            "configuration has {} error(s); run `corelink config check`",
            result.count(Severity::Error)
        );
    }
    Ok(())
}

/// Re-read the config on SIGHUP and apply the `[core]` section.
#[cfg(unix)]
async fn watch_reloads(
    config_path: Option<PathBuf>,
    mut current: CorelinkConfig,
    manager: ConnectionManager,
    cancel: CancellationToken,
) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "SIGHUP handler unavailable, config reload disabled");
            return;
        },
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            received = hangup.recv() => {
                if received.is_none() {
                    return;
                }
            },
        }
        if let Some(next) = reload(config_path.as_deref(), &current, &manager) {
            current = next;
        }
    }
}

#[cfg(unix)]
fn reload(
    config_path: Option<&std::path::Path>,
    current: &CorelinkConfig,
    manager: &ConnectionManager,
) -> Option<CorelinkConfig> {
    let next = match load_effective(config_path) {
        Ok(next) => next,
        Err(e) => {
            warn!(error = %e, "config reload failed, keeping current settings");
            return None;
        },
    };
    if report_diagnostics(&next).is_err() {
        warn!("reloaded config is invalid, keeping current settings");
        return None;
    }

    if next.platform.url != current.platform.url
        || next.bridge.enrich_replies != current.bridge.enrich_replies
    {
        warn!("[platform] and [bridge] changes take effect after a restart");
    }

    match manager.reconfigure(ConnectionConfig::from(&next.core)) {
        Ok(true) => info!("engine endpoint changed, reconnecting"),
        Ok(false) => info!("config reloaded, engine endpoint unchanged"),
        Err(e) => {
            warn!(error = %e, "reloaded engine settings rejected");
            return None;
        },
    }
    Some(next)
}
