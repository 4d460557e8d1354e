//! Operations context for dependency injection

use arcdl_config::Config;
use arcdl_errors::Error;
use arcdl_events::{EventEmitter, EventSender};
use arcdl_extract::Extractor;
use arcdl_launcher::{platform_launcher, Launcher};
use arcdl_net::{FetchConfig, Fetcher};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Resumable downloader
    pub fetcher: Fetcher,
    /// Archive extractor
    pub extractor: Extractor,
    /// Desktop shortcut creation
    pub launcher: Arc<dyn Launcher>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Loaded configuration
    pub config: Config,
    /// Cancelled on Ctrl-C
    pub cancel: CancellationToken,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl OpsCtx {
    /// Whether the user asked to stop
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Builder for the operations context
pub struct OpsContextBuilder {
    fetcher: Option<Fetcher>,
    launcher: Option<Arc<dyn Launcher>>,
    tx: Option<EventSender>,
    config: Option<Config>,
    cancel: Option<CancellationToken>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            fetcher: None,
            launcher: None,
            tx: None,
            config: None,
            cancel: None,
        }
    }

    /// Use a preconfigured fetcher instead of one built from the config
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the shortcut launcher (defaults to the platform launcher)
    #[must_use]
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the cancellation token shared by every operation
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the event sender is missing or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let tx = self
            .tx
            .ok_or_else(|| Error::internal("missing component: event_sender"))?;
        let config = self.config.unwrap_or_default();
        let cancel = self.cancel.unwrap_or_default();

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Fetcher::new(FetchConfig::from_config(&config))?,
        }
        .with_events(tx.clone())
        .with_cancellation(cancel.clone());

        Ok(OpsCtx {
            fetcher,
            extractor: Extractor::new().with_events(tx.clone()),
            launcher: self.launcher.unwrap_or_else(platform_launcher),
            tx,
            config,
            cancel,
        })
    }
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_event_sender() {
        let err = OpsContextBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("event_sender"));
    }

    #[test]
    fn test_builder_defaults() {
        let (tx, _rx) = arcdl_events::channel();
        let mut config = Config::default();
        config.network.chunk_size = 1024;

        let ctx = OpsContextBuilder::new()
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();

        assert_eq!(ctx.fetcher.config().chunk_size, 1024);
        assert!(!ctx.is_cancelled());
        ctx.cancel.cancel();
        assert!(ctx.is_cancelled());
    }
}
