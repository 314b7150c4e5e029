use crate::error::InitError;
use crate::handler::LogHandler;
use crate::layer::HandlerLayer;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `level`: most verbose level forwarded to the handler.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`HandlerLayer`] so events are also printed.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `handler`.
///
/// **Parameters**
/// - `handler`: the [`LogHandler`] that receives each record.
/// - `config`: [`LayerConfig`] controlling level and console output.
///
/// **Returns**
/// - `Err(InitError::AlreadySet)` when a global subscriber exists already.
///
/// Nothing is installed implicitly by the crate; callers that prefer a
/// scoped subscriber can build `Registry::default().with(HandlerLayer::new(..))`
/// and use `tracing::subscriber::with_default`.
pub fn init_tracing_with_config(handler: Arc<dyn LogHandler>, config: LayerConfig) -> Result<(), InitError> {
    let layer = HandlerLayer::new(handler, config.level);

    // The two stacks have different types, so each branch installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(handler: Arc<dyn LogHandler>) -> Result<(), InitError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
