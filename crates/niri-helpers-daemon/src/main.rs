//! niri-floatd
//!
//! Floats windows that match configured rules, even when their title or app
//! id only appears after the window has opened.

mod float;
mod registry;
mod rules;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use niri_helpers_config::{init_logging, parse_config, paths, Config};
use niri_helpers_ipc::{EventStream, NiriClient, NiriError, Transport, DEFAULT_MAX_RETRIES};

use crate::float::FloatDaemon;
use crate::rules::RuleEngine;

#[derive(Parser, Debug)]
#[command(name = "niri-floatd")]
#[command(about = "Dynamic window floating daemon for niri")]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = match &args.config {
        Some(path) => shellexpand::tilde(path).into_owned().into(),
        None => paths::default_config_path(),
    };

    let config = parse_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let log_path = paths::log_file(&config.global.state_dir(), "dynamic-float");
    init_logging(config.global.log_level, Some(&log_path));

    tracing::info!("Loaded configuration from {}", config_path.display());

    let (mut daemon, mut stream) = start(&config, || async {
        let client = NiriClient::connect()?;
        let stream = EventStream::connect_with_retry(DEFAULT_MAX_RETRIES).await?;
        Ok::<_, NiriError>((client, stream))
    })
    .await?;

    tracing::info!("niri-floatd running");

    tokio::select! {
        result = daemon.run(&mut stream) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
    }

    Ok(())
}

/// Compile the float rules, then call `connect` for the niri connections
///
/// `connect` is not called when the rules are missing or invalid.
async fn start<T, R, C, Fut>(
    config: &Config,
    connect: C,
) -> Result<(FloatDaemon<T>, EventStream<R>)>
where
    T: Transport,
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<(NiriClient<T>, EventStream<R>), NiriError>>,
{
    let engine = RuleEngine::new(config.dynamic_float_section()?)?;
    tracing::info!("Loaded {} float rule(s)", engine.len());

    let (client, stream) = connect().await?;
    Ok((FloatDaemon::new(client, engine), stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use niri_helpers_config::{ConfigError, FloatConfig, FloatRule, MatchSpec};
    use niri_helpers_ipc::testing::StubTransport;

    use crate::rules::RuleError;

    type Connected = (NiriClient<StubTransport>, EventStream<&'static [u8]>);

    fn stub_connection() -> Connected {
        (
            NiriClient::new(StubTransport::new()),
            EventStream::from_reader(&b""[..]),
        )
    }

    fn float_config(rules: Vec<FloatRule>) -> Config {
        Config {
            dynamic_float: Some(FloatConfig { rules }),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_no_rules_fails_before_connecting() {
        let connected = Cell::new(false);
        let flag = &connected;

        let result = start(&float_config(Vec::new()), move || async move {
            flag.set(true);
            Ok::<_, NiriError>(stub_connection())
        })
        .await;

        let err = result.err().unwrap();
        assert!(matches!(err.downcast_ref::<RuleError>(), Some(RuleError::NoRules)));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_missing_section_fails_before_connecting() {
        let connected = Cell::new(false);
        let flag = &connected;

        let result = start(&Config::default(), move || async move {
            flag.set(true);
            Ok::<_, NiriError>(stub_connection())
        })
        .await;

        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingSection { .. })
        ));
        assert!(!connected.get());
    }

    #[tokio::test]
    async fn test_valid_rules_connect_once() {
        let connects = Cell::new(0);
        let counter = &connects;
        let config = float_config(vec![FloatRule {
            matches: vec![MatchSpec {
                title: Some("Spotify".to_string()),
                app_id: None,
            }],
            ..FloatRule::default()
        }]);

        let (daemon, _stream) = start(&config, move || async move {
            counter.set(counter.get() + 1);
            Ok::<_, NiriError>(stub_connection())
        })
        .await
        .unwrap();

        assert_eq!(connects.get(), 1);
        assert!(daemon.registry().is_empty());
    }
}
