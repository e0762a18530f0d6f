//! Configuration loader implementations.

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use crate::schema::{
    ConfigError, ConfigResult, DeploymentKind, Network, OpenAiSettings, PredictionSettings, Secret,
    Settings, SwapSettings,
};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_CHAIN_SLUG: &str = "testnet";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

/// Key/value source settings are read from.
pub trait EnvSource {
    /// Returns the raw value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or malformed.
    pub fn from_env(deployment: Option<DeploymentKind>) -> ConfigResult<Self> {
        Self::load(&ProcessEnv, deployment)
    }

    /// Loads settings from `source`; `deployment` overrides `AGENT_DEPLOYMENT`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or malformed.
    pub fn load(source: &dyn EnvSource, deployment: Option<DeploymentKind>) -> ConfigResult<Self> {
        let reader = Reader { source };

        let deployment = match deployment {
            Some(kind) => kind,
            None => reader
                .optional("AGENT_DEPLOYMENT")
                .map_or(Ok(DeploymentKind::MarketData), |raw| raw.parse())?,
        };

        let openai = OpenAiSettings {
            api_key: Secret::new(reader.required("OPENAI_API_KEY", deployment)?),
            model: reader
                .optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: reader.optional("OPENAI_BASE_URL"),
        };

        let swap = if deployment == DeploymentKind::Swap {
            Some(SwapSettings {
                api_key: Secret::new(reader.required("UNISWAP_API_KEY", deployment)?),
                wallet_address: parse_wallet(reader.required("WALLET_ADDRESS", deployment)?)?,
                network: reader.required("NETWORK", deployment)?.parse::<Network>()?,
            })
        } else {
            None
        };

        let prediction = if deployment == DeploymentKind::Prediction {
            Some(PredictionSettings {
                api_key: Secret::new(reader.required("ALLORA_API_KEY", deployment)?),
                chain_slug: reader
                    .optional("ALLORA_CHAIN_SLUG")
                    .unwrap_or_else(|| DEFAULT_CHAIN_SLUG.to_owned()),
            })
        } else {
            None
        };

        let tool_timeout = match reader.optional("TOOL_TIMEOUT_SECS") {
            None => Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
                    key: "TOOL_TIMEOUT_SECS",
                    reason: err.to_string(),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
        };

        let settings = Self {
            deployment,
            openai,
            swap,
            prediction,
            tool_timeout,
            log_filter: reader
                .optional("AGENT_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned()),
        };

        Ok(settings)
    }

    /// Logs the selected deployment, model, and swap network at `info`.
    ///
    /// Loading itself is silent so it can run before a subscriber is installed.
    pub fn log_summary(&self) {
        info!(
            deployment = %self.deployment,
            model = %self.openai.model,
            network = ?self.swap.as_ref().map(|swap| swap.network),
            "settings loaded"
        );
    }
}

struct Reader<'a> {
    source: &'a dyn EnvSource,
}

impl Reader<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        self.source
            .get(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str, deployment: DeploymentKind) -> ConfigResult<String> {
        self.optional(key)
            .ok_or(ConfigError::Missing { key, deployment })
    }
}

fn parse_wallet(raw: String) -> ConfigResult<String> {
    let valid = raw.len() == 42
        && raw.starts_with("0x")
        && raw[2..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(raw)
    } else {
        Err(ConfigError::Invalid {
            key: "WALLET_ADDRESS",
            reason: "expected a 0x-prefixed 20-byte hex address".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::{Arc, Mutex};

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(run: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, run);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn summary_is_logged_on_request_not_on_load() {
        let source = env(&[("OPENAI_API_KEY", "sk-test")]);
        let mut loaded = None;

        let during_load = captured(|| loaded = Some(Settings::load(&source, None).unwrap()));
        assert!(during_load.is_empty(), "{during_load}");

        let settings = loaded.unwrap();
        let summary = captured(|| settings.log_summary());
        assert!(summary.contains("settings loaded"), "{summary}");
        assert!(summary.contains("market-data"), "{summary}");
        assert!(!summary.contains("sk-test"), "{summary}");
    }

    #[test]
    fn market_data_needs_only_model_key() {
        let settings = Settings::load(&env(&[("OPENAI_API_KEY", "sk-test")]), None).unwrap();

        assert_eq!(settings.deployment, DeploymentKind::MarketData);
        assert_eq!(settings.openai.model, DEFAULT_MODEL);
        assert_eq!(settings.tool_timeout, Some(Duration::from_secs(30)));
        assert!(settings.swap.is_none());
        assert!(settings.prediction.is_none());
    }

    #[test]
    fn missing_model_key_fails_fast() {
        let err = Settings::load(&env(&[]), None).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                key: "OPENAI_API_KEY",
                deployment: DeploymentKind::MarketData
            }
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = Settings::load(&env(&[("OPENAI_API_KEY", "   ")]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "OPENAI_API_KEY", .. }));
    }

    #[test]
    fn swap_requires_network_and_wallet() {
        let base = [
            ("OPENAI_API_KEY", "sk-test"),
            ("AGENT_DEPLOYMENT", "swap"),
            ("UNISWAP_API_KEY", "uni"),
            ("WALLET_ADDRESS", WALLET),
        ];
        let err = Settings::load(&env(&base), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "NETWORK", .. }));

        let mut full = base.to_vec();
        full.push(("NETWORK", "base"));
        let settings = Settings::load(&env(&full), None).unwrap();
        let swap = settings.swap.expect("swap settings");
        assert_eq!(swap.network, Network::Base);
        assert_eq!(swap.wallet_address, WALLET);
    }

    #[test]
    fn malformed_wallet_is_invalid() {
        let err = Settings::load(
            &env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("UNISWAP_API_KEY", "uni"),
                ("WALLET_ADDRESS", "0xnothex"),
                ("NETWORK", "base"),
            ]),
            Some(DeploymentKind::Swap),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WALLET_ADDRESS", .. }));
    }

    #[test]
    fn override_beats_environment() {
        let settings = Settings::load(
            &env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("AGENT_DEPLOYMENT", "swap"),
                ("ALLORA_API_KEY", "allora"),
            ]),
            Some(DeploymentKind::Prediction),
        )
        .unwrap();

        assert_eq!(settings.deployment, DeploymentKind::Prediction);
        assert_eq!(settings.prediction.unwrap().chain_slug, DEFAULT_CHAIN_SLUG);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let settings = Settings::load(
            &env(&[("OPENAI_API_KEY", "sk-test"), ("TOOL_TIMEOUT_SECS", "0")]),
            None,
        )
        .unwrap();
        assert_eq!(settings.tool_timeout, None);

        let err = Settings::load(
            &env(&[("OPENAI_API_KEY", "sk-test"), ("TOOL_TIMEOUT_SECS", "soon")]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOOL_TIMEOUT_SECS", .. }));
    }
}
