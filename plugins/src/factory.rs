use dbagent_core::api::{
    Agent, AppConfig, ConfigurationError, DataStoreConfig, DataStoreKind, MothershipClient,
    MothershipConfig, QueryDelegate,
};

use crate::delegate::AthenaDelegate;
use crate::mothership::HttpMothershipClient;

/// Builds the query delegate for the configured store kind.
///
/// An unknown kind is a [`ConfigurationError`]; there is nothing the agent
/// could do with it later, so callers should treat it as fatal.
pub async fn build_delegate(
    cfg: &DataStoreConfig,
) -> Result<Box<dyn QueryDelegate>, ConfigurationError> {
    match cfg.kind()? {
        DataStoreKind::Athena => Ok(Box::new(AthenaDelegate::from_config(cfg).await?)),
    }
}

pub fn build_mothership(
    cfg: &MothershipConfig,
) -> Result<Box<dyn MothershipClient>, ConfigurationError> {
    let client = HttpMothershipClient::from_config(cfg)
        .map_err(|e| ConfigurationError::Invalid(format!("mothership client: {e}")))?;
    Ok(Box::new(client))
}

pub async fn build_agent(cfg: &AppConfig) -> Result<Agent, ConfigurationError> {
    let delegate = build_delegate(&cfg.datastore).await?;
    let mothership = build_mothership(&cfg.mothership)?;
    Ok(Agent::new(mothership, delegate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_store_kind_is_rejected_before_any_io() {
        let cfg = DataStoreConfig {
            kind: "ORACLE".to_string(),
            ..DataStoreConfig::default()
        };
        let err = build_delegate(&cfg).await.err().expect("kind must be rejected");
        assert!(matches!(err, ConfigurationError::UnsupportedStoreKind(k) if k == "ORACLE"));
    }

    #[test]
    fn mothership_client_builds_from_defaults() {
        assert!(build_mothership(&MothershipConfig::default()).is_ok());
    }
}
