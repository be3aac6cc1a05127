/// Builds the resolver and catalog from configuration
use crate::config::AppConfig;
use crate::error::Result;
use musify_client::{ClientConfig, MusifyClient};
use musify_core::{AuthProvider, BearerToken};
use musify_source::{FlakyEndpoint, HttpSourceEndpoint, SourceEndpoint, SourceResolver, UrlTemplateEndpoint};
use std::sync::Arc;
use tracing::info;

/// Primary endpoint: HTTP when `source.url` is set and `simulate` is off,
/// otherwise the flaky simulator
pub fn primary_endpoint(
    config: &AppConfig,
    simulate: bool,
    auth: Option<Arc<dyn AuthProvider>>,
) -> Result<Arc<dyn SourceEndpoint>> {
    match (&config.source.url, simulate) {
        (Some(url), false) => {
            let mut endpoint = HttpSourceEndpoint::new(
                "primary",
                url,
                &config.source.path,
                config.source.query.into(),
            )?;
            if let Some(auth) = auth {
                endpoint = endpoint.with_auth(auth);
            }
            info!(url = %endpoint.url(), "Using HTTP source endpoint");
            Ok(Arc::new(endpoint))
        }
        _ => {
            let endpoint = match config.source.seed {
                Some(seed) => FlakyEndpoint::with_seed(seed),
                None => FlakyEndpoint::new(),
            };
            info!(seed = ?config.source.seed, "Using simulated flaky source endpoint");
            Ok(Arc::new(endpoint))
        }
    }
}

pub fn build_resolver(
    config: &AppConfig,
    simulate: bool,
    auth: Option<Arc<dyn AuthProvider>>,
) -> Result<SourceResolver> {
    let primary = primary_endpoint(config, simulate, auth)?;
    let secondary = UrlTemplateEndpoint::new("low-bitrate", config.source.fallback_template.as_str())?;

    Ok(SourceResolver::new(&config.resolver)
        .with_primary(primary)
        .with_secondary(Arc::new(secondary)))
}

/// Catalog client, logged in when credentials or a token are configured
///
/// Returns `None` when no catalog URL is configured.
pub async fn connect_catalog(config: &AppConfig) -> Result<Option<MusifyClient>> {
    let Some(url) = &config.catalog.url else {
        return Ok(None);
    };

    let client = MusifyClient::new(ClientConfig::new(url.as_str()))?;

    if let Some(token) = &config.catalog.token {
        client.set_token(BearerToken::new(token.as_str()));
    } else if let (Some(email), Some(password)) = (&config.catalog.email, &config.catalog.password) {
        client.login(email, password).await?;
    }

    info!(url = %client.url(), authenticated = client.is_authenticated(), "Catalog connected");
    Ok(Some(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use musify_core::Track;
    use musify_source::Provider;

    #[tokio::test(start_paused = true)]
    async fn simulated_resolver_falls_back_to_template() {
        let mut config = AppConfig::default();
        config.source.seed = Some(7);

        let resolver = build_resolver(&config, true, None).unwrap();
        assert!(resolver.has_provider(Provider::Primary));
        assert!(resolver.has_provider(Provider::Secondary));

        let track = Track::new("42", "Song", "Artist");
        let resolution = resolver.resolve(&track, Provider::Secondary).await.unwrap();
        assert_eq!(resolution.url, "https://cdn.example/low-bitrate/42");
    }

    #[test]
    fn http_endpoint_used_when_url_configured() {
        let mut config = AppConfig::default();
        config.source.url = Some("http://localhost:9090".into());

        let endpoint = primary_endpoint(&config, false, None).unwrap();
        assert_eq!(endpoint.name(), "primary");

        let endpoint = primary_endpoint(&config, true, None).unwrap();
        assert_eq!(endpoint.name(), "flaky");
    }

    #[tokio::test]
    async fn no_catalog_without_url() {
        assert!(connect_catalog(&AppConfig::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_skips_login() {
        let mut config = AppConfig::default();
        config.catalog.url = Some("http://localhost:8080/api".into());
        config.catalog.token = Some("pre-issued".into());

        let client = connect_catalog(&config).await.unwrap().unwrap();
        assert!(client.is_authenticated());
    }
}
