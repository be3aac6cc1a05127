//! Offline endpoint that builds the URL from a template

use crate::endpoint::SourceEndpoint;
use crate::error::EndpointError;
use async_trait::async_trait;
use musify_core::Track;
use url::Url;

/// Low-bitrate stream URL used when nothing else is configured
pub const DEFAULT_FALLBACK_TEMPLATE: &str = "https://cdn.example/low-bitrate/{id}";

/// Scratch URL used to percent-encode path segments
const SEGMENT_BASE: &str = "http://segment.invalid/";

/// Endpoint that never touches the network
///
/// Substitutes `{id}`, `{name}` and `{artist}` in the template. Values in the
/// path are percent-encoded as one segment each (`/` becomes `%2F`, space
/// becomes `%20`); values after `?` are form-encoded. Useful as a secondary
/// provider pointing at a known-good low-bitrate CDN.
pub struct UrlTemplateEndpoint {
    name: String,
    template: String,
}

impl UrlTemplateEndpoint {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self, EndpointError> {
        let template = template.into();
        if !template.contains('{') {
            return Err(EndpointError::InvalidConfig(format!(
                "template '{}' has no placeholder",
                template
            )));
        }

        Ok(Self {
            name: name.into(),
            template,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn render(&self, track: &Track) -> Result<String, EndpointError> {
        let (path, query) = match self.template.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.template.as_str(), None),
        };

        let mut url = substitute(path, track, encode_segment)?;
        if let Some(query) = query {
            url.push('?');
            url.push_str(&substitute(query, track, encode_query)?);
        }
        Ok(url)
    }
}

impl Default for UrlTemplateEndpoint {
    fn default() -> Self {
        Self {
            name: "low-bitrate".to_string(),
            template: DEFAULT_FALLBACK_TEMPLATE.to_string(),
        }
    }
}

#[async_trait]
impl SourceEndpoint for UrlTemplateEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, track: &Track) -> Result<String, EndpointError> {
        self.render(track)
    }
}

fn substitute(
    template: &str,
    track: &Track,
    encode: fn(&str) -> Result<String, EndpointError>,
) -> Result<String, EndpointError> {
    Ok(template
        .replace("{id}", &encode(&track.id)?)
        .replace("{name}", &encode(&track.name)?)
        .replace("{artist}", &encode(&track.artist)?))
}

/// Percent-encode `value` as a single path segment, `/` included
fn encode_segment(value: &str) -> Result<String, EndpointError> {
    let mut url =
        Url::parse(SEGMENT_BASE).map_err(|e| EndpointError::InvalidConfig(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| EndpointError::InvalidConfig(format!("{} cannot be a base", SEGMENT_BASE)))?
        .clear()
        .push(value);

    Ok(url.path().strip_prefix('/').unwrap_or(url.path()).to_string())
}

fn encode_query(value: &str) -> Result<String, EndpointError> {
    Ok(url::form_urlencoded::byte_serialize(value.as_bytes()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_default_template() {
        let endpoint = UrlTemplateEndpoint::default();
        let url = endpoint.fetch(&Track::new("T1", "Song", "Artist")).await.unwrap();
        assert_eq!(url, "https://cdn.example/low-bitrate/T1");
    }

    #[tokio::test]
    async fn encodes_substitutions() {
        let endpoint =
            UrlTemplateEndpoint::new("search", "https://cdn.example/find?q={name}&a={artist}")
                .unwrap();
        let url = endpoint
            .fetch(&Track::new("T1", "Hey Jude", "The Beatles"))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/find?q=Hey+Jude&a=The+Beatles");
    }

    #[tokio::test]
    async fn path_placeholders_are_encoded_as_segments() {
        let endpoint =
            UrlTemplateEndpoint::new("cdn", "https://cdn.example/low/{artist}/{name}.mp3").unwrap();
        let url = endpoint
            .fetch(&Track::new("T1", "Bohemian Rhapsody", "AC/DC"))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/low/AC%2FDC/Bohemian%20Rhapsody.mp3");
    }

    #[tokio::test]
    async fn path_and_query_placeholders_in_one_template() {
        let endpoint =
            UrlTemplateEndpoint::new("cdn", "https://cdn.example/low/{name}?artist={artist}")
                .unwrap();
        let url = endpoint
            .fetch(&Track::new("T1", "Hey Jude", "The Beatles"))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/low/Hey%20Jude?artist=The+Beatles");
    }

    #[test]
    fn template_needs_placeholder() {
        assert!(UrlTemplateEndpoint::new("x", "https://cdn.example/static.mp3").is_err());
    }
}
