/// Track loading for the `play` command
use crate::error::{CliError, Result};
use musify_core::{Catalog, Track};
use std::path::Path;
use std::time::Duration;

/// Generate `count` placeholder tracks of `length` each
pub fn demo_tracks(count: usize, length: Duration) -> Vec<Track> {
    (1..=count)
        .map(|i| {
            Track::new(
                format!("demo-{}", i),
                format!("Demo Track {}", i),
                "Musify Ensemble",
            )
            .with_album("Simulated Sessions")
            .with_duration(length)
        })
        .collect()
}

/// Read a JSON array of tracks
///
/// Tracks failing validation are rejected up front rather than surfacing
/// later as player errors.
pub async fn load_json(path: &Path) -> Result<Vec<Track>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let tracks: Vec<Track> = serde_json::from_str(&raw)?;

    for track in &tracks {
        track.validate()?;
    }

    if tracks.is_empty() {
        return Err(CliError::NoTracks(format!("{} is empty", path.display())));
    }

    Ok(tracks)
}

/// Search the catalog, keeping only playable records
pub async fn search(catalog: &dyn Catalog, query: &str, limit: usize) -> Result<Vec<Track>> {
    let tracks: Vec<Track> = catalog
        .search(query, limit)
        .await?
        .into_iter()
        .filter(|t| t.validate().is_ok())
        .collect();

    if tracks.is_empty() {
        return Err(CliError::NoTracks(format!("no catalog results for {:?}", query)));
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use musify_core::InMemoryCatalog;
    use std::io::Write;

    #[test]
    fn demo_tracks_are_playable() {
        let tracks = demo_tracks(3, Duration::from_secs(5));

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].id, "demo-1");
        assert!(tracks.iter().all(|t| t.validate().is_ok()));
        assert!(tracks
            .iter()
            .all(|t| t.duration() == Some(Duration::from_secs(5))));
    }

    #[tokio::test]
    async fn load_json_reads_tracks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"1","name":"One","artist":"A","album":null,"image_url":null,"direct_source_url":"https://cdn.example/preview/1.mp3","duration_ms":30000}}]"#
        )
        .unwrap();

        let tracks = load_json(file.path()).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].direct_source_url.as_deref(),
            Some("https://cdn.example/preview/1.mp3")
        );
    }

    #[tokio::test]
    async fn load_json_rejects_invalid_tracks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"","name":"One","artist":"A","album":null,"image_url":null,"direct_source_url":null,"duration_ms":null}}]"#
        )
        .unwrap();

        assert!(matches!(
            load_json(file.path()).await,
            Err(CliError::Catalog(_))
        ));
    }

    #[tokio::test]
    async fn search_without_results_is_an_error() {
        let catalog = InMemoryCatalog::new(demo_tracks(2, Duration::from_secs(1)));

        assert_eq!(search(&catalog, "demo", 10).await.unwrap().len(), 2);
        assert!(matches!(
            search(&catalog, "nothing matches", 10).await,
            Err(CliError::NoTracks(_))
        ));
    }
}
