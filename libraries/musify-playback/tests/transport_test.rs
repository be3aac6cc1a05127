//! Tests for the commands the player sends to its transport

use mockall::predicate::eq;
use mockall::{mock, Sequence};
use musify_core::Track;
use musify_playback::{PlaybackConfig, PlaybackStatus, PlaybackTransport, Player};
use musify_source::{ResolverConfig, ScriptStep, ScriptedEndpoint, SourceResolver};
use std::sync::Arc;
use std::time::Duration;

mock! {
    Transport {}

    impl PlaybackTransport for Transport {
        fn load(&self, track: &Track, url: &str, start: Duration);
        fn pause(&self);
        fn resume(&self);
        fn seek(&self, position: Duration);
        fn stop(&self);
    }
}

fn player_with(transport: MockTransport, steps: Vec<ScriptStep>) -> Player {
    let resolver = SourceResolver::new(&ResolverConfig::default())
        .with_primary(Arc::new(ScriptedEndpoint::new(steps)));
    Player::new(
        Arc::new(resolver),
        Arc::new(transport),
        PlaybackConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn commands_reach_transport_in_order() {
    let mut transport = MockTransport::new();
    let mut seq = Sequence::new();

    transport
        .expect_load()
        .withf(|track, url, start| {
            track.id == "T1" && url == "https://cdn.example/high-bitrate/T1" && start.is_zero()
        })
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_pause()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_seek()
        .with(eq(Duration::from_secs(30)))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_resume()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_stop()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let player = player_with(
        transport,
        vec![ScriptStep::respond("https://cdn.example/high-bitrate/T1")],
    );

    player.play(Track::new("T1", "Song", "Artist")).await.unwrap();
    player.pause();
    player.pause();
    player.seek(Duration::from_secs(30));
    player.resume();
    player.stop();
    player.stop();
}

#[tokio::test(start_paused = true)]
async fn failed_resolution_never_loads() {
    let mut transport = MockTransport::new();
    transport.expect_load().never();
    transport.expect_stop().never();

    let player = player_with(transport, vec![]);

    let state = player.play(Track::new("T1", "Song", "Artist")).await.unwrap();
    assert_eq!(state.status, PlaybackStatus::Error);

    // Out-of-state commands don't reach the transport either
    player.pause();
    player.resume();
    player.seek(Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn switching_tracks_stops_previous_source() {
    let mut transport = MockTransport::new();
    let mut seq = Sequence::new();

    transport
        .expect_load()
        .withf(|track, _, _| track.id == "T1")
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_stop()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    transport
        .expect_load()
        .withf(|track, _, _| track.id == "T2")
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let player = player_with(
        transport,
        vec![
            ScriptStep::respond("https://cdn.example/high-bitrate/T1"),
            ScriptStep::respond("https://cdn.example/high-bitrate/T2"),
        ],
    );

    player
        .play_queue(
            vec![
                Track::new("T1", "One", "Artist"),
                Track::new("T2", "Two", "Artist"),
            ],
            0,
        )
        .await
        .unwrap();
    player.next().await;
}
