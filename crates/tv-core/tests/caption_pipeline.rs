//! End-to-end flow through the public API: load a playlist file, drive the
//! state manager the way the player core does, and resolve what the caption
//! area shows at each step.

use tv_core::caption::{resolve, CaptionServiceSnapshot, CaptionView, PlaybackCaptions};
use tv_core::playlist::load_playlist;
use tv_core::state::StateManager;

const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="globo.br" group-title="ABERTO",Globo SP
http://example.com/globo.m3u8
#EXTINF:-1 group-title="FILMES",Cine Classico
http://example.com/cine.m3u8
"#;

fn caption_view(state: &tv_core::channel::PlayerState, svc: &CaptionServiceSnapshot) -> CaptionView {
    let playback = PlaybackCaptions {
        embedded_text: state.embedded_caption.clone().unwrap_or_default(),
    };
    resolve(&playback, svc)
}

#[tokio::test]
async fn playlist_to_caption_flow() {
    let dir = tempfile::tempdir().unwrap();
    let playlist_path = dir.path().join("channels.m3u");
    std::fs::write(&playlist_path, PLAYLIST).unwrap();

    let channels = load_playlist(&playlist_path).unwrap();
    assert_eq!(channels.len(), 2);

    let mgr = StateManager::new(dir.path().join("state.json"), channels, 0.5);
    mgr.set_playing(0).await.unwrap();

    let mut svc = CaptionServiceSnapshot::default();

    // Nothing produced yet: caption area stays empty.
    let state = mgr.get_state().await;
    assert_eq!(caption_view(&state, &svc), CaptionView::Hidden);

    // Sidecar announces a model download.
    svc.status_message = "downloading model".into();
    svc.download_progress = 0.3;
    assert_eq!(
        caption_view(&state, &svc),
        CaptionView::Status {
            message: "downloading model".into(),
            progress: Some(0.3),
        }
    );

    // A stream cue arrives: it wins over the sidecar regardless of its state.
    mgr.set_embedded_caption(Some("Boa noite.".into())).await;
    let state = mgr.get_state().await;
    assert_eq!(
        caption_view(&state, &svc),
        CaptionView::Embedded("Boa noite.".into())
    );

    // Channel switch clears the stale cue; the sidecar is listening by now.
    svc = CaptionServiceSnapshot {
        is_listening: true,
        ..CaptionServiceSnapshot::default()
    };
    mgr.set_playing(1).await.unwrap();
    let state = mgr.get_state().await;
    assert_eq!(state.embedded_caption, None);
    assert_eq!(caption_view(&state, &svc), CaptionView::Listening);

    // Transcription text replaces the bare indicator.
    svc.current_text = "bem-vindos ao programa".into();
    assert_eq!(
        caption_view(&state, &svc),
        CaptionView::Auto("bem-vindos ao programa".into())
    );
}
