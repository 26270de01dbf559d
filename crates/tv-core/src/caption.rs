//! Caption source arbitration for the player surface.
//!
//! Two independent producers feed the caption area: the video stream itself
//! (subtitle cues decoded by the player, surfaced via the `sub-text`
//! property) and the speech-recognition sidecar transcribing the audio track
//! in real time.  `resolve` picks exactly one thing to show, every time
//! either producer changes.  It is a pure function over the two latest
//! snapshots — no memory, no hysteresis: when embedded cues vanish
//! mid-stream the next call falls straight through to the generated caption
//! or the service's lifecycle indicator.

use serde::{Deserialize, Serialize};

/// Latest observable state of the speech-recognition captioning service.
///
/// Owned by the transcriber bridge; the resolver only ever reads a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionServiceSnapshot {
    /// Latest auto-transcribed utterance.  Empty when nothing recognized yet.
    pub current_text: String,
    /// Human-readable lifecycle message ("loading model", "downloading…").
    /// Empty when the service is idle or listening with nothing to announce.
    pub status_message: String,
    /// True once the recognizer is actively capturing audio.
    pub is_listening: bool,
    /// Fraction in [0,1]; meaningful only while a model download is running.
    pub download_progress: f32,
}

/// Caption state owned by the playback surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackCaptions {
    /// Subtitle text embedded in the current stream, empty when no cue is up.
    pub embedded_text: String,
}

/// What the caption area should render right now.  Exactly one variant is
/// active at any instant.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionView {
    /// Ground-truth subtitle carried inside the stream.
    Embedded(String),
    /// Auto-generated caption from the speech-recognition service.
    Auto(String),
    /// Service lifecycle message, with a progress fraction when a download
    /// is actually in flight (open interval — 0 and 1 show no bar).
    Status { message: String, progress: Option<f32> },
    /// Recognizer is capturing audio but has produced no text yet.
    Listening,
    /// Nothing to show.
    Hidden,
}

/// Select the caption view for the current pair of snapshots.
///
/// Strict priority order, first match wins:
/// 1. embedded stream captions (always trusted over generated text),
/// 2. auto-transcribed text,
/// 3. service status message while not yet listening (covers init / model
///    download, and error reporting — failures arrive as a status message),
/// 4. bare listening indicator,
/// 5. nothing.
///
/// Whitespace-only text counts as absent, but the embedded text is returned
/// verbatim — trimming is only the emptiness test.
pub fn resolve(playback: &PlaybackCaptions, service: &CaptionServiceSnapshot) -> CaptionView {
    if !playback.embedded_text.trim().is_empty() {
        return CaptionView::Embedded(playback.embedded_text.clone());
    }
    if !service.current_text.trim().is_empty() {
        return CaptionView::Auto(service.current_text.clone());
    }
    if !service.status_message.is_empty() && !service.is_listening {
        return CaptionView::Status {
            message: service.status_message.clone(),
            progress: displayable_progress(service.download_progress),
        };
    }
    if service.is_listening {
        return CaptionView::Listening;
    }
    CaptionView::Hidden
}

/// A progress fraction is only worth a bar while strictly between 0 and 1.
/// Out-of-range values (negative, ≥1, NaN) are display-suppressed, never
/// rejected — the resolver is total.
fn displayable_progress(p: f32) -> Option<f32> {
    if p > 0.0 && p < 1.0 {
        Some(p)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CaptionServiceSnapshot {
        CaptionServiceSnapshot::default()
    }

    #[test]
    fn embedded_beats_everything() {
        let playback = PlaybackCaptions {
            embedded_text: "  Hello  ".into(),
        };
        let svc = CaptionServiceSnapshot {
            current_text: "generated".into(),
            status_message: "downloading model".into(),
            is_listening: true,
            download_progress: 0.5,
        };
        // Text is returned verbatim, untrimmed.
        assert_eq!(
            resolve(&playback, &svc),
            CaptionView::Embedded("  Hello  ".into())
        );
    }

    #[test]
    fn auto_text_when_no_embedded() {
        let svc = CaptionServiceSnapshot {
            current_text: "hi".into(),
            ..service()
        };
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Auto("hi".into())
        );
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let playback = PlaybackCaptions {
            embedded_text: "   \t ".into(),
        };
        let svc = CaptionServiceSnapshot {
            current_text: " \n ".into(),
            is_listening: true,
            ..service()
        };
        assert_eq!(resolve(&playback, &svc), CaptionView::Listening);
    }

    #[test]
    fn status_with_mid_download_progress() {
        let svc = CaptionServiceSnapshot {
            status_message: "Downloading model".into(),
            download_progress: 0.42,
            ..service()
        };
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Status {
                message: "Downloading model".into(),
                progress: Some(0.42),
            }
        );
    }

    #[test]
    fn completed_download_suppresses_progress_bar() {
        let svc = CaptionServiceSnapshot {
            status_message: "Downloading model".into(),
            download_progress: 1.0,
            ..service()
        };
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Status {
                message: "Downloading model".into(),
                progress: None,
            }
        );
    }

    #[test]
    fn negative_progress_suppresses_bar_but_keeps_status() {
        let svc = CaptionServiceSnapshot {
            status_message: "preparing".into(),
            download_progress: -0.3,
            ..service()
        };
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Status {
                message: "preparing".into(),
                progress: None,
            }
        );
    }

    #[test]
    fn listening_wins_over_status_once_capturing() {
        // Once the recognizer is live, a leftover status message no longer
        // qualifies for the Status variant; the listening indicator shows.
        let svc = CaptionServiceSnapshot {
            status_message: "Ouvindo...".into(),
            is_listening: true,
            ..service()
        };
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Listening
        );
    }

    #[test]
    fn all_quiet_hides_the_caption_area() {
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &service()),
            CaptionView::Hidden
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let playback = PlaybackCaptions {
            embedded_text: String::new(),
        };
        let svc = CaptionServiceSnapshot {
            status_message: "loading model".into(),
            download_progress: 0.7,
            ..service()
        };
        assert_eq!(resolve(&playback, &svc), resolve(&playback, &svc));
    }

    #[test]
    fn higher_priority_source_vanishing_falls_through() {
        // No stickiness: the same service state yields Auto once the
        // embedded cue clears.
        let svc = CaptionServiceSnapshot {
            current_text: "gerado".into(),
            ..service()
        };
        let with_cue = PlaybackCaptions {
            embedded_text: "cue".into(),
        };
        assert_eq!(resolve(&with_cue, &svc), CaptionView::Embedded("cue".into()));
        assert_eq!(
            resolve(&PlaybackCaptions::default(), &svc),
            CaptionView::Auto("gerado".into())
        );
    }
}
