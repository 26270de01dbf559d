//! Playlist loading — extended M3U and the per-category JSON files the
//! original channel lists ship as.

use std::path::Path;

use crate::channel::Channel;

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("failed to read playlist {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON playlist: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported playlist format: {0}")]
    UnsupportedFormat(String),
}

fn extinf_attr_re() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r#"([A-Za-z0-9-]+)="([^"]*)""#).expect("valid regex"))
}

/// Parse an extended-M3U playlist.
///
/// `#EXTINF` attributes (`tvg-id`, `tvg-logo`, `group-title`) are optional;
/// the display name is everything after the comma that closes the attribute
/// section.  Unknown comment lines are skipped, so plain non-extended M3U
/// still parses (URLs only, names fall back to the URL).
pub fn parse_m3u_from_str(content: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut pending: Option<Channel> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            let mut ch = Channel::default();
            let mut attrs_end = 0;
            for cap in extinf_attr_re().captures_iter(rest) {
                if let Some(m) = cap.get(0) {
                    attrs_end = attrs_end.max(m.end());
                }
                let value = cap[2].to_string();
                match cap[1].to_ascii_lowercase().as_str() {
                    "tvg-id" => ch.tvg_id = value,
                    "tvg-logo" => ch.logo = value,
                    "group-title" => ch.group = value,
                    _ => {}
                }
            }
            // First comma past the attributes starts the name. Searching from
            // there keeps commas inside quoted values AND inside the name
            // itself ("News, Weather & Sport") intact.
            if let Some(comma_idx) = rest[attrs_end..].find(',') {
                ch.name = rest[attrs_end + comma_idx + 1..].trim().to_string();
            }
            pending = Some(ch);
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let mut ch = pending.take().unwrap_or_default();
        ch.url = line.to_string();
        if ch.name.is_empty() {
            ch.name = ch.url.clone();
        }
        channels.push(ch);
    }

    channels
}

/// Parse a JSON playlist: an array of channel objects.  The original app
/// splits its channel list into one such file per category.
pub fn parse_json_from_str(content: &str) -> Result<Vec<Channel>, PlaylistError> {
    let channels: Vec<Channel> = serde_json::from_str(content)?;
    Ok(channels)
}

/// Load a playlist file, picking the parser from the extension.
pub fn load_playlist(path: &Path) -> Result<Vec<Channel>, PlaylistError> {
    let content = std::fs::read_to_string(path).map_err(|source| PlaylistError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_playlist_str(&content, path.extension().and_then(|e| e.to_str()))
}

/// Parse playlist text given an extension hint ("m3u", "m3u8", "json").
/// Remote playlists fetched by the client reuse this with the URL's suffix.
pub fn parse_playlist_str(
    content: &str,
    extension: Option<&str>,
) -> Result<Vec<Channel>, PlaylistError> {
    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("m3u") | Some("m3u8") => Ok(parse_m3u_from_str(content)),
        Some("json") => parse_json_from_str(content),
        Some(other) => Err(PlaylistError::UnsupportedFormat(other.to_string())),
        // No extension: sniff. EXTM3U header or any EXTINF line means M3U.
        None => {
            let trimmed = content.trim_start();
            if trimmed.starts_with('[') {
                parse_json_from_str(content)
            } else {
                Ok(parse_m3u_from_str(content))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extinf_attributes_and_name() {
        let m3u = r#"#EXTM3U
#EXTINF:-1 tvg-id="globo.br" tvg-logo="http://img/globo.png" group-title="ABERTO",Globo SP
http://example.com/globo.m3u8
#EXTINF:-1,Canal Sem Atributos
http://example.com/plain.m3u8
"#;
        let chans = parse_m3u_from_str(m3u);
        assert_eq!(chans.len(), 2);
        assert_eq!(chans[0].name, "Globo SP");
        assert_eq!(chans[0].group, "ABERTO");
        assert_eq!(chans[0].tvg_id, "globo.br");
        assert_eq!(chans[0].logo, "http://img/globo.png");
        assert_eq!(chans[1].name, "Canal Sem Atributos");
        assert!(chans[1].group.is_empty());
    }

    #[test]
    fn bare_urls_fall_back_to_url_name() {
        let chans = parse_m3u_from_str("http://example.com/stream\n# a comment\n");
        assert_eq!(chans.len(), 1);
        assert_eq!(chans[0].name, "http://example.com/stream");
    }

    #[test]
    fn comma_inside_attribute_does_not_break_name() {
        let m3u = r#"#EXTINF:-1 group-title="News, Sport",BBC One
http://example.com/bbc.m3u8"#;
        let chans = parse_m3u_from_str(m3u);
        assert_eq!(chans[0].name, "BBC One");
        assert_eq!(chans[0].group, "News, Sport");
    }

    #[test]
    fn comma_in_display_name_is_kept() {
        let m3u = r#"#EXTINF:-1 group-title="NOTICIAS",News, Weather & Sport
http://example.com/n.m3u8
#EXTINF:-1,Late Night, Live
http://example.com/l.m3u8"#;
        let chans = parse_m3u_from_str(m3u);
        assert_eq!(chans[0].name, "News, Weather & Sport");
        assert_eq!(chans[0].group, "NOTICIAS");
        // No attributes at all: name starts at the first comma.
        assert_eq!(chans[1].name, "Late Night, Live");
    }

    #[test]
    fn json_category_file() {
        let json = r#"[
            {"name":"Cine A","url":"http://e/a.m3u8","category":"FILMES","logo":"http://img/a.png"},
            {"name":"Cine B","url":"http://e/b.m3u8","category":"FILMES"}
        ]"#;
        let chans = parse_json_from_str(json).unwrap();
        assert_eq!(chans.len(), 2);
        assert_eq!(chans[0].group, "FILMES");
        assert_eq!(chans[1].logo, "");
    }

    #[test]
    fn sniffing_without_extension() {
        let json = r#"[{"name":"A","url":"u"}]"#;
        assert_eq!(parse_playlist_str(json, None).unwrap().len(), 1);
        let m3u = "#EXTM3U\n#EXTINF:-1,A\nhttp://u\n";
        assert_eq!(parse_playlist_str(m3u, None).unwrap().len(), 1);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(matches!(
            parse_playlist_str("", Some("xspf")),
            Err(PlaylistError::UnsupportedFormat(_))
        ));
    }
}
