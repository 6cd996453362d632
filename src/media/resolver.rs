use super::mime::{self, MimeType};
use super::{ContentStore, MediaItem};
use crate::models::MediaSettings;
use crate::Result;
use base64::Engine as _;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const PLACEHOLDER: &str = "[Image]";

/// One embedded media occurrence in note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReference {
    pub target: String,
    pub alt_text: Option<String>,
    /// Byte range of the whole embed syntax in the source text.
    pub span: Range<usize>,
}

impl EmbedReference {
    pub fn is_remote(&self) -> bool {
        is_remote(&self.target)
    }

    /// Whether the target names a media file rather than, say, another note.
    pub fn is_media(&self, settings: &MediaSettings) -> bool {
        mime::extension(&self.target).is_some_and(|ext| {
            MimeType::from_known_extension(ext).is_some() || settings.accepts_extension(ext)
        })
    }
}

fn is_remote(target: &str) -> bool {
    let target = target.trim_start().to_ascii_lowercase();
    target.starts_with("http://") || target.starts_with("https://")
}

fn wiki_embed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"!\[\[([^\]|]+)(?:\|([^\]]*))?\]\]").expect("valid wiki embed pattern")
    })
}

fn markdown_embed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"!\[([^\]]*)\]\(\s*(?:<([^>]+)>|([^)\s]+))(?:\s+"[^"]*")?\s*\)"#)
            .expect("valid markdown embed pattern")
    })
}

/// `![[img.png|300]]` and `![[img.png|300x200]]` set a display size, not alt text.
fn is_display_size(s: &str) -> bool {
    !s.is_empty()
        && s.split('x')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Finds wiki (`![[...]]`) and markdown (`![alt](...)`) embeds in text order.
pub fn find_embeds(text: &str) -> Vec<EmbedReference> {
    let mut embeds = Vec::new();

    for caps in wiki_embed().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let raw_target = caps.get(1).map_or("", |m| m.as_str());
        let target = raw_target.split('#').next().unwrap_or(raw_target).trim();
        let alt_text = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|alt| !is_display_size(alt))
            .and_then(non_empty);

        embeds.push(EmbedReference {
            target: target.to_string(),
            alt_text,
            span: whole.range(),
        });
    }

    for caps in markdown_embed().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let raw_target = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str().trim());
        let target = urlencoding::decode(raw_target)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw_target.to_string());

        embeds.push(EmbedReference {
            target,
            alt_text: caps.get(1).and_then(|m| non_empty(m.as_str())),
            span: whole.range(),
        });
    }

    embeds.sort_by_key(|e| e.span.start);

    // A wiki embed can sit inside a markdown target; keep the outer match.
    let mut end = 0;
    embeds.retain(|e| {
        if e.span.start < end {
            debug!("Ignoring embed nested in another embed: {}", e.target);
            return false;
        }
        end = e.span.end;
        true
    });
    embeds
}

/// Replaces every media embed with its alt text, or a placeholder when it
/// has none. Embeds of other notes are left as written.
pub fn strip_media_embeds(text: &str, settings: &MediaSettings) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for embed in find_embeds(text).into_iter().filter(|e| e.is_media(settings)) {
        output.push_str(&text[cursor..embed.span.start]);
        output.push_str(embed.alt_text.as_deref().unwrap_or(PLACEHOLDER));
        cursor = embed.span.end;
    }

    output.push_str(&text[cursor..]);
    output
}

/// Resolves and encodes every usable media embed in `text`, in order.
///
/// References that are remote, unsupported, missing, oversized, or
/// unreadable are skipped with a warning.
pub async fn resolve_media(
    store: &dyn ContentStore,
    text: &str,
    settings: &MediaSettings,
) -> Vec<MediaItem> {
    if !settings.enabled {
        debug!("Media attachments disabled, skipping embed scan");
        return Vec::new();
    }

    let embeds = find_embeds(text);
    let mut items = Vec::with_capacity(embeds.len());

    for embed in embeds {
        if embed.is_remote() {
            warn!("Skipping remote media reference: {}", embed.target);
            continue;
        }

        if let Some(mut item) = load_media(store, &embed.target, settings, false).await {
            item.alt_text = embed.alt_text;
            items.push(item);
        }
    }

    info!("Resolved {} media attachment(s)", items.len());
    items
}

/// Resolves one explicitly named file for standalone-file generation.
pub async fn resolve_file(
    store: &dyn ContentStore,
    path: &str,
    settings: &MediaSettings,
) -> Option<MediaItem> {
    let path = normalize(path);
    if is_remote(&path) {
        warn!("Skipping remote file: {}", path);
        return None;
    }

    load_media(store, &path, settings, true).await
}

async fn load_media(
    store: &dyn ContentStore,
    reference: &str,
    settings: &MediaSettings,
    exact: bool,
) -> Option<MediaItem> {
    match mime::extension(reference) {
        None => {
            debug!("Skipping embed without a file extension: {}", reference);
            return None;
        }
        Some(ext) if !settings.accepts_extension(ext) => {
            warn!(
                "Skipping {}: format '{}' is not in the supported list {:?}",
                reference, ext, settings.supported_formats
            );
            return None;
        }
        Some(_) => {}
    }

    let resolved = if exact {
        let path = normalize(reference);
        match store.file_size(&path).await {
            Ok(Some(_)) => Ok(Some(path)),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        }
    } else {
        resolve_path(store, reference).await
    };

    let path = match resolved {
        Ok(Some(path)) => path,
        Ok(None) => {
            warn!("Skipping {}: no matching file in the vault", reference);
            return None;
        }
        Err(e) => {
            warn!("Skipping {}: lookup failed: {}", reference, e);
            return None;
        }
    };

    let size = match store.file_size(&path).await {
        Ok(Some(size)) => size,
        Ok(None) => {
            warn!("Skipping {}: file disappeared during resolution", path);
            return None;
        }
        Err(e) => {
            warn!("Skipping {}: could not read size: {}", path, e);
            return None;
        }
    };

    let limit = settings.max_size_kb.saturating_mul(1024);
    if size > limit {
        warn!(
            "Skipping {}: {} KB exceeds the {} KB limit",
            path,
            size / 1024,
            settings.max_size_kb
        );
        return None;
    }

    let bytes = match store.read_file(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Skipping {}: read failed: {}", path, e);
            return None;
        }
    };

    let mime_type = MimeType::from_path(&path);
    if let Some(sniffed) = mime::sniff(&bytes) {
        if sniffed != mime_type {
            warn!(
                "{} looks like {} but its extension says {}; sending as {}",
                path, sniffed, mime_type, mime_type
            );
        }
    }

    info!(
        "Attaching {} ({}, {} bytes)",
        path,
        mime_type,
        bytes.len()
    );

    Some(MediaItem {
        source_path: path,
        encoded_content: base64::engine::general_purpose::STANDARD.encode(&bytes),
        mime_type,
        alt_text: None,
    })
}

fn normalize(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(&path);
    path.trim_start_matches('/').to_string()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Maps a possibly partial reference to a vault path.
///
/// Tries the exact path, then a filename-only match, then a path-suffix
/// match, then a basename match. Ties within a stage go to the
/// lexicographically smallest path.
pub async fn resolve_path(store: &dyn ContentStore, reference: &str) -> Result<Option<String>> {
    let reference = normalize(reference);
    if reference.is_empty() {
        return Ok(None);
    }

    if store.file_size(&reference).await?.is_some() {
        return Ok(Some(reference));
    }

    let files = store.list_files().await?;
    let file_name = basename(&reference);
    let suffix = format!("/{}", reference);

    let stages: [(&str, Vec<&String>); 3] = [
        (
            "filename",
            files.iter().filter(|f| basename(f) == reference).collect(),
        ),
        (
            "path suffix",
            files.iter().filter(|f| f.ends_with(&suffix)).collect(),
        ),
        (
            "basename",
            files.iter().filter(|f| basename(f) == file_name).collect(),
        ),
    ];

    for (stage, mut candidates) in stages {
        if candidates.is_empty() {
            continue;
        }

        candidates.sort();
        let chosen = candidates[0].clone();
        if candidates.len() > 1 {
            warn!(
                "Ambiguous media reference '{}': {} files match by {} ({:?}); using {}",
                reference,
                candidates.len(),
                stage,
                candidates,
                chosen
            );
        } else {
            debug!("Resolved '{}' to '{}' by {} match", reference, chosen, stage);
        }
        return Ok(Some(chosen));
    }

    Ok(None)
}
