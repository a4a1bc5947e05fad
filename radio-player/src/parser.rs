//! Playlist Parser (C3) — resolves `@import` lines, per-line/global `|k=v;flag`
//! arguments, and glob expansion.

use crate::error::{PlayerError, PlaylistError, Result};
use radio_common::Track;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Parsed result: the flattened track list plus the accumulated global
/// arguments (the last `|k=v` line wins per key, matching the original).
#[derive(Debug, Clone, Default)]
pub struct ParsedPlaylist {
    pub tracks: Vec<Track>,
    pub global_args: HashMap<String, String>,
}

/// Parse `path`, following `@import` lines depth-first. `visited` guards
/// against import cycles; missing imports are logged and skipped rather than
/// treated as fatal.
pub fn parse_playlist(path: &Path) -> Result<ParsedPlaylist> {
    let mut result = ParsedPlaylist::default();
    let mut visited = HashSet::new();
    parse_into(path, &mut result, &mut visited)?;
    Ok(result)
}

fn parse_into(
    path: &Path,
    result: &mut ParsedPlaylist,
    visited: &mut HashSet<PathBuf>,
) -> Result<()> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        tracing::warn!(path = %path.display(), "import cycle detected, skipping");
        return Ok(());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|_| PlaylistError::NotFound(path.to_path_buf()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(import_path) = line.strip_prefix('@') {
            let import_path = resolve_path(base_dir, import_path.trim());
            if !import_path.exists() {
                tracing::warn!(path = %import_path.display(), "imported playlist not found, skipping");
                continue;
            }
            parse_into(&import_path, result, visited)?;
            continue;
        }

        if let Some(rest) = line.strip_prefix('|') {
            let (_, kv) = parse_args(rest);
            result.global_args.extend(kv);
            continue;
        }

        parse_entry_line(line, base_dir, path, lineno, result)?;
    }

    Ok(())
}

fn parse_entry_line(
    line: &str,
    base_dir: &Path,
    playlist_path: &Path,
    lineno: usize,
    result: &mut ParsedPlaylist,
) -> Result<()> {
    let (pattern, args_str) = match line.find('|') {
        Some(idx) => (&line[..idx], &line[idx + 1..]),
        None => (line, ""),
    };
    let (flags, mut kv) = parse_args(args_str);
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(PlayerError::Playlist(PlaylistError::Parse {
            path: playlist_path.to_path_buf(),
            reason: format!("line {}: missing path", lineno + 1),
        }));
    }

    let resolved_pattern = resolve_path(base_dir, pattern);
    let entries = expand_glob(&resolved_pattern, playlist_path, lineno)?;

    let official = !flags.contains("no_official") && kv.get("official").map_or(true, |v| is_truthy(v));
    let fade_in: f64 = kv.get("fade_in").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let fade_out: f64 = kv.get("fade_out").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let offset: f64 = kv.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0.0);

    // Bare flags (e.g. `no_jingle`) carry no value of their own; fold them
    // into the args map so `Track::flag` can see them downstream.
    for flag in &flags {
        kv.entry(flag.clone()).or_insert_with(|| "1".to_string());
    }

    for entry_path in entries {
        result.tracks.push(Track::new(
            entry_path,
            fade_in,
            fade_out,
            official,
            kv.clone(),
            offset,
        ));
    }

    Ok(())
}

fn expand_glob(pattern: &Path, playlist_path: &Path, lineno: usize) -> Result<Vec<PathBuf>> {
    let pattern_str = pattern.to_string_lossy();
    if !has_glob_chars(&pattern_str) {
        return Ok(vec![pattern.to_path_buf()]);
    }

    let mut entries = Vec::new();
    let paths = glob::glob(&pattern_str).map_err(|e| {
        PlayerError::Playlist(PlaylistError::Parse {
            path: playlist_path.to_path_buf(),
            reason: format!("line {}: bad glob pattern: {e}", lineno + 1),
        })
    })?;
    for entry in paths {
        if let Ok(found) = entry {
            if found.is_file() {
                entries.push(found);
            }
        }
    }
    entries.sort();
    Ok(entries)
}

fn has_glob_chars(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

fn resolve_path(base_dir: &Path, raw: &str) -> PathBuf {
    let candidate = PathBuf::from(raw);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}

/// Strips a `;` or `#` comment, honoring neither inside the value (the
/// original's grammar has no quoting).
fn strip_comment(line: &str) -> &str {
    let semi = line.find(';');
    let hash = line.find('#');
    match (semi, hash) {
        (Some(s), Some(h)) => &line[..s.min(h)],
        (Some(s), None) => &line[..s],
        (None, Some(h)) => &line[..h],
        (None, None) => line,
    }
}

/// Parses a `k=v;flag;k2=v2` fragment into (bare flags, key/value pairs).
fn parse_args(s: &str) -> (HashSet<String>, HashMap<String, String>) {
    let mut flags = HashSet::new();
    let mut kv = HashMap::new();
    for part in s.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((k, v)) => {
                kv.insert(k.trim().to_string(), v.trim().to_string());
            }
            None => {
                flags.insert(part.to_string());
            }
        }
    }
    (flags, kv)
}

fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "0" | "false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_simple_entries_and_global_args() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "a.mp3", "");
        write_temp(&dir, "b.mp3", "");
        let playlist = write_temp(
            &dir,
            "main.playlist",
            "|crossfade=3\na.mp3|fade_in=1.0\nb.mp3|official=0\n",
        );

        let parsed = parse_playlist(&playlist).unwrap();
        assert_eq!(parsed.global_args.get("crossfade"), Some(&"3".to_string()));
        assert_eq!(parsed.tracks.len(), 2);
        assert_eq!(parsed.tracks[0].fade_in(), 1.0);
        assert!(!parsed.tracks[1].official());
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "a.mp3", "");
        let playlist = write_temp(&dir, "main.playlist", "; a comment\n\n# also a comment\na.mp3\n");
        let parsed = parse_playlist(&playlist).unwrap();
        assert_eq!(parsed.tracks.len(), 1);
    }

    #[test]
    fn imports_are_followed_and_cycles_are_safe() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "a.mp3", "");
        write_temp(&dir, "b.playlist", "@main.playlist\na.mp3\n");
        let main = write_temp(&dir, "main.playlist", "@b.playlist\na.mp3\n");
        let parsed = parse_playlist(&main).unwrap();
        // a.mp3 appears from b.playlist's entry and main's own entry; the
        // cycle back into main.playlist is skipped the second time.
        assert_eq!(parsed.tracks.len(), 2);
    }

    #[test]
    fn missing_playlist_file_is_an_error() {
        let err = parse_playlist(Path::new("/nonexistent/x.playlist")).unwrap_err();
        assert!(matches!(err, PlayerError::Playlist(PlaylistError::NotFound(_))));
    }

    #[test]
    fn missing_import_is_logged_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "a.mp3", "");
        let main = write_temp(&dir, "main.playlist", "@missing.playlist\na.mp3\n");
        let parsed = parse_playlist(&main).unwrap();
        assert_eq!(parsed.tracks.len(), 1);
    }

    #[test]
    fn bare_flags_reach_the_track_as_truthy_args() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(&dir, "jingle.mp3", "");
        let playlist = write_temp(&dir, "main.playlist", "jingle.mp3|crossfade=3;no_jingle\n");
        let parsed = parse_playlist(&playlist).unwrap();
        assert!(parsed.tracks[0].flag("no_jingle"));
    }
}
