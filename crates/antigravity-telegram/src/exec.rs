//! Local capabilities behind /run, /ls and /cat.
//!
//! Every failure is reported inline as the command's output; nothing here
//! returns an error to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{error, info};

/// Default wall-clock limit for /run.
pub const SHELL_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum characters of command output or file content shown.
pub const OUTPUT_LIMIT: usize = 3000;

/// Wall-clock limit for reading a file in /cat.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Bytes read for /cat: four per shown character, plus one more character
/// to detect truncation.
const READ_LIMIT_BYTES: u64 = (OUTPUT_LIMIT as u64 + 1) * 4;

/// Hidden entries that /ls still shows.
const VISIBLE_DOTFILES: &[&str] = &[".env.example"];

/// Run `command` through the platform shell in `cwd`.
///
/// Output is stdout followed by stderr, trimmed and cut to
/// [`OUTPUT_LIMIT`] characters, under a ✅ or `❌ (exit N)` header.
pub async fn run_shell(command: &str, cwd: &Path, timeout: Duration) -> String {
    info!(command = %command, cwd = %cwd.display(), "Executing shell command");

    let mut cmd = shell_command(command);
    cmd.current_dir(cwd).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            error!(command = %command, error = %e, "Shell exec error");
            return format!("⚠️ Error: {e}");
        }
        Err(_) => return "⏰ Command timed out.".to_string(),
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    let status = if output.status.success() {
        "✅".to_string()
    } else {
        format!("❌ (exit {})", output.status.code().unwrap_or(-1))
    };

    format!(
        "{status}\n```\n{}\n```",
        truncate_chars(combined.trim(), OUTPUT_LIMIT)
    )
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// List the directory `path` under `root`.
pub async fn list_dir(root: &Path, path: &str) -> String {
    let path = if path.trim().is_empty() { "." } else { path.trim() };
    let full = resolve(root, path);

    let mut reader = match tokio::fs::read_dir(&full).await {
        Ok(reader) => reader,
        Err(e) => return format!("⚠️ Error: {e}"),
    };

    let mut entries = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') && !VISIBLE_DOTFILES.contains(&name.as_str()) {
                    continue;
                }
                // Follows symlinks, unlike DirEntry::file_type.
                let is_dir = tokio::fs::metadata(entry.path())
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                entries.push((name, is_dir));
            }
            Ok(None) => break,
            Err(e) => return format!("⚠️ Error: {e}"),
        }
    }
    entries.sort();

    let lines: Vec<String> = entries
        .iter()
        .map(|(name, is_dir)| format!("  {} {name}", if *is_dir { "📁" } else { "📄" }))
        .collect();

    format!("📂 `{path}`\n{}", lines.join("\n"))
}

/// Read the file at `path`, relative to `root` unless absolute.
///
/// Only regular files are read, and at most enough bytes to fill
/// [`OUTPUT_LIMIT`] characters.
pub async fn read_file(root: &Path, path: &str) -> String {
    let full = resolve(root, path.trim());

    match tokio::fs::metadata(&full).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return format!("⚠️ Not a regular file: `{}`", full.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return format!("⚠️ File not found: `{}`", full.display());
        }
        Err(e) => return format!("⚠️ Error: {e}"),
    }

    let read = read_prefix(&full, READ_LIMIT_BYTES);
    let bytes = match tokio::time::timeout(READ_TIMEOUT, read).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return format!("⚠️ Error: {e}"),
        Err(_) => return "⏰ Reading the file timed out.".to_string(),
    };

    let content = String::from_utf8_lossy(&bytes);
    let content = if content.chars().count() > OUTPUT_LIMIT {
        format!("{}\n... (truncated)", truncate_chars(&content, OUTPUT_LIMIT))
    } else {
        content.into_owned()
    };

    let name = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| full.display().to_string());

    format!("📄 `{name}`\n```\n{content}\n```")
}

async fn read_prefix(path: &Path, limit: u64) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes).await?;
    Ok(bytes)
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
