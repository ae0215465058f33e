use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use crate::app::{AppContext, FeedfsError, Result};
use crate::domain::Entry;
use crate::projection::snapshot::join_path;
use crate::projection::Snapshot;

pub fn print_tree(ctx: &AppContext) -> Result<()> {
    let snapshot = ctx.projection.snapshot();
    print!("{}", render_tree(&snapshot));

    for failure in snapshot.failures() {
        eprintln!("  ! {} - {}", failure.url, failure.reason);
    }
    Ok(())
}

/// Every entry of `snapshot`, depth first, one per line with its inode.
pub fn render_tree(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    if let Some(root) = snapshot.lookup("/") {
        let _ = writeln!(out, "{:>6}  /", root.inode);
    }
    render_children(snapshot, "/", 1, &mut out);
    out
}

fn render_children(snapshot: &Snapshot, path: &str, depth: usize, out: &mut String) {
    let Some(children) = snapshot.list_children(path) else {
        return;
    };

    for child in children {
        let _ = writeln!(
            out,
            "{:>6}  {}{}{}",
            child.inode,
            "  ".repeat(depth),
            child.name,
            if child.is_directory { "/" } else { "" }
        );
        if child.is_directory {
            render_children(snapshot, &join_path(path, &child.name), depth + 1, out);
        }
    }
}

pub async fn list(ctx: &AppContext, path: &str) -> Result<()> {
    let children = ctx.projection.list_children(path).await?;

    if children.is_empty() {
        println!("Empty directory");
        return Ok(());
    }

    print!("{}", format_listing(&children));
    Ok(())
}

/// `ls -l` style: type, inode, size, modification time and name.
pub fn format_listing(children: &[Arc<Entry>]) -> String {
    let mut out = String::new();
    for child in children {
        let _ = writeln!(
            out,
            "{} {:>6} {:>8}  {}  {}",
            if child.is_directory { 'd' } else { '-' },
            child.inode,
            child.size(),
            child.timestamp.format("%Y-%m-%d %H:%M"),
            child.name
        );
    }
    out
}

pub fn cat(ctx: &AppContext, path: &str, offset: u64, length: Option<usize>) -> Result<()> {
    let entry = ctx.projection.lookup(path)?;
    if entry.is_directory {
        return Err(FeedfsError::Other(format!("Is a directory: {}", path)));
    }

    let bytes = ctx
        .projection
        .read_range(path, offset, length.unwrap_or(usize::MAX))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

pub fn stat(ctx: &AppContext, path: &str) -> Result<()> {
    let entry = ctx.projection.lookup(path)?;
    print!("{}", format_stat(path, &entry));
    Ok(())
}

pub fn format_stat(path: &str, entry: &Entry) -> String {
    let attributes = entry.attributes();
    let mut out = String::new();

    let _ = writeln!(out, "    Path: {}", path);
    let _ = writeln!(out, "   Inode: {}", attributes.inode);
    let _ = writeln!(
        out,
        "    Type: {}",
        if attributes.is_directory { "directory" } else { "file" }
    );
    let _ = writeln!(out, "    Size: {}", attributes.size);
    let _ = writeln!(out, "    Mode: {:o}", attributes.mode);
    let _ = writeln!(out, "Modified: {}", attributes.timestamp.to_rfc3339());
    if let Some(source) = &entry.source_feed {
        let _ = writeln!(out, "    Feed: {}", source.url);
    }
    out
}

pub fn clear_cache(ctx: &AppContext) -> Result<()> {
    let removed = ctx.cache.clear()?;
    println!("Removed {} cached feeds", removed);
    Ok(())
}
