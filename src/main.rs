//! Main entry point for the storezip CLI application.
//!
//! Packs local media files into a STORE ZIP archive, or lists and tests an
//! existing archive.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;

use storezip::naming::{archive_file_name, sanitize_entry_name};
use storezip::{
    ArchiveStats, Cli, FileMap, LocalFileReader, MediaKind, ReadAt, ZipExtractor,
    create_store_zip_blob,
};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_env("RUST_LOG")
        .init();

    if cli.is_inspect() {
        let path = &cli.files[0];
        let reader = Arc::new(
            LocalFileReader::new(Path::new(path)).with_context(|| format!("cannot open {}", path))?,
        );
        let extractor = ZipExtractor::new(reader);

        if cli.test {
            return test_archive(&extractor, path, &cli).await;
        }
        return list_files(&extractor, cli.verbose).await;
    }

    create_archive(&cli).await
}

/// Read every input, build the archive and write it out.
///
/// Entries keep the order of the command line; directory entries from `-D`
/// come first.
async fn create_archive(cli: &Cli) -> Result<()> {
    let mut files = FileMap::with_capacity(cli.directories.len() + cli.files.len());

    for dir in &cli.directories {
        match files.insert_directory(&sanitize_entry_name(dir)) {
            Some(name) if !cli.is_quiet() => println!("  adding: {}", name),
            Some(_) => {}
            None => bail!("invalid directory name: {:?}", dir),
        }
    }

    for path in &cli.files {
        let data = fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path))?;

        let name = entry_name(path, cli.junk_paths);
        if name.is_empty() {
            bail!("cannot derive an entry name from {:?}", path);
        }

        if !cli.is_quiet() {
            let kind = MediaKind::sniff(&data).map_or("data", |kind| kind.mime_type());
            println!("  adding: {} ({}, {})", name, format_size(data.len() as u64), kind);
        }
        if files.insert(name.clone(), data).is_some() && !cli.is_quiet() {
            eprintln!("warning: {} replaces an earlier file with the same name", name);
        }
    }

    cli.options().validate(&files)?;
    let blob = create_store_zip_blob(&files).await?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| archive_file_name(SystemTime::now()));
    fs::write(&output, blob.bytes())
        .await
        .with_context(|| format!("cannot write {}", output))?;

    if !cli.is_quiet() {
        let stats = ArchiveStats::of(&files);
        println!(
            "{}: {} files, {} directories, {} stored in {}",
            output,
            stats.total_files,
            stats.directories,
            format_size(stats.uncompressed_size),
            format_size(blob.len() as u64)
        );
    }

    Ok(())
}

/// Derive the entry name for an input path.
///
/// With `junk_paths` only the base name is kept. Otherwise the path's normal
/// components are joined with `/`, dropping roots, `.` and `..`.
fn entry_name(path: &str, junk_paths: bool) -> String {
    let path = Path::new(path);
    let name = if junk_paths {
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        path.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    };
    sanitize_entry_name(&name)
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Table with size, method, timestamp and CRC
async fn list_files<R: ReadAt + 'static>(extractor: &ZipExtractor<R>, verbose: bool) -> Result<()> {
    let entries = extractor.list_files().await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>6}  {:>10}  {:>5}  {:>8}  Name",
        "Length", "Method", "Date", "Time", "CRC-32"
    );
    println!("{}", "-".repeat(70));

    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let ts = entry.last_modified;
        let method = match entry.compression_method {
            storezip::zip::CompressionMethod::Stored => "Stored".to_string(),
            storezip::zip::CompressionMethod::Deflate => "Defl".to_string(),
            storezip::zip::CompressionMethod::Unknown(m) => format!("#{}", m),
        };

        println!(
            "{:>10}  {:>6}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            entry.uncompressed_size,
            method,
            ts.year(),
            ts.month(),
            ts.day(),
            ts.hour(),
            ts.minute(),
            entry.crc32,
            entry.file_name
        );

        if !entry.is_directory {
            total_size += entry.uncompressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!("{:>10}  {:>37}  {} files", total_size, "", file_count);

    Ok(())
}

/// Read back every entry and check it against its stored CRC.
async fn test_archive<R: ReadAt + 'static>(
    extractor: &ZipExtractor<R>,
    path: &str,
    cli: &Cli,
) -> Result<()> {
    let checks = extractor.verify_all().await?;
    let failed = checks.iter().filter(|c| !c.is_ok()).count();

    for check in &checks {
        match &check.error {
            None if !cli.is_quiet() => println!("    testing: {:<40} OK", check.file_name),
            None => {}
            Some(reason) => eprintln!("    testing: {:<40} FAILED ({})", check.file_name, reason),
        }
    }

    if failed > 0 {
        bail!("{}: {} of {} entries failed", path, failed, checks.len());
    }
    if !cli.is_quiet() {
        println!("No errors detected in {} ({} entries)", path, checks.len());
    }
    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
