use anyhow::{Context, Result};
use datx::Database;
use std::path::PathBuf;

use crate::cli_utils::{format_bytes, format_number};

pub fn cmd_inspect(database: PathBuf, json_output: bool) -> Result<()> {
    let db = Database::open(database.clone())
        .with_context(|| format!("Failed to load database: {}", database.display()))?;
    let info = db
        .info()
        .with_context(|| format!("Failed to read database: {}", database.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let fmt_end = |end: Option<std::net::Ipv4Addr>| match end {
        Some(ip) => ip.to_string(),
        None => "-".to_string(),
    };

    println!("Database:          {}", database.display());
    println!("File size:         {}", format_bytes(info.file_size));
    println!("Access:            {}", if info.mapped { "mmap" } else { "read" });
    println!();
    println!("Index:");
    println!("  total_offset:    {}", info.total_offset);
    println!("  Records:         {}", format_number(info.record_count));
    println!("  Buckets in use:  {} / 65,536", format_number(info.populated_buckets));
    println!("  First range end: {}", fmt_end(info.first_range_end));
    println!("  Last range end:  {}", fmt_end(info.last_range_end));
    println!();
    println!("Payload:           {}", format_bytes(info.payload_bytes));

    Ok(())
}
