use anyhow::{Context, Result};
use datx::Database;
use std::io::{self, BufRead};
use std::path::PathBuf;

use crate::cli_utils::query_result_json;

/// Expand "-" into one query per non-empty stdin line
fn collect_queries(queries: Vec<String>) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(queries.len());
    for query in queries {
        if query == "-" {
            for line in io::stdin().lock().lines() {
                let line = line.context("Failed to read queries from stdin")?;
                let line = line.trim();
                if !line.is_empty() {
                    out.push(line.to_string());
                }
            }
        } else {
            out.push(query);
        }
    }
    Ok(out)
}

pub fn cmd_query(database: PathBuf, queries: Vec<String>, json: bool, quiet: bool) -> Result<()> {
    // Load database using fluent API; eager so a bad file fails before any query
    let db = Database::from(database.clone())
        .eager()
        .open()
        .with_context(|| format!("Failed to load database: {}", database.display()))?;

    let queries = collect_queries(queries)?;
    let mut all_found = true;
    let mut results = Vec::new();

    for query in &queries {
        // Hostnames go through the resolver, literals parse directly
        let addr = db
            .resolve(query)
            .with_context(|| format!("Query failed for: {}", query))?;
        let found = db
            .lookup_ip(addr)
            .with_context(|| format!("Query failed for: {}", query))?;

        // Determine if match was found
        all_found &= found.is_some();

        if quiet {
            continue;
        }

        // Output results
        if json {
            results.push(query_result_json(query, addr, found.as_ref()));
        } else {
            match found {
                Some(m) => println!("{}\t{}", query, m.text),
                None => println!("{}\t(not found)", query),
            }
        }
    }

    if json && !quiet {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Exit with appropriate code
    std::process::exit(if all_found { 0 } else { 1 });
}
