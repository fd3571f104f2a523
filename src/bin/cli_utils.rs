use datx::RecordMatch;
use serde_json::json;
use std::net::IpAddr;

/// Format a count with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

pub fn format_qps(qps: f64) -> String {
    if qps >= 1_000_000.0 {
        format!("{:.2}M", qps / 1_000_000.0)
    } else if qps >= 1_000.0 {
        format!("{:.2}K", qps / 1_000.0)
    } else {
        format!("{:.2}", qps)
    }
}

/// JSON object for one query result
pub fn query_result_json(query: &str, addr: IpAddr, found: Option<&RecordMatch>) -> serde_json::Value {
    match found {
        Some(m) => json!({
            "query": query,
            "ip": addr.to_string(),
            "found": true,
            "data": m.text,
            "fields": m.fields(),
            "range_end": m.range_end.to_string(),
        }),
        None => json!({
            "query": query,
            "ip": addr.to_string(),
            "found": false,
        }),
    }
}
