//! Value parsers for CLI arguments.

use imgsplit_core::{OutputFormat, SplitPlan};

/// Parse a grid in format "RxC" (also "R,C")
///
/// Both dimensions must be at least 1.
pub fn parse_grid(value: &str) -> Result<SplitPlan, String> {
    SplitPlan::parse(value).ok_or_else(|| {
        format!(
            "Grid must be in format ROWSxCOLS with both at least 1 (e.g., 2x2), got: {}",
            value
        )
    })
}

/// Parse an output extension, or `default` to keep each source's own format
pub fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(value)
        .ok_or_else(|| "Format must be an extension such as png, or 'default'".to_string())
}

/// Parse a worker count; zero is rejected
pub fn parse_threads(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("Thread count must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid thread count: {}", value)),
    }
}
