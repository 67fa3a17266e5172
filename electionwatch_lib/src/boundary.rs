//! Boundary slug handling for map lookups.
//!
//! A contest's `boundary` column names the shapes to draw for it, as slugs
//! in the boundary service (`<set>/<id>`, e.g.
//! `minor-civil-divisions-2010/2704904798`). Two wrinkles live here:
//! the column may hold several comma-joined slugs, and some cities straddle
//! county lines, so one minor civil division resolves to shapes in each
//! county it touches. The straddlers are data, not logic: they ship as a
//! bundled table rather than code.

use std::sync::OnceLock;

/// Boundary sets the dashboard queries for point lookups.
pub const BOUNDARY_SETS: &[&str] = &[
    "counties-2010",
    "county-commissioner-districts-2012",
    "minneapolis-parks-and-recreation-districts-2014",
    "minor-civil-divisions-2010",
    "school-districts-2013",
    "wards-2012",
];

const MULTI_MCD_JSON: &str = include_str!("../resources/multi_mcd.json");

static MULTI_MCD: OnceLock<Vec<Vec<String>>> = OnceLock::new();

fn multi_mcd_groups() -> &'static [Vec<String>] {
    MULTI_MCD.get_or_init(|| match serde_json::from_str(MULTI_MCD_JSON) {
        Ok(groups) => groups,
        Err(e) => {
            tracing::error!("Failed to parse the bundled multi-MCD table: {}", e);
            Vec::new()
        }
    })
}

/// Splits a contest's `boundary` column into individual slugs.
pub fn boundary_slugs(boundary: &str) -> Vec<String> {
    boundary
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expands a slug to every sibling slug of its jurisdiction.
///
/// For a city that straddles county lines, each county's minor civil
/// division is a separate shape; matching any one of them means the map
/// needs all of them. Slugs outside the table come back as themselves.
pub fn expand_mcd_slug(slug: &str) -> Vec<String> {
    for group in multi_mcd_groups() {
        if group.iter().any(|s| s == slug) {
            return group.clone();
        }
    }
    vec![slug.to_string()]
}

/// Full shape list for a contest's `boundary` column: split, expand each
/// slug, and drop duplicates while keeping first-seen order.
pub fn expand_boundaries(boundary: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for slug in boundary_slugs(boundary) {
        for expanded in expand_mcd_slug(&slug) {
            if !out.contains(&expanded) {
                out.push(expanded);
            }
        }
    }
    out
}
