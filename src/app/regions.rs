//! Region resolution for the fan-out.
//!
//! A region specifier comes from `--region` or the settings file. The empty
//! string and the literal `all` select every region in [`ALL_REGIONS`];
//! anything else is split on commas, kept in order, and passed through
//! untouched (no trimming, no deduplication, no validation).

/// Regions queried when the caller asks for "all" (or gives nothing)
pub const ALL_REGIONS: [&str; 17] = [
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "sa-east-1",
];

/// Keyword selecting [`ALL_REGIONS`]
pub const ALL_KEYWORD: &str = "all";

/// Turn a region specifier into the ordered list of regions to query.
///
/// Duplicates are preserved: `"a,b,b"` yields three entries and therefore
/// three region tasks.
pub fn resolve_regions(spec: &str) -> Vec<String> {
    if spec.is_empty() || spec == ALL_KEYWORD {
        return ALL_REGIONS.iter().map(|r| r.to_string()).collect();
    }

    spec.split(',').map(str::to_string).collect()
}
