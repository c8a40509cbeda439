//! DuckDuckGo region codes.
//!
//! The table is fixed at compile time and exposed read-only, both as a
//! lookup and as the `duckduckgo://regions` MCP resource.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// URI of the regions resource
pub const REGIONS_URI: &str = "duckduckgo://regions";

/// Region code DuckDuckGo uses for "no region"
pub const NO_REGION: &str = "wt-wt";

/// Region codes and their human-readable names, in display order
pub static REGION_CODES: &[(&str, &str)] = &[
    ("xa-ar", "Arabia"),
    ("xa-en", "Arabia (en)"),
    ("ar-es", "Argentina"),
    ("au-en", "Australia"),
    ("at-de", "Austria"),
    ("be-fr", "Belgium (fr)"),
    ("be-nl", "Belgium (nl)"),
    ("br-pt", "Brazil"),
    ("bg-bg", "Bulgaria"),
    ("ca-en", "Canada"),
    ("ca-fr", "Canada (fr)"),
    ("ct-ca", "Catalan"),
    ("cl-es", "Chile"),
    ("cn-zh", "China"),
    ("co-es", "Colombia"),
    ("hr-hr", "Croatia"),
    ("cz-cs", "Czech Republic"),
    ("dk-da", "Denmark"),
    ("ee-et", "Estonia"),
    ("fi-fi", "Finland"),
    ("fr-fr", "France"),
    ("de-de", "Germany"),
    ("gr-el", "Greece"),
    ("hk-tzh", "Hong Kong"),
    ("hu-hu", "Hungary"),
    ("in-en", "India"),
    ("id-id", "Indonesia"),
    ("id-en", "Indonesia (en)"),
    ("ie-en", "Ireland"),
    ("il-he", "Israel"),
    ("it-it", "Italy"),
    ("jp-jp", "Japan"),
    ("kr-kr", "Korea"),
    ("lv-lv", "Latvia"),
    ("lt-lt", "Lithuania"),
    ("xl-es", "Latin America"),
    ("my-ms", "Malaysia"),
    ("my-en", "Malaysia (en)"),
    ("mx-es", "Mexico"),
    ("nl-nl", "Netherlands"),
    ("nz-en", "New Zealand"),
    ("no-no", "Norway"),
    ("pe-es", "Peru"),
    ("ph-en", "Philippines"),
    ("ph-tl", "Philippines (tl)"),
    ("pl-pl", "Poland"),
    ("pt-pt", "Portugal"),
    ("ro-ro", "Romania"),
    ("ru-ru", "Russia"),
    ("sg-en", "Singapore"),
    ("sk-sk", "Slovak Republic"),
    ("sl-sl", "Slovenia"),
    ("za-en", "South Africa"),
    ("es-es", "Spain"),
    ("se-sv", "Sweden"),
    ("ch-de", "Switzerland (de)"),
    ("ch-fr", "Switzerland (fr)"),
    ("ch-it", "Switzerland (it)"),
    ("tw-tzh", "Taiwan"),
    ("th-th", "Thailand"),
    ("tr-tr", "Turkey"),
    ("ua-uk", "Ukraine"),
    ("uk-en", "United Kingdom"),
    ("us-en", "United States"),
    ("ue-es", "United States (es)"),
    ("ve-es", "Venezuela"),
    ("vn-vi", "Vietnam"),
    ("wt-wt", "No region"),
];

lazy_static! {
    static ref REGION_INDEX: HashMap<&'static str, &'static str> =
        REGION_CODES.iter().copied().collect();
}

/// A region entry in the resource listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region code passed as the `region` parameter
    pub code: String,
    /// Human-readable name
    pub name: String,
}

/// Body of the `duckduckgo://regions` resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsResource {
    /// Usage note
    pub note: String,
    /// Number of regions listed
    pub count: usize,
    /// The regions
    pub regions: Vec<Region>,
}

/// Human-readable name for a region code
pub fn region_name(code: &str) -> Option<&'static str> {
    REGION_INDEX.get(code).copied()
}

/// Whether the code appears in the region table
pub fn is_known_region(code: &str) -> bool {
    REGION_INDEX.contains_key(code)
}

/// Build the regions resource
pub fn regions_resource() -> RegionsResource {
    RegionsResource {
        note: "Pass one of these codes as the 'region' parameter. Use null to let \
               DuckDuckGo choose a default (worldwide)."
            .to_string(),
        count: REGION_CODES.len(),
        regions: REGION_CODES
            .iter()
            .map(|(code, name)| Region {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}
