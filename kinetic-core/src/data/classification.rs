//! Sector classification metadata: `{"items": [{"symbol", "sector"}]}`.

use serde::Deserialize;

use super::IngestError;
use crate::domain::{Sector, SectorMap};

#[derive(Debug, Deserialize)]
struct ClassificationFile {
    #[serde(default)]
    items: Vec<ClassificationItem>,
}

#[derive(Debug, Deserialize)]
struct ClassificationItem {
    symbol: String,
    #[serde(default)]
    sector: Option<String>,
}

/// Parse the sector metadata payload into a `SectorMap`.
///
/// Missing or unrecognized sector labels map to `Unknown`; they are routed,
/// not rejected.
pub fn parse_sector_json(json: &str) -> Result<SectorMap, IngestError> {
    let file: ClassificationFile =
        serde_json::from_str(json).map_err(|source| IngestError::Json {
            symbol: "<sector metadata>".to_string(),
            source,
        })?;

    let mut map = SectorMap::new();
    for item in file.items {
        let sector = item
            .sector
            .as_deref()
            .map(Sector::from_label)
            .unwrap_or(Sector::Unknown);
        map.insert(&item.symbol, sector);
    }
    Ok(map)
}
