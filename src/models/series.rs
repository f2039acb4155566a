use serde::{Deserialize, Serialize};

use crate::domain::SeriesId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(alias = "TVDB_ID")]
    pub id: SeriesId,

    pub title: String,

    #[serde(default)]
    pub network: Option<String>,

    #[serde(default)]
    pub fanart: Option<String>,
}
