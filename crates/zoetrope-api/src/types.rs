use serde::{Deserialize, Serialize};

/// Video metadata as served by `GET /videos/{id}`.
///
/// Wire format is camelCase; fields beyond these are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub upload_username: String,
    #[serde(default)]
    pub views: u64,
}
