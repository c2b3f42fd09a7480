//! build-info.json: the record of what the last successful build installed
//!
//! Built fresh for every build and written wholesale, only on full success.
//! Other tooling compares it with lock.json to detect drift; the build
//! engine itself never reads it back.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lockjson::{Repos, ReposType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRepos {
    #[serde(rename = "type")]
    pub r#type: ReposType,
    pub path: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub repos: Vec<BuildRepos>,
}

impl BuildInfo {
    pub fn from_repos_list(repos_list: &[Repos]) -> Self {
        Self {
            repos: repos_list
                .iter()
                .map(|r| BuildRepos {
                    r#type: r.r#type.clone(),
                    path: r.path.clone(),
                    version: r.version.clone(),
                })
                .collect(),
        }
    }

    /// Replace the file at `path` with this record
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = serde_json::to_vec_pretty(self)?;
        content.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&content)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
