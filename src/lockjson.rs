//! # Lock File Model
//!
//! This module defines the serde model of `lock.json`, the declarative,
//! already-resolved description of every managed repository and every
//! profile. The build engine only reads it.
//!
//! ```json
//! {
//!   "version": 2,
//!   "current_profile_name": "default",
//!   "repos": [
//!     { "type": "git", "path": "github.com/tyru/caw.vim", "version": "<commit>" }
//!   ],
//!   "profiles": [
//!     { "name": "default", "repos_path": ["github.com/tyru/caw.vim"],
//!       "use_vimrc": true, "use_gvimrc": true }
//!   ]
//! }
//! ```
//!
//! Unknown fields are ignored so that files written by newer tools still load.

use crate::error::{Error, Result};
use crate::path::encode_repos_path;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Kind of a managed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReposType {
    /// A git clone, pinned to a full commit id
    Git,
    /// A plain directory managed by the user
    Static,
    /// Anything else; rejected per repository at install time
    Other(String),
}

impl From<String> for ReposType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "git" => ReposType::Git,
            "static" => ReposType::Static,
            _ => ReposType::Other(s),
        }
    }
}

impl From<ReposType> for String {
    fn from(t: ReposType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ReposType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReposType::Git => f.write_str("git"),
            ReposType::Static => f.write_str("static"),
            ReposType::Other(s) => f.write_str(s),
        }
    }
}

/// One managed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repos {
    #[serde(rename = "type")]
    pub r#type: ReposType,
    pub path: String,
    #[serde(default)]
    pub version: String,
}

/// A named selection of repositories plus startup file flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub repos_path: Vec<String>,
    #[serde(default = "default_true")]
    pub use_vimrc: bool,
    #[serde(default = "default_true")]
    pub use_gvimrc: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockJson {
    #[serde(default)]
    pub version: i64,
    pub current_profile_name: String,
    #[serde(default)]
    pub repos: Vec<Repos>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl LockJson {
    /// Read and validate lock.json at `path`
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::LockFile {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate lock.json content
    pub fn parse(content: &str) -> Result<Self> {
        let lock_json: LockJson = serde_json::from_str(content).map_err(|e| Error::LockFile {
            message: e.to_string(),
        })?;
        lock_json.validate()?;
        Ok(lock_json)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for repos in &self.repos {
            if !seen.insert(repos.path.as_str()) {
                return Err(Error::LockFile {
                    message: format!("duplicate repository '{}'", repos.path),
                });
            }
        }

        for profile in &self.profiles {
            for repos_path in &profile.repos_path {
                if !seen.contains(repos_path.as_str()) {
                    return Err(Error::LockFile {
                        message: format!(
                            "profile '{}' refers to unknown repository '{}'",
                            profile.name, repos_path
                        ),
                    });
                }
            }
            check_destinations(profile)?;
        }

        if self.find_profile(&self.current_profile_name).is_none() {
            return Err(Error::LockFile {
                message: format!(
                    "current profile '{}' does not exist",
                    self.current_profile_name
                ),
            });
        }
        Ok(())
    }

    pub fn find_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The active profile, as named by `current_profile_name`
    pub fn current_profile(&self) -> Result<&Profile> {
        self.find_profile(&self.current_profile_name)
            .ok_or_else(|| Error::Profile {
                name: self.current_profile_name.clone(),
            })
    }

    /// Repositories selected by `profile`, in the profile's order
    pub fn repos_list_by_profile(&self, profile: &Profile) -> Result<Vec<Repos>> {
        check_destinations(profile)?;
        profile
            .repos_path
            .iter()
            .map(|repos_path| {
                self.repos
                    .iter()
                    .find(|r| &r.path == repos_path)
                    .cloned()
                    .ok_or_else(|| Error::LockFile {
                        message: format!("repository '{}' is not in lock.json", repos_path),
                    })
            })
            .collect()
    }
}

/// Every repository of a profile must own its destination directory
fn check_destinations(profile: &Profile) -> Result<()> {
    let mut owners: HashMap<String, &str> = HashMap::new();
    for repos_path in &profile.repos_path {
        let name = encode_repos_path(repos_path);
        if let Some(other) = owners.insert(name.clone(), repos_path) {
            return Err(Error::LockFile {
                message: format!(
                    "profile '{}': repositories '{}' and '{}' share destination '{}'",
                    profile.name, other, repos_path, name
                ),
            });
        }
    }
    Ok(())
}
