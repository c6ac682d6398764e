use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Builder;

const DEFAULT_USERNAME: &str = "Player";
const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";
const DEFAULT_USER_TYPE: &str = "mojang";

/// Identity values substituted into the launch arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchAccountProfile {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub user_type: String,
}

impl Default for LaunchAccountProfile {
    fn default() -> Self {
        Self::offline(DEFAULT_USERNAME)
    }
}

impl LaunchAccountProfile {
    /// Offline profile: the UUID is derived from the name, so it is stable
    /// across launches and machines.
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => DEFAULT_USERNAME,
            name => name,
        };
        Self {
            username: username.to_string(),
            uuid: offline_uuid(username),
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            user_type: DEFAULT_USER_TYPE.into(),
        }
    }

    /// Override the access token (keeps the offline UUID unless one is set later).
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Fill blank fields with offline defaults.
    pub fn sanitized(mut self) -> Self {
        if self.username.trim().is_empty() {
            self.username = DEFAULT_USERNAME.into();
        }
        if self.uuid.trim().is_empty() {
            self.uuid = offline_uuid(&self.username);
        }
        if self.access_token.trim().is_empty() {
            self.access_token = OFFLINE_ACCESS_TOKEN.into();
        }
        if self.user_type.trim().is_empty() {
            self.user_type = DEFAULT_USER_TYPE.into();
        }
        self
    }
}

/// Name-based (version 3) UUID over `OfflinePlayer:<name>`, hyphenated.
pub fn offline_uuid(username: &str) -> String {
    let digest: [u8; 16] = Md5::digest(format!("OfflinePlayer:{}", username).as_bytes()).into();
    Builder::from_md5_bytes(digest).into_uuid().to_string()
}
