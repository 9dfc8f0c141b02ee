use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from the external identity resolver.
///
/// These cover transport and contract failures only; an unknown handle is a
/// non-valid [`Resolution`], not an error, and is never retried.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("identity lookup transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected resolver status {0}")]
    Status(u16),
}

/// Result of resolving a player handle: whether the handle maps to a real
/// player, and if so its stable canonical identifier and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub valid: bool,
    pub uuid: Option<Uuid>,
    pub name: Option<String>,
}

impl Resolution {
    pub fn valid(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            valid: true,
            uuid: Some(uuid),
            name: Some(name.into()),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            uuid: None,
            name: None,
        }
    }
}

/// External player-identity resolver: maps a human-entered handle to a
/// canonical stable identifier and display name.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, handle: &str) -> Result<Resolution, ResolverError>;
}

/// True if `handle` is syntactically a valid player name: 3 to 16 characters
/// of letters, digits and underscore.
pub fn is_valid_handle(handle: &str) -> bool {
    let handle = handle.to_lowercase();
    (3..=16).contains(&handle.len())
        && handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// True if `uuid` is syntactically a canonical identifier: 32 hex digits,
/// no hyphens.
pub fn is_valid_uuid(uuid: &str) -> bool {
    let uuid = uuid.to_lowercase();
    uuid.len() == 32 && uuid.chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Deserialize)]
struct MojangProfile {
    id: String,
    name: String,
}

/// Identity resolver backed by the Mojang profile API.
pub struct MojangResolver {
    client: reqwest::Client,
    base_url: String,
}

impl Default for MojangResolver {
    fn default() -> Self {
        Self::new("https://api.mojang.com")
    }
}

impl MojangResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for MojangResolver {
    async fn resolve(&self, handle: &str) -> Result<Resolution, ResolverError> {
        if !is_valid_handle(handle) {
            return Ok(Resolution::invalid());
        }
        let url = format!("{}/users/profiles/minecraft/{}", self.base_url, handle);
        let response = self.client.get(&url).send().await?;
        match response.status().as_u16() {
            200 => {
                let profile: MojangProfile = response.json().await?;
                match Uuid::try_parse(&profile.id) {
                    Ok(uuid) => {
                        tracing::debug!(handle, %uuid, name = %profile.name, "resolved player identity");
                        Ok(Resolution::valid(uuid, profile.name))
                    }
                    Err(_) => {
                        tracing::warn!(handle, id = %profile.id, "resolver returned malformed identifier");
                        Ok(Resolution::invalid())
                    }
                }
            }
            // No content / not found: the handle names no player.
            204 | 404 => Ok(Resolution::invalid()),
            status => Err(ResolverError::Status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_validation() {
        assert!(is_valid_handle("Steve"));
        assert!(is_valid_handle("steve_123"));
        assert!(!is_valid_handle("ab"));
        assert!(!is_valid_handle("seventeen_chars__"));
        assert!(!is_valid_handle("bad name"));
        assert!(!is_valid_handle("bäd"));
    }

    #[test]
    fn uuid_validation() {
        assert!(is_valid_uuid("069a79f444e94726a5befca90e38aaf5"));
        assert!(is_valid_uuid("069A79F444E94726A5BEFCA90E38AAF5"));
        assert!(!is_valid_uuid("069a79f4-44e9-4726-a5be-fca90e38aaf5"));
        assert!(!is_valid_uuid("zz9a79f444e94726a5befca90e38aaf5"));
    }

    #[tokio::test]
    async fn syntactically_invalid_handle_short_circuits() {
        let resolver = MojangResolver::default();
        let resolution = resolver.resolve("no spaces here").await.unwrap();
        assert!(!resolution.valid);
    }
}
