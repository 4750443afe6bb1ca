use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use masquerade_shared::{
    reqwest::{self, StatusCode},
    user_agent,
};
use serde::Deserialize;
use uuid::Uuid;

use super::ResolveError;
use crate::data::{TEXTURES_PROPERTY, TextureBlob};

/// Turns a skin reference (player name or uuid) into a signed texture. One call per cache miss.
pub trait TextureResolver: Send + Sync + 'static {
    fn resolve(&self, key: &str) -> BoxFuture<'static, Result<TextureBlob, ResolveError>>;
}

#[derive(Deserialize)]
struct NameLookupResponse {
    id: String,
}

#[derive(Deserialize)]
struct SessionProperty {
    name: String,
    value: String,
    #[serde(default)]
    signature: Option<String>,
}

#[derive(Deserialize)]
struct SessionProfileResponse {
    #[serde(default)]
    properties: Vec<SessionProperty>,
}

/// Resolves skins through the Mojang API and session server.
#[derive(Clone)]
pub struct MojangTextureResolver {
    http_client: reqwest::Client,
    session_url: String,
    api_url: String,
}

impl MojangTextureResolver {
    pub fn new(session_url: &str, api_url: &str) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent(user_agent(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            session_url: session_url.trim_end_matches('/').to_owned(),
            api_url: api_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn lookup_uuid(&self, name: &str) -> Result<Uuid, ResolveError> {
        let response = self
            .http_client
            .get(format!("{}/users/profiles/minecraft/{name}", self.api_url))
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response.json::<NameLookupResponse>().await.map_err(|e| ResolveError::Malformed(e.to_string()))?;

        Uuid::try_parse(&body.id).map_err(|_| ResolveError::Malformed(format!("invalid uuid: {}", body.id)))
    }

    async fn fetch_texture(&self, uuid: Uuid) -> Result<TextureBlob, ResolveError> {
        let response = self
            .http_client
            .get(format!("{}/session/minecraft/profile/{}?unsigned=false", self.session_url, uuid.simple()))
            .send()
            .await?;

        let response = check_status(response).await?;
        let body = response
            .json::<SessionProfileResponse>()
            .await
            .map_err(|e| ResolveError::Malformed(e.to_string()))?;

        body.properties
            .into_iter()
            .find(|p| p.name == TEXTURES_PROPERTY)
            .map(|p| TextureBlob {
                value: p.value,
                signature: p.signature,
            })
            .ok_or_else(|| ResolveError::Malformed("profile has no textures property".to_owned()))
    }

    pub async fn resolve_reference(&self, reference: &str) -> Result<TextureBlob, ResolveError> {
        let uuid = match Uuid::try_parse(reference) {
            Ok(uuid) => uuid,
            Err(_) if is_valid_player_name(reference) => self.lookup_uuid(reference).await?,
            Err(_) => return Err(ResolveError::NotFound),
        };

        self.fetch_texture(uuid).await
    }
}

/// Player names are 1 to 16 characters out of `[A-Za-z0-9_]`. Anything else can not exist upstream.
fn is_valid_player_name(name: &str) -> bool {
    (1..=16).contains(&name.len()) && name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_')
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ResolveError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
        return Err(ResolveError::NotFound);
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_else(|_| "<no response>".to_owned());
        return Err(ResolveError::Upstream(status, message));
    }

    Ok(response)
}

impl TextureResolver for MojangTextureResolver {
    fn resolve(&self, key: &str) -> BoxFuture<'static, Result<TextureBlob, ResolveError>> {
        let this = self.clone();
        let key = key.to_owned();

        async move { this.resolve_reference(&key).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_names() {
        assert!(is_valid_player_name("Notch"));
        assert!(is_valid_player_name("jeb_"));
        assert!(is_valid_player_name("abcdefghijklmnop"));

        assert!(!is_valid_player_name(""));
        assert!(!is_valid_player_name("abcdefghijklmnopq"));
        assert!(!is_valid_player_name("../session"));
        assert!(!is_valid_player_name("Notch?unsigned=true"));
        assert!(!is_valid_player_name("Notch#x"));
        assert!(!is_valid_player_name("Nötch"));
    }

    #[tokio::test]
    async fn invalid_reference_is_not_requested() {
        // nothing listens here, a request would fail with something other than `NotFound`
        let resolver = MojangTextureResolver::new("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();

        for reference in ["a/b", "x?y", "x#y", "has space"] {
            assert_eq!(resolver.resolve_reference(reference).await.unwrap_err(), ResolveError::NotFound);
        }
    }
}
