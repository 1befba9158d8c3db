use std::collections::HashMap;
use std::fs;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, info};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::expand_tilde;
use crate::platform::{
    PageEntry, PlatformError, PrivacyStatus, VideoItem, VideoPage, VideoPlatform, VideoUpdate,
};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3/";
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// `search.list` rejects anything larger.
pub const MAX_SEARCH_RESULTS: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct GoogleClient {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// Either the file Google's console hands out or a flat document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClientSecretsFile {
    Installed { installed: GoogleClient },
    Web { web: GoogleClient },
    Flat(OAuthConfig),
}

impl From<ClientSecretsFile> for OAuthConfig {
    fn from(file: ClientSecretsFile) -> Self {
        let google = match file {
            ClientSecretsFile::Flat(config) => return config,
            ClientSecretsFile::Installed { installed } => installed,
            ClientSecretsFile::Web { web } => web,
        };
        OAuthConfig {
            client_id: google.client_id,
            client_secret: google.client_secret,
            redirect_uri: google
                .redirect_uris
                .into_iter()
                .next()
                .unwrap_or_else(|| OOB_REDIRECT.to_string()),
        }
    }
}

pub fn parse_client_secrets(content: &str) -> Result<OAuthConfig, serde_json::Error> {
    serde_json::from_str::<ClientSecretsFile>(content).map(OAuthConfig::from)
}

pub fn load_client_secrets(config_path: &str) -> anyhow::Result<OAuthConfig> {
    let expanded_path = expand_tilde(config_path);
    let content = fs::read_to_string(&expanded_path)
        .with_context(|| format!("Failed to read OAuth config from '{}'", expanded_path))?;
    parse_client_secrets(&content).context("Failed to parse OAuth config")
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
    snippet: Snippet,
    status: VideoStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    privacy_status: PrivacyStatus,
    publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CategoryListResponse {
    #[serde(default)]
    items: Vec<CategoryResource>,
}

#[derive(Debug, Deserialize)]
struct CategoryResource {
    id: String,
    snippet: Snippet,
}

impl From<VideoResource> for VideoItem {
    fn from(video: VideoResource) -> Self {
        VideoItem {
            id: video.id,
            title: video.snippet.title,
            privacy: video.status.privacy_status,
            publish_at: video.status.publish_at,
        }
    }
}

pub fn update_body(update: &VideoUpdate) -> serde_json::Value {
    json!({
        "id": update.video_id,
        "snippet": {
            "title": update.title,
            "description": update.description,
            "categoryId": update.category_id
        },
        "status": {
            "privacyStatus": update.privacy,
            "publishAt": update.publish_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "selfDeclaredMadeForKids": false
        }
    })
}

pub fn playlist_item_body(playlist_id: &str, video_id: &str) -> serde_json::Value {
    json!({
        "snippet": {
            "playlistId": playlist_id,
            "position": 0,
            "resourceId": {
                "kind": "youtube#video",
                "videoId": video_id
            }
        }
    })
}

pub struct YouTubeClient {
    client: Client,
    base: Url,
    access_token: String,
    oauth_client: BasicClient,
    token_file: String,
}

impl YouTubeClient {
    pub fn new(oauth_config: &OAuthConfig, token_file: &str) -> anyhow::Result<Self> {
        let oauth_client = BasicClient::new(
            ClientId::new(oauth_config.client_id.clone()),
            Some(ClientSecret::new(oauth_config.client_secret.clone())),
            AuthUrl::new(AUTH_URL.to_string())?,
            Some(TokenUrl::new(TOKEN_URL.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(oauth_config.redirect_uri.clone())?);

        Ok(Self {
            client: Client::new(),
            base: Url::parse(API_BASE)?,
            access_token: String::new(),
            oauth_client,
            token_file: expand_tilde(token_file),
        })
    }

    pub async fn authenticate(&mut self) -> anyhow::Result<()> {
        if let Ok(tokens) = self.load_tokens() {
            if let Some(expires_at) = tokens.expires_at {
                if expires_at > Utc::now() + Duration::minutes(5) {
                    self.access_token = tokens.access_token;
                    info!("Loaded credentials from {}", self.token_file);
                    return Ok(());
                }
            }

            if let Some(refresh_token) = tokens.refresh_token {
                info!("Refreshing expired credentials.");
                match self.refresh_token(&refresh_token).await {
                    Ok(new_tokens) => {
                        self.access_token = new_tokens.access_token.clone();
                        self.store_tokens(&new_tokens)?;
                        return Ok(());
                    }
                    Err(e) => debug!("Token refresh failed: {}", e),
                }
            }
        }

        info!("No valid credentials found. Starting OAuth2 flow.");
        self.perform_oauth_flow().await
    }

    async fn perform_oauth_flow(&mut self) -> anyhow::Result<()> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, _csrf_token) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(SCOPE.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        println!("Open this URL in your browser to authenticate:");
        println!("{}", auth_url);
        println!("\nAfter authorization, you'll be redirected to your redirect URI.");
        println!("Copy the 'code' parameter from the redirect URL and paste it here:");

        let mut auth_code = String::new();
        std::io::stdin().read_line(&mut auth_code)?;
        let auth_code = auth_code.trim();

        let token_result = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(auth_code.to_string()))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow!("Token exchange failed: {}", e))?;

        let expires_at = token_result
            .expires_in()
            .map(|duration| Utc::now() + Duration::seconds(duration.as_secs() as i64));

        let tokens = StoredTokens {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
            expires_at,
        };

        self.access_token = tokens.access_token.clone();
        self.store_tokens(&tokens)?;

        info!("Credentials obtained and saved to {}", self.token_file);
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> anyhow::Result<StoredTokens> {
        let token_result = self
            .oauth_client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow!("Token refresh failed: {}", e))?;

        let expires_in = token_result
            .expires_in()
            .map(|duration| duration.as_secs() as i64)
            .unwrap_or(3600);

        Ok(StoredTokens {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: Some(
                token_result
                    .refresh_token()
                    .map(|t| t.secret().clone())
                    .unwrap_or_else(|| refresh_token.to_string()),
            ),
            expires_at: Some(Utc::now() + Duration::seconds(expires_in)),
        })
    }

    fn store_tokens(&self, tokens: &StoredTokens) -> anyhow::Result<()> {
        let tokens_json = serde_json::to_string_pretty(tokens)?;
        fs::write(&self.token_file, tokens_json)
            .with_context(|| format!("Failed to write tokens to '{}'", self.token_file))?;
        Ok(())
    }

    fn load_tokens(&self) -> anyhow::Result<StoredTokens> {
        let tokens_json = fs::read_to_string(&self.token_file)?;
        let tokens: StoredTokens = serde_json::from_str(&tokens_json)?;
        Ok(tokens)
    }

    fn endpoint(&self, path: &str) -> Result<Url, PlatformError> {
        Ok(self.base.join(path)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, PlatformError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await?;
            Err(PlatformError::Api { status, body })
        }
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn list_page(
        &self,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<VideoPage, PlatformError> {
        let max_results = max_results.min(MAX_SEARCH_RESULTS).to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("forMine", "true"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let request = self.client.get(self.endpoint("search")?).query(&query);
        let response: SearchListResponse = self.send(request).await?.json().await?;

        let entries = response
            .items
            .into_iter()
            .filter_map(|item| {
                Some(PageEntry {
                    id: item.id.video_id?,
                    title: item.snippet.title,
                })
            })
            .collect();

        Ok(VideoPage {
            entries,
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    async fn fetch_details(&self, ids: &[String]) -> Result<Vec<VideoItem>, PlatformError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.join(",");
        let request = self
            .client
            .get(self.endpoint("videos")?)
            .query(&[("part", "snippet,status"), ("id", ids.as_str())]);
        let response: VideoListResponse = self.send(request).await?.json().await?;

        Ok(response.items.into_iter().map(VideoItem::from).collect())
    }

    async fn update_video(&self, update: &VideoUpdate) -> Result<(), PlatformError> {
        let request = self
            .client
            .put(self.endpoint("videos")?)
            .query(&[("part", "snippet,status")])
            .json(&update_body(update));
        self.send(request).await?;
        Ok(())
    }

    async fn insert_into_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), PlatformError> {
        let request = self
            .client
            .post(self.endpoint("playlistItems")?)
            .query(&[("part", "snippet")])
            .json(&playlist_item_body(playlist_id, video_id));
        self.send(request).await?;
        Ok(())
    }

    async fn list_categories(
        &self,
        region_code: &str,
    ) -> Result<HashMap<String, String>, PlatformError> {
        debug!("Fetching video categories.");
        let request = self
            .client
            .get(self.endpoint("videoCategories")?)
            .query(&[("part", "snippet"), ("regionCode", region_code)]);
        let response: CategoryListResponse = self.send(request).await?.json().await?;
        debug!("Received {} categories.", response.items.len());

        Ok(response
            .items
            .into_iter()
            .map(|category| (category.snippet.title, category.id))
            .collect())
    }
}
