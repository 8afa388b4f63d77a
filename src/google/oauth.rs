use std::fs;
use std::path::Path;

use oauth2::{
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, RefreshToken, Scope, StandardRevocableToken, TokenResponse,
    TokenUrl,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{info, warn};

use crate::config::GoogleOAuth2;
use crate::shared::utils::path::ensure_parent_dir;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";

type GoogleClient = oauth2::Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // Auth URL
    EndpointNotSet, // Device auth
    EndpointNotSet, // Introspection
    EndpointNotSet, // Revocation
    EndpointSet,    // Token URL
>;

pub struct OAuth2Client {
    client: GoogleClient,
    redirect_url: String,
    scopes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

impl Token {
    pub fn from_token_response(response: &BasicTokenResponse) -> Self {
        Token {
            access_token: response.access_token().secret().clone(),
            refresh_token: response.refresh_token().map(|r| r.secret().clone()),
            expires_at: response
                .expires_in()
                .map(|duration| unix_now() + duration.as_secs() as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= unix_now())
    }

    pub fn load(path: &Path) -> anyhow::Result<Option<Token>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        ensure_parent_dir(path)?;
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl OAuth2Client {
    pub fn new(config: &GoogleOAuth2) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_string())?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_string())?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone())?);

        Ok(Self {
            client,
            redirect_url: config.redirect_url.clone(),
            scopes: config.scopes.clone(),
        })
    }

    pub async fn oauth_flow(&self) -> anyhow::Result<Token> {
        let http_client = reqwest::Client::new();

        let (pkce_code_challenge, pkce_code_verifier) = PkceCodeChallenge::new_random_sha256();

        let (authorize_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_code_challenge)
            .url();

        let listener = tokio::net::TcpListener::bind(listen_address(&self.redirect_url)?).await?;
        if let Err(e) = webbrowser::open(authorize_url.as_ref()) {
            warn!(error = %e, "could not open a browser");
        }
        eprintln!("Open this URL to authorise lessonplan:\n{}", authorize_url);

        let (mut stream, _) = listener.accept().await?;

        let mut reader = AsyncBufReader::new(&mut stream);
        let mut redirect_request_line = String::new();

        reader.read_line(&mut redirect_request_line).await?;

        let code = parse_redirect(&redirect_request_line, csrf_state.secret())?;

        let message = "Authorised. You can close this tab.";
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n{}",
            message.len(),
            message
        );
        stream.write_all(response.as_bytes()).await?;

        let token_response = self
            .client
            .exchange_code(code)
            .set_pkce_verifier(pkce_code_verifier)
            .request_async(&http_client)
            .await?;

        Ok(Token::from_token_response(&token_response))
    }

    pub async fn refresh_token(&self, refresh_token: String) -> anyhow::Result<Token> {
        let refresh_token = RefreshToken::new(refresh_token);
        let http_client = reqwest::Client::new();
        let token_response = self
            .client
            .exchange_refresh_token(&refresh_token)
            .request_async(&http_client)
            .await?;

        let mut token = Token::from_token_response(&token_response);
        // Google omits the refresh token on refresh responses.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.secret().clone());
        }
        Ok(token)
    }
}

/// `host:port` the local redirect listener binds to.
fn listen_address(redirect_url: &str) -> anyhow::Result<String> {
    let url = Url::parse(redirect_url)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("redirect URL has no host: {}", redirect_url))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("redirect URL has no port: {}", redirect_url))?;
    Ok(format!("{}:{}", host, port))
}

/// Extracts the authorization code from the redirect's request line after
/// checking its `state` against the one sent with the authorize URL.
fn parse_redirect(request_line: &str, expected_state: &str) -> anyhow::Result<AuthorizationCode> {
    let request_path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("malformed redirect request"))?;
    let url = Url::parse(&format!("http://localhost{}", request_path))?;

    let query_value = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    match query_value("state") {
        Some(state) if state == expected_state => {}
        _ => anyhow::bail!("redirect state does not match the authorization request"),
    }

    query_value("code")
        .map(AuthorizationCode::new)
        .ok_or(anyhow::anyhow!("no code"))
}

/// Returns a usable token, reusing the cached one, refreshing it or running
/// the browser flow as needed. Any new token is written back to `token_path`.
pub async fn authorize(config: &GoogleOAuth2, token_path: &Path) -> anyhow::Result<Token> {
    let oauth2_client = OAuth2Client::new(config)?;

    let token = match Token::load(token_path)? {
        Some(stored) if !stored.is_expired() => return Ok(stored),
        Some(Token {
            refresh_token: Some(refresh),
            ..
        }) => {
            info!("refreshing expired token");
            oauth2_client.refresh_token(refresh).await?
        }
        _ => {
            info!("starting authorisation flow");
            oauth2_client.oauth_flow().await?
        }
    };

    token.save(token_path)?;
    Ok(token)
}
