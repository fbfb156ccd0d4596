//! Identity lookup after a successful code exchange

use serde::Deserialize;

use crate::error::OAuthError;
use crate::platforms::Endpoints;
use crate::types::Platform;

/// The external account a token belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformProfile {
    pub platform_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
    /// Page-scoped token that should be stored instead of the user token
    pub access_token: Option<String>,
}

type ProfileResult = std::result::Result<PlatformProfile, OAuthError>;

async fn get_json(
    platform: Platform,
    request: reqwest::RequestBuilder,
) -> std::result::Result<serde_json::Value, OAuthError> {
    let response = request.send().await.map_err(|e| {
        OAuthError::Profile(format!("{} request failed: {}", platform.display_name(), e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let mapped = crate::platforms::map_api_error(platform, status.as_u16(), &body);
        return Err(OAuthError::Profile(mapped.detail().to_string()));
    }

    response.json().await.map_err(|e| {
        OAuthError::Profile(format!(
            "{} returned an unreadable profile: {}",
            platform.display_name(),
            e
        ))
    })
}

fn parse<T: serde::de::DeserializeOwned>(
    platform: Platform,
    value: serde_json::Value,
) -> std::result::Result<T, OAuthError> {
    serde_json::from_value(value).map_err(|e| {
        OAuthError::Profile(format!(
            "Unexpected {} profile response: {}",
            platform.display_name(),
            e
        ))
    })
}

#[derive(Deserialize)]
struct LinkedInUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

pub(crate) async fn linkedin(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    access_token: &str,
) -> ProfileResult {
    let value = get_json(
        Platform::LinkedIn,
        http.get(endpoints.api("/v2/userinfo"))
            .bearer_auth(access_token),
    )
    .await?;
    let info: LinkedInUserInfo = parse(Platform::LinkedIn, value)?;

    Ok(PlatformProfile {
        name: info.name.unwrap_or_else(|| "LinkedIn member".to_string()),
        platform_user_id: info.sub,
        email: info.email,
        image: info.picture,
        access_token: None,
    })
}

#[derive(Deserialize)]
struct TwitterMe {
    data: TwitterUser,
}

#[derive(Deserialize)]
struct TwitterUser {
    id: String,
    name: Option<String>,
    username: String,
    profile_image_url: Option<String>,
}

pub(crate) async fn twitter(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    access_token: &str,
) -> ProfileResult {
    let value = get_json(
        Platform::Twitter,
        http.get(endpoints.api("/2/users/me"))
            .query(&[("user.fields", "profile_image_url")])
            .bearer_auth(access_token),
    )
    .await?;
    let me: TwitterMe = parse(Platform::Twitter, value)?;

    Ok(PlatformProfile {
        platform_user_id: me.data.id,
        name: me
            .data
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("@{}", me.data.username)),
        email: None,
        image: me.data.profile_image_url,
        access_token: None,
    })
}

#[derive(Deserialize)]
struct GraphPicture {
    data: GraphPictureData,
}

#[derive(Deserialize)]
struct GraphPictureData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct GraphUser {
    id: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<GraphPicture>,
}

#[derive(Deserialize)]
struct GraphPages {
    #[serde(default)]
    data: Vec<GraphPage>,
}

#[derive(Deserialize)]
struct GraphPage {
    id: String,
    name: Option<String>,
    access_token: Option<String>,
    picture: Option<GraphPicture>,
    instagram_business_account: Option<InstagramBusinessAccount>,
}

#[derive(Deserialize)]
struct InstagramBusinessAccount {
    id: String,
    username: Option<String>,
    profile_picture_url: Option<String>,
}

/// The user's first managed Page stands in for the user when one exists
pub(crate) async fn facebook(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    access_token: &str,
) -> ProfileResult {
    let value = get_json(
        Platform::Facebook,
        http.get(endpoints.graph("/me")).query(&[
            ("fields", "id,name,email,picture"),
            ("access_token", access_token),
        ]),
    )
    .await?;
    let user: GraphUser = parse(Platform::Facebook, value)?;

    let mut profile = PlatformProfile {
        platform_user_id: user.id,
        name: user.name.unwrap_or_else(|| "Facebook user".to_string()),
        email: user.email,
        image: user.picture.and_then(|p| p.data.url),
        access_token: None,
    };

    let value = get_json(
        Platform::Facebook,
        http.get(endpoints.graph("/me/accounts")).query(&[
            ("fields", "id,name,access_token,picture"),
            ("access_token", access_token),
        ]),
    )
    .await?;
    let pages: GraphPages = parse(Platform::Facebook, value)?;

    match pages.data.into_iter().next() {
        Some(page) => {
            profile.platform_user_id = page.id;
            if let Some(name) = page.name {
                profile.name = name;
            }
            if let Some(url) = page.picture.and_then(|p| p.data.url) {
                profile.image = Some(url);
            }
            profile.access_token = page.access_token;
        }
        None => {
            tracing::warn!("Facebook user manages no Pages, storing the user token");
        }
    }

    Ok(profile)
}

/// First Page with a linked Instagram Business account
pub(crate) async fn instagram(
    http: &reqwest::Client,
    endpoints: &Endpoints,
    access_token: &str,
) -> ProfileResult {
    let value = get_json(
        Platform::Instagram,
        http.get(endpoints.graph("/me/accounts")).query(&[
            (
                "fields",
                "id,name,access_token,instagram_business_account{id,username,profile_picture_url}",
            ),
            ("access_token", access_token),
        ]),
    )
    .await?;
    let pages: GraphPages = parse(Platform::Instagram, value)?;

    let (page_token, business) = pages
        .data
        .into_iter()
        .find_map(|page| {
            page.instagram_business_account
                .map(|account| (page.access_token, account))
        })
        .ok_or_else(|| {
            OAuthError::Profile(
                "No Instagram Business account is connected to your Facebook Pages".to_string(),
            )
        })?;

    Ok(PlatformProfile {
        name: business
            .username
            .clone()
            .unwrap_or_else(|| "Instagram account".to_string()),
        platform_user_id: business.id,
        email: None,
        image: business.profile_picture_url,
        access_token: page_token,
    })
}
