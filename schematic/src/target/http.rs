use std::time::Duration;

use async_trait::async_trait;
use model::channel::{Channel, PermissionOverwrite};
use model::guild::{Guild, Member, Role};
use model::{PermissionBitSet, Snowflake};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChannelSpec, RoleSpec, Target};
use crate::error::TargetError;
use crate::frontend::Invoker;
use crate::Config;

// Longest wait honoured before retrying a rate limited request
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60 * 60);

/// A guild reached through the Discord REST API with a bot token.
pub struct HttpTarget {
    client: reqwest::Client,
    api_base: String,
    token: String,
    bot_id: Snowflake,
    guild_id: Snowflake,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: f64,
    #[serde(default)]
    global: bool,
}

#[derive(Debug, Serialize)]
struct CreateChannelBody<'a> {
    #[serde(flatten)]
    spec: &'a ChannelSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Snowflake>,
}

#[derive(Debug, Serialize)]
struct ModifyChannelBody<'a> {
    permission_overwrites: &'a [PermissionOverwrite],
}

impl HttpTarget {
    pub fn new(config: &Config, guild_id: Snowflake) -> Result<Self, TargetError> {
        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_base: config.discord_api_base.trim_end_matches('/').to_owned(),
            token: config.discord_token.clone(),
            bot_id: config.bot_id,
            guild_id,
        })
    }

    /// Owner status and guild permissions of a member of this guild.
    pub async fn invoker(&self, user_id: Snowflake) -> Result<Invoker, TargetError> {
        let guild: Guild = self.fetch(&format!("/guilds/{}", self.guild_id)).await?;
        let member: Member = self
            .fetch(&format!("/guilds/{}/members/{}", self.guild_id, user_id))
            .await?;
        let roles = self.roles().await?;

        Ok(Invoker::from_member(&guild, user_id, &member, &roles))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Authorization", format!("Bot {}", self.token))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, TargetError> {
        debug!(path, "GET");
        let res = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await?;

        Ok(Self::check(res).await?.json().await?)
    }

    async fn check(res: Response) -> Result<Response, TargetError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let header = res
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());

            let body = res.json::<RateLimitBody>().await.ok();
            if let Some(body) = &body {
                if body.global {
                    warn!(retry_after = body.retry_after, "Hit global rate limit");
                }
            }

            let seconds = body.map(|b| b.retry_after).or(header).unwrap_or(1.0);
            return Err(TargetError::RateLimited {
                retry_after: retry_after_from(seconds),
            });
        }

        let body = res.text().await.unwrap_or_default();
        Err(TargetError::ResponseError { status, body })
    }
}

fn retry_after_from(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .unwrap_or(MAX_RETRY_AFTER)
        .min(MAX_RETRY_AFTER)
}

#[async_trait]
impl Target for HttpTarget {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    async fn roles(&self) -> Result<Vec<Role>, TargetError> {
        self.fetch(&format!("/guilds/{}/roles", self.guild_id)).await
    }

    async fn channels(&self) -> Result<Vec<Channel>, TargetError> {
        self.fetch(&format!("/guilds/{}/channels", self.guild_id))
            .await
    }

    async fn current_permissions(&self) -> Result<PermissionBitSet, TargetError> {
        Ok(self.invoker(self.bot_id).await?.permissions)
    }

    async fn create_role(&self, spec: &RoleSpec) -> Result<Role, TargetError> {
        debug!(name = %spec.name, "Creating role");

        let req = self
            .client
            .post(self.url(&format!("/guilds/{}/roles", self.guild_id)))
            .json(spec);
        let res = self.authorize(req).send().await?;

        Ok(Self::check(res).await?.json().await?)
    }

    async fn create_channel(
        &self,
        spec: &ChannelSpec,
        parent: Option<Snowflake>,
    ) -> Result<Channel, TargetError> {
        debug!(name = %spec.name, kind = ?spec.kind, ?parent, "Creating channel");

        let body = CreateChannelBody {
            spec,
            parent_id: parent,
        };

        let req = self
            .client
            .post(self.url(&format!("/guilds/{}/channels", self.guild_id)))
            .json(&body);
        let res = self.authorize(req).send().await?;

        Ok(Self::check(res).await?.json().await?)
    }

    async fn set_channel_overwrites(
        &self,
        channel_id: Snowflake,
        overwrites: &[PermissionOverwrite],
    ) -> Result<(), TargetError> {
        debug!(%channel_id, count = overwrites.len(), "Setting overwrites");

        let body = ModifyChannelBody {
            permission_overwrites: overwrites,
        };

        let req = self
            .client
            .patch(self.url(&format!("/channels/{}", channel_id)))
            .json(&body);
        let res = self.authorize(req).send().await?;

        Self::check(res).await?;
        Ok(())
    }
}
