use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use model::channel::{Channel, ChannelType, PermissionOverwrite};
use model::guild::Role;
use model::{PermissionBitSet, Snowflake};
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{ChannelSpec, RoleSpec, Target};
use crate::error::TargetError;

/// A mutation received by a [`MemoryTarget`], in arrival order.
#[derive(Debug, Clone)]
pub enum Request {
    CreateRole {
        name: String,
        at: Instant,
    },
    CreateChannel {
        name: String,
        kind: ChannelType,
        parent: Option<Snowflake>,
        at: Instant,
    },
    SetOverwrites {
        channel_id: Snowflake,
        overwrites: Vec<PermissionOverwrite>,
    },
}

impl Request {
    pub fn is_creation(&self) -> bool {
        !matches!(self, Request::SetOverwrites { .. })
    }
}

#[derive(Default)]
struct State {
    roles: Vec<Role>,
    channels: Vec<Channel>,
    next_id: u64,
    requests: Vec<Request>,
    rejected: HashSet<String>,
    rejected_overwrites: HashSet<String>,
    rate_limited: HashMap<String, usize>,
}

/// An in-process guild. Used for dry runs, where it mirrors a live guild, and in tests.
pub struct MemoryTarget {
    guild_id: Snowflake,
    permissions: PermissionBitSet,
    state: Mutex<State>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryTarget {
    pub fn new(guild_id: Snowflake) -> Self {
        Self {
            guild_id,
            permissions: PermissionBitSet::all(),
            state: Mutex::new(State {
                next_id: guild_id.0 + 1,
                ..Default::default()
            }),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Copies the current roles, channels and permissions of another target.
    pub async fn mirror<T: Target + ?Sized>(target: &T) -> Result<Self, TargetError> {
        let roles = target.roles().await?;
        let channels = target.channels().await?;
        let permissions = target.current_permissions().await?;

        let next_id = roles
            .iter()
            .map(|r| r.id.0)
            .chain(channels.iter().map(|c| c.id.0))
            .max()
            .unwrap_or(target.guild_id().0)
            + 1;

        Ok(Self {
            guild_id: target.guild_id(),
            permissions,
            state: Mutex::new(State {
                roles,
                channels,
                next_id,
                ..Default::default()
            }),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn with_permissions(mut self, permissions: PermissionBitSet) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_role(self, name: &str, position: u16) -> Self {
        {
            let mut state = self.state.lock();
            let id = state.allocate_id();
            state.roles.push(Role {
                id,
                name: name.to_owned(),
                color: 0,
                hoist: false,
                position,
                permissions: PermissionBitSet::EMPTY,
                managed: false,
                mentionable: false,
            });
        }
        self
    }

    pub fn with_channel(self, name: &str, kind: ChannelType, parent: Option<Snowflake>) -> Self {
        {
            let mut state = self.state.lock();
            let id = state.allocate_id();
            let position = state.channels.len() as u16;
            state.channels.push(Channel {
                id,
                channel_type: kind,
                guild_id: Some(self.guild_id),
                position: Some(position),
                permission_overwrites: vec![],
                name: name.to_owned(),
                topic: None,
                nsfw: None,
                bitrate: None,
                user_limit: None,
                parent_id: parent,
                available_tags: None,
            });
        }
        self
    }

    /// Every mutation takes this long to complete after it has been received.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Creation of a role or channel with this name will be refused.
    pub fn reject(self, name: &str) -> Self {
        self.state.lock().rejected.insert(name.to_owned());
        self
    }

    /// Setting overwrites on the channel with this name will be refused.
    pub fn reject_overwrites(self, name: &str) -> Self {
        self.state.lock().rejected_overwrites.insert(name.to_owned());
        self
    }

    /// The next `times` creation attempts for this name report a rate limit.
    pub fn rate_limit(self, name: &str, times: usize) -> Self {
        self.state.lock().rate_limited.insert(name.to_owned(), times);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().requests.clone()
    }

    pub fn creation_requests(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(Request::is_creation)
            .collect()
    }

    pub fn role_by_name(&self, name: &str) -> Option<Role> {
        self.state
            .lock()
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    pub fn channel_by_name(&self, name: &str) -> Option<Channel> {
        self.state
            .lock()
            .channels
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Highest number of mutations that were ever being processed at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Give overlapping callers a chance to show up
        tokio::task::yield_now().await;
    }

    async fn exit(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check_refusal(state: &mut State, name: &str) -> Result<(), TargetError> {
        if let Some(remaining) = state.rate_limited.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TargetError::RateLimited {
                    retry_after: Duration::from_millis(500),
                });
            }
        }

        if state.rejected.contains(name) {
            return Err(TargetError::Rejected(format!("Missing Access: {}", name)));
        }

        Ok(())
    }
}

impl State {
    fn allocate_id(&mut self) -> Snowflake {
        let id = Snowflake(self.next_id);
        self.next_id += 1;
        id
    }
}

#[async_trait]
impl Target for MemoryTarget {
    fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    async fn roles(&self) -> Result<Vec<Role>, TargetError> {
        Ok(self.state.lock().roles.clone())
    }

    async fn channels(&self) -> Result<Vec<Channel>, TargetError> {
        Ok(self.state.lock().channels.clone())
    }

    async fn current_permissions(&self) -> Result<PermissionBitSet, TargetError> {
        Ok(self.permissions)
    }

    async fn create_role(&self, spec: &RoleSpec) -> Result<Role, TargetError> {
        self.enter().await;

        let res = {
            let mut state = self.state.lock();
            state.requests.push(Request::CreateRole {
                name: spec.name.clone(),
                at: Instant::now(),
            });

            Self::check_refusal(&mut state, &spec.name).map(|_| {
                // Roles are appended above every existing one
                let position = state.roles.iter().map(|r| r.position).max().unwrap_or(0) + 1;

                let role = Role {
                    id: state.allocate_id(),
                    name: spec.name.clone(),
                    color: spec.color,
                    hoist: spec.hoist,
                    position,
                    permissions: spec.permissions,
                    managed: false,
                    mentionable: spec.mentionable,
                };

                state.roles.push(role.clone());
                role
            })
        };

        self.exit().await;
        res
    }

    async fn create_channel(
        &self,
        spec: &ChannelSpec,
        parent: Option<Snowflake>,
    ) -> Result<Channel, TargetError> {
        self.enter().await;

        let res = {
            let mut state = self.state.lock();
            state.requests.push(Request::CreateChannel {
                name: spec.name.clone(),
                kind: spec.kind,
                parent,
                at: Instant::now(),
            });

            let parent_exists = parent.map_or(true, |parent| {
                state
                    .channels
                    .iter()
                    .any(|c| c.id == parent && c.channel_type.is_category())
            });

            if !parent_exists {
                Err(TargetError::Rejected(format!(
                    "Unknown parent category for {}",
                    spec.name
                )))
            } else {
                Self::check_refusal(&mut state, &spec.name).map(|_| {
                    let channel = Channel {
                        id: state.allocate_id(),
                        channel_type: spec.kind,
                        guild_id: Some(self.guild_id),
                        position: Some(spec.position),
                        permission_overwrites: vec![],
                        name: spec.name.clone(),
                        topic: None,
                        nsfw: None,
                        bitrate: spec.bitrate,
                        user_limit: spec.user_limit,
                        parent_id: parent,
                        available_tags: spec.available_tags.clone(),
                    };

                    state.channels.push(channel.clone());
                    channel
                })
            }
        };

        self.exit().await;
        res
    }

    async fn set_channel_overwrites(
        &self,
        channel_id: Snowflake,
        overwrites: &[PermissionOverwrite],
    ) -> Result<(), TargetError> {
        self.enter().await;

        let res = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.requests.push(Request::SetOverwrites {
                channel_id,
                overwrites: overwrites.to_vec(),
            });

            let rejected = &state.rejected_overwrites;
            match state.channels.iter_mut().find(|c| c.id == channel_id) {
                Some(channel) if rejected.contains(&channel.name) => Err(TargetError::Rejected(
                    format!("Missing Permissions: {}", channel.name),
                )),
                Some(channel) => {
                    channel.permission_overwrites = overwrites.to_vec();
                    Ok(())
                }
                None => Err(TargetError::Rejected(format!(
                    "Unknown Channel: {}",
                    channel_id
                ))),
            }
        };

        self.exit().await;
        res
    }
}
