//! Entities exchanged with the backend admin API.
//!
//! Reads are lenient: every field defaults so partial or older payloads still
//! decode. Writes use the dedicated `*Payload` types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A collection exposed under `/admin`.
pub trait Resource: serde::de::DeserializeOwned + Send + 'static {
    /// Collection path, e.g. `/channels`. The console mounts its pages at the same path.
    const COLLECTION: &'static str;

    /// Whether the backend serves `GET {COLLECTION}/{id}`. When it does not,
    /// lookups scan the list.
    const FETCH_BY_ID: bool;

    fn id(&self) -> u32;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Channel {
    pub id: u32,
    pub name: String,
    pub logo: String,
    pub mpd: String,
    pub key: String,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub expires_every: i64,
    pub packages: Vec<Package>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Package {
    pub id: u32,
    pub name: String,
    pub logo: String,
    pub channels: Vec<Channel>,
    pub created_at: Option<DateTime<Utc>>,
}

/// An IPTV hoster (reseller brand).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Hoster {
    pub id: u32,
    pub name: String,
    pub logo: String,
    pub color_palette: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub avatar: String,
    pub tele_username: String,
    pub reference: String,
    pub is_admin: bool,
    pub is_hoster: bool,
    pub iptv_hoster_id: Option<u32>,
    pub iptv_hoster: Option<Hoster>,
    pub subscriptions: Vec<Subscription>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Subscription {
    pub id: u32,
    pub user_id: u32,
    pub user: Option<User>,
    pub started: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub payed: f64,
    pub key: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Resource for Channel {
    const COLLECTION: &'static str = "/channels";
    const FETCH_BY_ID: bool = false;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Resource for Package {
    const COLLECTION: &'static str = "/packages";
    const FETCH_BY_ID: bool = false;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Resource for Hoster {
    const COLLECTION: &'static str = "/hosters";
    const FETCH_BY_ID: bool = false;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Resource for User {
    const COLLECTION: &'static str = "/users";
    const FETCH_BY_ID: bool = true;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Resource for Subscription {
    const COLLECTION: &'static str = "/subscriptions";
    const FETCH_BY_ID: bool = true;

    fn id(&self) -> u32 {
        self.id
    }
}

/// Successful `/login` answer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginGrant {
    pub token: String,
    /// Token lifetime in seconds, when the backend reports one.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPayload {
    pub name: String,
    pub logo: String,
    pub mpd: String,
    pub key: String,
    pub expires_every: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refreshed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagePayload {
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HosterPayload {
    pub name: String,
    pub logo: String,
    pub color_palette: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPayload {
    pub name: String,
    pub tele_username: String,
    pub avatar: String,
    pub reference: String,
    pub is_admin: bool,
    pub is_hoster: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iptv_hoster_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionPayload {
    pub user_id: u32,
    pub started: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub payed: f64,
    pub key: String,
}
