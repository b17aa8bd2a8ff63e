//! Backend admin API (external service).
//!
//! The backend owns all persistent state: channels, packages, users,
//! hosters, subscriptions and admin credentials. This module only speaks its
//! REST contract.

pub mod client;
pub mod models;

pub use client::{ApiClient, ApiError};
pub use models::{
    Channel, ChannelPayload, Hoster, HosterPayload, LoginGrant, Package, PackagePayload, Resource,
    Subscription, SubscriptionPayload, User, UserPayload,
};
