//! Console form bodies and their conversion into backend payloads.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::{
    Channel, ChannelPayload, Hoster, HosterPayload, Package, PackagePayload, Resource,
    Subscription, SubscriptionPayload, User, UserPayload,
};

/// Channel key refresh interval used when the form leaves it blank.
pub const DEFAULT_EXPIRES_EVERY: i64 = 3600;
/// Subscription length used when the form leaves the end blank.
pub const DEFAULT_SUBSCRIPTION_DAYS: i64 = 30;
pub const SUBSCRIPTION_KEY_LEN: usize = 16;
const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field}: '{value}' is not a valid number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field}: '{value}' is not a valid date")]
    InvalidDate { field: &'static str, value: String },
}

fn parse_optional<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<Option<T>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| FormError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_required<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, FormError> {
    parse_optional(field, raw)?.ok_or(FormError::Missing { field })
}

/// Read an HTML date/time input. RFC 3339 values keep their offset; naive
/// values (`datetime-local`, plain dates) are taken as UTC.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<Option<DateTime<Utc>>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc()));
    }

    Err(FormError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// Random subscription key over `A-Z0-9`.
pub fn generate_key(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelForm {
    pub name: String,
    pub logo: String,
    pub mpd: String,
    pub key: String,
    #[serde(default)]
    pub expires_every: String,
    /// Package to attach a newly created channel to.
    #[serde(default)]
    pub package_id: String,
}

impl ChannelForm {
    /// `refreshed_at` is set on creation only.
    pub fn to_payload(&self, refreshed_at: Option<DateTime<Utc>>) -> Result<ChannelPayload, FormError> {
        Ok(ChannelPayload {
            name: self.name.clone(),
            logo: self.logo.clone(),
            mpd: self.mpd.clone(),
            key: self.key.clone(),
            expires_every: parse_optional("expires_every", &self.expires_every)?
                .unwrap_or(DEFAULT_EXPIRES_EVERY),
            last_refreshed: refreshed_at,
        })
    }

    pub fn package_id(&self) -> Result<Option<u32>, FormError> {
        parse_optional("package_id", &self.package_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageForm {
    pub name: String,
    pub logo: String,
}

impl PackageForm {
    pub fn to_payload(&self) -> PackagePayload {
        PackagePayload {
            name: self.name.clone(),
            logo: self.logo.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HosterForm {
    pub name: String,
    pub logo: String,
    pub color_palette: String,
}

impl HosterForm {
    pub fn to_payload(&self) -> HosterPayload {
        HosterPayload {
            name: self.name.clone(),
            logo: self.logo.clone(),
            color_palette: self.color_palette.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub tele_username: String,
    pub avatar: String,
    pub reference: String,
    /// HTML checkbox: present as `on` when ticked, absent otherwise.
    pub is_admin: Option<String>,
    pub is_hoster: Option<String>,
    #[serde(default)]
    pub iptv_hoster_id: String,
}

fn checked(value: &Option<String>) -> bool {
    value.as_deref() == Some("on")
}

impl UserForm {
    pub fn to_payload(&self) -> Result<UserPayload, FormError> {
        Ok(UserPayload {
            name: self.name.clone(),
            tele_username: self.tele_username.clone(),
            avatar: self.avatar.clone(),
            reference: self.reference.clone(),
            is_admin: checked(&self.is_admin),
            is_hoster: checked(&self.is_hoster),
            iptv_hoster_id: parse_optional("iptv_hoster_id", &self.iptv_hoster_id)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionForm {
    pub user_id: String,
    #[serde(default)]
    pub started: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub payed: String,
    #[serde(default)]
    pub key: String,
}

impl SubscriptionForm {
    /// New subscription: a blank key is generated.
    pub fn to_new_payload(&self, now: DateTime<Utc>) -> Result<SubscriptionPayload, FormError> {
        let key = match self.key.trim() {
            "" => generate_key(SUBSCRIPTION_KEY_LEN),
            key => key.to_string(),
        };
        self.payload_with_key(now, key)
    }

    /// Existing subscription: the key must be supplied.
    pub fn to_updated_payload(&self, now: DateTime<Utc>) -> Result<SubscriptionPayload, FormError> {
        match self.key.trim() {
            "" => Err(FormError::Missing { field: "key" }),
            key => self.payload_with_key(now, key.to_string()),
        }
    }

    fn payload_with_key(&self, now: DateTime<Utc>, key: String) -> Result<SubscriptionPayload, FormError> {
        let started = parse_timestamp("started", &self.started)?.unwrap_or(now);
        let end = parse_timestamp("end", &self.end)?
            .unwrap_or_else(|| now + Duration::days(DEFAULT_SUBSCRIPTION_DAYS));

        Ok(SubscriptionPayload {
            user_id: parse_required("user_id", &self.user_id)?,
            started,
            end,
            payed: parse_optional("payed", &self.payed)?.unwrap_or(0.0),
            key,
        })
    }
}

/// A console form backing one backend collection.
pub trait EntityForm: DeserializeOwned + Send + 'static {
    type Resource: Resource;
    type Payload: Serialize + Send + Sync;

    fn create_payload(&self, now: DateTime<Utc>) -> Result<Self::Payload, FormError>;

    fn update_payload(&self, now: DateTime<Utc>) -> Result<Self::Payload, FormError>;
}

impl EntityForm for ChannelForm {
    type Resource = Channel;
    type Payload = ChannelPayload;

    fn create_payload(&self, now: DateTime<Utc>) -> Result<ChannelPayload, FormError> {
        self.to_payload(Some(now))
    }

    fn update_payload(&self, _now: DateTime<Utc>) -> Result<ChannelPayload, FormError> {
        self.to_payload(None)
    }
}

impl EntityForm for PackageForm {
    type Resource = Package;
    type Payload = PackagePayload;

    fn create_payload(&self, _now: DateTime<Utc>) -> Result<PackagePayload, FormError> {
        Ok(self.to_payload())
    }

    fn update_payload(&self, _now: DateTime<Utc>) -> Result<PackagePayload, FormError> {
        Ok(self.to_payload())
    }
}

impl EntityForm for HosterForm {
    type Resource = Hoster;
    type Payload = HosterPayload;

    fn create_payload(&self, _now: DateTime<Utc>) -> Result<HosterPayload, FormError> {
        Ok(self.to_payload())
    }

    fn update_payload(&self, _now: DateTime<Utc>) -> Result<HosterPayload, FormError> {
        Ok(self.to_payload())
    }
}

impl EntityForm for UserForm {
    type Resource = User;
    type Payload = UserPayload;

    fn create_payload(&self, _now: DateTime<Utc>) -> Result<UserPayload, FormError> {
        self.to_payload()
    }

    fn update_payload(&self, _now: DateTime<Utc>) -> Result<UserPayload, FormError> {
        self.to_payload()
    }
}

impl EntityForm for SubscriptionForm {
    type Resource = Subscription;
    type Payload = SubscriptionPayload;

    fn create_payload(&self, now: DateTime<Utc>) -> Result<SubscriptionPayload, FormError> {
        self.to_new_payload(now)
    }

    fn update_payload(&self, now: DateTime<Utc>) -> Result<SubscriptionPayload, FormError> {
        self.to_updated_payload(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    #[test]
    fn naive_inputs_are_read_as_utc() {
        assert_eq!(
            parse_timestamp("started", "2025-05-01T08:30").unwrap(),
            Some(at("2025-05-01T08:30:00Z"))
        );
        assert_eq!(
            parse_timestamp("started", "2025-05-01").unwrap(),
            Some(at("2025-05-01T00:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("started", "2025-05-01T08:30:00+02:00").unwrap(),
            Some(at("2025-05-01T06:30:00Z"))
        );
        assert_eq!(parse_timestamp("started", "  ").unwrap(), None);
        assert!(matches!(
            parse_timestamp("end", "next tuesday"),
            Err(FormError::InvalidDate { field: "end", .. })
        ));
    }

    #[test]
    fn generated_keys_use_upper_alphanumerics() {
        let key = generate_key(SUBSCRIPTION_KEY_LEN);
        assert_eq!(key.len(), 16);
        assert!(key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        assert_ne!(key, generate_key(SUBSCRIPTION_KEY_LEN));
    }

    #[test]
    fn channel_defaults_refresh_interval() {
        let form = ChannelForm {
            name: "News".into(),
            logo: String::new(),
            mpd: "https://cdn.example.test/news.mpd".into(),
            key: "kid:key".into(),
            expires_every: String::new(),
            package_id: "4".into(),
        };
        let now = at("2025-01-01T00:00:00Z");

        let payload = form.to_payload(Some(now)).unwrap();
        assert_eq!(payload.expires_every, DEFAULT_EXPIRES_EVERY);
        assert_eq!(payload.last_refreshed, Some(now));
        assert_eq!(form.package_id(), Ok(Some(4)));

        let bad = ChannelForm {
            expires_every: "hourly".into(),
            ..form
        };
        assert!(matches!(
            bad.to_payload(None),
            Err(FormError::InvalidNumber { field: "expires_every", .. })
        ));
    }

    #[test]
    fn user_checkboxes_and_optional_hoster() {
        let form = UserForm {
            name: "Ann".into(),
            tele_username: "@ann".into(),
            avatar: String::new(),
            reference: "ref".into(),
            is_admin: Some("on".into()),
            is_hoster: None,
            iptv_hoster_id: " ".into(),
        };
        let payload = form.to_payload().unwrap();
        assert!(payload.is_admin);
        assert!(!payload.is_hoster);
        assert_eq!(payload.iptv_hoster_id, None);

        let with_hoster = UserForm {
            iptv_hoster_id: "9".into(),
            ..form
        };
        assert_eq!(with_hoster.to_payload().unwrap().iptv_hoster_id, Some(9));
    }

    #[test]
    fn new_subscription_fills_defaults() {
        let now = at("2025-02-01T12:00:00Z");
        let form = SubscriptionForm {
            user_id: "5".into(),
            started: String::new(),
            end: String::new(),
            payed: String::new(),
            key: String::new(),
        };

        let payload = form.to_new_payload(now).unwrap();
        assert_eq!(payload.user_id, 5);
        assert_eq!(payload.started, now);
        assert_eq!(payload.end, at("2025-03-03T12:00:00Z"));
        assert_eq!(payload.payed, 0.0);
        assert_eq!(payload.key.len(), SUBSCRIPTION_KEY_LEN);
    }

    #[test]
    fn updated_subscription_requires_key_and_user() {
        let now = at("2025-02-01T12:00:00Z");
        let form = SubscriptionForm {
            user_id: "5".into(),
            started: "2025-02-01T00:00".into(),
            end: "2025-02-28T00:00".into(),
            payed: "9.99".into(),
            key: String::new(),
        };
        assert_eq!(
            form.to_updated_payload(now),
            Err(FormError::Missing { field: "key" })
        );

        let keyed = SubscriptionForm {
            key: "ABC".into(),
            ..form.clone()
        };
        let payload = keyed.to_updated_payload(now).unwrap();
        assert_eq!(payload.key, "ABC");
        assert_eq!(payload.payed, 9.99);

        let no_user = SubscriptionForm {
            user_id: String::new(),
            ..keyed
        };
        assert_eq!(
            no_user.to_new_payload(now),
            Err(FormError::Missing { field: "user_id" })
        );
    }
}
