//! Browser identity presented to upstream servers.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::ProxySettings;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid header name '{0}'")]
    Name(String),
    #[error("invalid value for header '{0}'")]
    Value(String),
}

/// Fixed request headers sent on every upstream fetch.
#[derive(Debug, Clone)]
pub struct UpstreamIdentity {
    headers: HeaderMap,
}

impl UpstreamIdentity {
    /// Build the header set. User-Agent, Origin and Referer win over
    /// same-named entries in `additional_headers`.
    pub fn from_settings(settings: &ProxySettings) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();

        for (name, value) in &settings.additional_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| IdentityError::Name(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| IdentityError::Value(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        for (name, value) in [
            (header::USER_AGENT, &settings.user_agent),
            (header::ORIGIN, &settings.origin),
            (header::REFERER, &settings.referer),
        ] {
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| IdentityError::Value(name.to_string()))?;
            headers.insert(name, header_value);
        }

        Ok(Self { headers })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identity_matches_browser_profile() {
        let identity = UpstreamIdentity::from_settings(&ProxySettings::default()).unwrap();
        let headers = identity.headers();

        assert!(headers[header::USER_AGENT]
            .to_str()
            .unwrap()
            .contains("Firefox/141.0"));
        assert_eq!(headers[header::ACCEPT], "*/*");
        assert_eq!(headers[header::ACCEPT_LANGUAGE], "en-US,en;q=0.5");
        assert_eq!(headers[header::ORIGIN], "https://www.dazn.com");
        assert_eq!(headers[header::REFERER], "https://www.dazn.com/");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers["sec-fetch-dest"], "empty");
        assert_eq!(headers["sec-fetch-mode"], "cors");
        assert_eq!(headers["sec-fetch-site"], "cross-site");
        assert_eq!(headers[header::DNT], "1");
        assert_eq!(headers["sec-gpc"], "1");
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
    }

    #[test]
    fn dedicated_fields_override_additional_headers() {
        let mut settings = ProxySettings::default();
        settings.origin = "https://tv.example.test".into();
        settings
            .additional_headers
            .insert("Origin".into(), "https://ignored.test".into());

        let identity = UpstreamIdentity::from_settings(&settings).unwrap();
        assert_eq!(identity.headers()[header::ORIGIN], "https://tv.example.test");
    }

    #[test]
    fn rejects_invalid_entries() {
        let mut settings = ProxySettings::default();
        settings
            .additional_headers
            .insert("bad name".into(), "v".into());
        assert!(matches!(
            UpstreamIdentity::from_settings(&settings),
            Err(IdentityError::Name(_))
        ));

        let mut settings = ProxySettings::default();
        settings.referer = "line\nbreak".into();
        assert!(matches!(
            UpstreamIdentity::from_settings(&settings),
            Err(IdentityError::Value(_))
        ));
    }
}
