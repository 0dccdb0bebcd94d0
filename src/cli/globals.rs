use crate::carelink::{
    api::ApiClient,
    auth::{widget::Msg91Config, widget::Msg91Widget, FileSessionStore},
    location::Geocoder,
};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Connection settings shared by every action.
#[derive(Clone)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub timeout: Duration,
    pub session_file: PathBuf,
    pub geocode_url: String,
    pub msg91: Option<Msg91Config>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: Option<String>, session_file: PathBuf) -> Self {
        Self {
            api_url,
            timeout: crate::carelink::api::DEFAULT_TIMEOUT,
            session_file,
            geocode_url: crate::carelink::location::DEFAULT_GEOCODE_URL.to_string(),
            msg91: None,
        }
    }

    /// # Errors
    /// Returns an error if no API URL was configured or it is not a valid http(s) URL.
    pub fn api_client(&self) -> Result<ApiClient> {
        let url = self
            .api_url
            .as_deref()
            .context("missing required argument: --api-url (or CARELINK_API_URL)")?;
        ApiClient::new(url, self.timeout).context("invalid CARELINK_API_URL")
    }

    /// # Errors
    /// Returns an error if the geocoding URL is not a valid http(s) URL.
    pub fn geocoder(&self) -> Result<Geocoder> {
        let api = ApiClient::new(&self.geocode_url, self.timeout)
            .context("invalid CARELINK_GEOCODE_URL")?;
        Ok(Geocoder::new(api))
    }

    /// The MSG91 widget, when configured.
    ///
    /// # Errors
    /// Returns an error if the widget URL is not a valid http(s) URL.
    pub fn widget(&self) -> Result<Option<Msg91Widget>> {
        self.msg91
            .clone()
            .map(|config| Msg91Widget::new(config, self.timeout))
            .transpose()
            .context("invalid CARELINK_MSG91_URL")
    }

    #[must_use]
    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::new(&self.session_file)
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("session_file", &self.session_file)
            .field("geocode_url", &self.geocode_url)
            .field(
                "msg91_widget_id",
                &self.msg91.as_ref().map(|config| config.widget_id.as_str()),
            )
            .field("msg91_token", &"***")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            Some("https://api.carelink.test".to_string()),
            PathBuf::from("/tmp/session.json"),
        );
        assert_eq!(
            args.api_client().unwrap().base_url(),
            "https://api.carelink.test"
        );
        assert_eq!(args.session_store().path(), PathBuf::from("/tmp/session.json"));
        assert!(args.widget().unwrap().is_none());
        assert!(args.geocoder().is_ok());
    }

    #[test]
    fn test_missing_api_url() {
        let args = GlobalArgs::new(None, PathBuf::from("session.json"));
        let err = args.api_client().unwrap_err();
        assert!(err.to_string().contains("--api-url"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut args = GlobalArgs::new(None, PathBuf::from("session.json"));
        args.msg91 = Msg91Config::from_parts(
            None,
            Some("widget-1".to_string()),
            Some(SecretString::from("very-secret".to_string())),
        );
        let debug = format!("{args:?}");
        assert!(debug.contains("widget-1"));
        assert!(!debug.contains("very-secret"));
        assert!(args.widget().unwrap().is_some());
    }
}
