use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

/// Salesforce connection settings.
///
/// Production orgs always log in through `login.salesforce.com`; sandbox orgs use their own
/// `domain` (usually `test`, or a My Domain prefix).
#[derive(Envconfig, Clone)]
pub struct SalesforceConfig {
    #[envconfig(from = "SFDC_USERNAME")]
    pub username: String,

    #[envconfig(from = "SFDC_PASSWORD")]
    pub password: String,

    #[envconfig(from = "SFDC_SECURITY_TOKEN", default = "")]
    pub security_token: String,

    #[envconfig(from = "SFDC_SANDBOX", default = "false")]
    pub sandbox: bool,

    #[envconfig(from = "SFDC_DOMAIN", default = "test")]
    pub domain: String,

    #[envconfig(from = "SFDC_API_VERSION", default = "59.0")]
    pub api_version: String,

    /// Overrides `https://{domain}.salesforce.com`, mostly useful to point at a mock server.
    #[envconfig(from = "SFDC_LOGIN_URL")]
    pub login_url: Option<String>,

    #[envconfig(from = "SFDC_REQUEST_TIMEOUT_MS", default = "30000")]
    pub request_timeout: EnvMsDuration,
}

impl SalesforceConfig {
    pub fn login_domain(&self) -> &str {
        if self.sandbox {
            &self.domain
        } else {
            "login"
        }
    }

    /// Base URL the SOAP login call is sent to.
    pub fn login_base_url(&self) -> String {
        match &self.login_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://{}.salesforce.com", self.login_domain()),
        }
    }
}

impl std::fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("username", &self.username)
            .field("sandbox", &self.sandbox)
            .field("login_domain", &self.login_domain())
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

/// A duration read from the environment as a whole number of seconds.
#[derive(Debug, Clone, Copy)]
pub struct EnvSecondsDuration(pub time::Duration);

impl FromStr for EnvSecondsDuration {
    type Err = ParseEnvDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = s.parse::<u64>().map_err(|_| ParseEnvDurationError)?;

        Ok(EnvSecondsDuration(time::Duration::from_secs(seconds)))
    }
}

#[derive(Debug, Clone)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StringIsEmptyError;

impl FromStr for NonEmptyString {
    type Err = StringIsEmptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(StringIsEmptyError)
        } else {
            Ok(NonEmptyString(s.to_owned()))
        }
    }
}
