use reqwest::header;
use tracing::{debug, info};
use url::Url;

use crate::config::SalesforceConfig;
use crate::error::QueryError;

/// An authenticated Salesforce session.
#[derive(Clone)]
pub struct Session {
    /// Origin of the org's instance, e.g. `https://acme.my.salesforce.com`.
    pub instance_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .finish_non_exhaustive()
    }
}

/// Log in with username, password and security token through the SOAP partner API.
pub async fn login(
    client: &reqwest::Client,
    config: &SalesforceConfig,
) -> Result<Session, QueryError> {
    let url = format!(
        "{}/services/Soap/u/{}",
        config.login_base_url(),
        config.api_version
    );
    let password = format!("{}{}", config.password, config.security_token);

    info!(
        "logging in to Salesforce at {} as {}",
        config.login_base_url(),
        config.username
    );

    let response = client
        .post(&url)
        .header(header::CONTENT_TYPE, "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(login_envelope(&config.username, &password))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let reason = extract_element(&body, "faultstring")
            .map(|fault| fault.to_owned())
            .unwrap_or_else(|| format!("status {}", status));
        return Err(QueryError::Login(reason));
    }

    let session = parse_login_response(&body)?;
    debug!("logged in to Salesforce instance {}", session.instance_url);

    Ok(session)
}

fn login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        escape_xml(username),
        escape_xml(password)
    )
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Return the text of the first `<name>` element in `body`. Good enough for the flat login response.
fn extract_element<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);

    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;

    Some(&body[start..end])
}

fn parse_login_response(body: &str) -> Result<Session, QueryError> {
    let access_token = extract_element(body, "sessionId")
        .ok_or_else(|| QueryError::Login("login response holds no sessionId".to_owned()))?;
    let server_url = extract_element(body, "serverUrl")
        .ok_or_else(|| QueryError::Login("login response holds no serverUrl".to_owned()))?;

    let server_url = Url::parse(server_url)
        .map_err(|e| QueryError::Login(format!("invalid serverUrl {}: {}", server_url, e)))?;

    Ok(Session {
        instance_url: server_url.origin().ascii_serialization(),
        access_token: access_token.to_owned(),
    })
}
