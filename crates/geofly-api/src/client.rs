// Hand-crafted async HTTP client for the geofence safety service.
//
// Base path: /api/v1/
// Auth: Authorization: Bearer <api key>

use chrono::{SecondsFormat, Utc};
use reqwest::Method;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{
    Alert, AlertQuery, DashboardReport, Envelope, GeoPoint, Severity, TimeRange, Tourist,
    TouristRegistration, ViolationCheck, Zone, ZoneDraft, ZoneStatistics, ZoneUpdate,
};

/// Health-probe paths tried in order by [`GeofenceClient::test_connection`].
const HEALTH_PATHS: [&str; 4] = ["/health", "/api/v1/health", "/docs", "/"];

/// Async client for the geofence service REST API.
///
/// Every call issues exactly one HTTP request with a bounded timeout and
/// parses the `{success, data, ...}` JSON envelope. The base URL and API
/// key are runtime-mutable so a host application can repoint the client
/// without rebuilding it.
pub struct GeofenceClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    timeout_secs: u64,
}

impl GeofenceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build with the default transport (10s timeout).
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, Error> {
        Self::with_transport(base_url, api_key, &TransportConfig::default())
    }

    /// Build from an explicit transport config.
    pub fn with_transport(
        base_url: &str,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            api_key,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    // ── Runtime configuration ────────────────────────────────────────

    /// Swap the API key used for subsequent requests.
    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.api_key = api_key;
    }

    /// Repoint the client at a different service instance.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), Error> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(())
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// First eight characters of the API key, for diagnostics.
    pub fn redacted_key(&self) -> String {
        let key = self.api_key.expose_secret();
        let head: String = key.chars().take(8).collect();
        format!("{head}...")
    }

    // ── Connectivity probe ───────────────────────────────────────────

    /// Probe the health endpoints in order; `true` on the first one that
    /// answers. A 404 counts as reachable (server up, path wrong).
    pub async fn test_connection(&self) -> bool {
        let Ok(bearer) = self.bearer() else {
            return false;
        };

        for path in HEALTH_PATHS {
            let Ok(url) = self.base_url.join(path) else {
                continue;
            };
            match self
                .http
                .get(url.clone())
                .header(reqwest::header::AUTHORIZATION, bearer.clone())
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() || resp.status().as_u16() == 404 => {
                    debug!(%url, "health probe succeeded");
                    return true;
                }
                Ok(resp) => {
                    debug!(%url, status = resp.status().as_u16(), "health probe rejected");
                }
                Err(e) => {
                    debug!(%url, error = %e, "health probe failed");
                }
            }
        }
        false
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    fn bearer(&self) -> Result<HeaderValue, Error> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
                .map_err(|e| Error::InvalidApiKey(e.to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!(%method, %url, "request");

        let mut req = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, self.bearer()?);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, &[], None::<&()>).await?;
        unwrap_envelope(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, params, None::<&()>).await?;
        unwrap_envelope(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self.send(Method::POST, path, &[], Some(body)).await?;
        unwrap_envelope(resp).await
    }

    async fn post_no_data<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let resp = self.send(Method::POST, path, &[], Some(body)).await?;
        check_envelope(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let resp = self.send(Method::PUT, path, &[], Some(body)).await?;
        unwrap_envelope(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let resp = self.send(Method::DELETE, path, &[], None::<&()>).await?;
        check_envelope(resp).await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Zones ────────────────────────────────────────────────────────

    pub async fn list_zones(&self) -> Result<Vec<Zone>, Error> {
        self.get("/api/v1/zones").await
    }

    pub async fn get_zone(&self, zone_id: &str) -> Result<Zone, Error> {
        self.get(&format!("/api/v1/zones/{zone_id}")).await
    }

    pub async fn create_zone(&self, draft: &ZoneDraft) -> Result<Zone, Error> {
        self.post("/api/v1/zones", draft).await
    }

    pub async fn update_zone(&self, zone_id: &str, updates: &ZoneUpdate) -> Result<Zone, Error> {
        self.put(&format!("/api/v1/zones/{zone_id}"), updates).await
    }

    pub async fn delete_zone(&self, zone_id: &str) -> Result<(), Error> {
        self.delete(&format!("/api/v1/zones/{zone_id}")).await
    }

    // ── Tourists ─────────────────────────────────────────────────────

    pub async fn list_tourists(&self) -> Result<Vec<Tourist>, Error> {
        self.get("/api/v1/tourists").await
    }

    pub async fn get_tourist(&self, tourist_id: &str) -> Result<Tourist, Error> {
        self.get(&format!("/api/v1/tourists/{tourist_id}")).await
    }

    pub async fn register_tourist(
        &self,
        registration: &TouristRegistration,
    ) -> Result<Tourist, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            #[serde(flatten)]
            registration: &'a TouristRegistration,
            registered_at: String,
        }

        self.post("/api/v1/tourists", &Body {
            registration,
            registered_at: now_rfc3339(),
        })
        .await
    }

    pub async fn update_tourist_location(
        &self,
        tourist_id: &str,
        location: GeoPoint,
    ) -> Result<Tourist, Error> {
        #[derive(Serialize)]
        struct Body {
            location: GeoPoint,
            timestamp: String,
        }

        self.put(&format!("/api/v1/tourists/{tourist_id}/location"), &Body {
            location,
            timestamp: now_rfc3339(),
        })
        .await
    }

    // ── Alerts ───────────────────────────────────────────────────────

    pub async fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>, Error> {
        self.get_with_params("/api/v1/alerts", &query.to_params())
            .await
    }

    pub async fn get_alert(&self, alert_id: &str) -> Result<Alert, Error> {
        self.get(&format!("/api/v1/alerts/{alert_id}")).await
    }

    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<Alert, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            acknowledged_at: String,
        }

        self.post(&format!("/api/v1/alerts/{alert_id}/acknowledge"), &Body {
            acknowledged_at: now_rfc3339(),
        })
        .await
    }

    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        resolution: Option<&str>,
    ) -> Result<Alert, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            resolved_at: String,
            resolution: &'a str,
        }

        self.post(&format!("/api/v1/alerts/{alert_id}/resolve"), &Body {
            resolved_at: now_rfc3339(),
            resolution: resolution.unwrap_or("Alert resolved by operator"),
        })
        .await
    }

    // ── Monitoring ───────────────────────────────────────────────────

    pub async fn check_violations(
        &self,
        tourist_id: &str,
        location: GeoPoint,
    ) -> Result<ViolationCheck, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            tourist_id: &'a str,
            location: GeoPoint,
        }

        self.post("/api/v1/monitoring/check-violations", &Body {
            tourist_id,
            location,
        })
        .await
    }

    // ── Emergency ────────────────────────────────────────────────────

    pub async fn trigger_emergency_alert(
        &self,
        tourist_id: &str,
        location: GeoPoint,
        message: Option<&str>,
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            tourist_id: &'a str,
            location: GeoPoint,
            message: &'a str,
            timestamp: String,
            priority: &'a str,
        }

        self.post_no_data("/api/v1/emergency/alert", &Body {
            tourist_id,
            location,
            message: message.unwrap_or("Emergency alert triggered by tourist"),
            timestamp: now_rfc3339(),
            priority: "critical",
        })
        .await
    }

    pub async fn broadcast_alert(
        &self,
        zone_id: &str,
        message: &str,
        severity: Severity,
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            zone_id: &'a str,
            message: &'a str,
            severity: Severity,
            timestamp: String,
        }

        self.post_no_data("/api/v1/zones/broadcast", &Body {
            zone_id,
            message,
            severity,
            timestamp: now_rfc3339(),
        })
        .await
    }

    // ── Analytics ────────────────────────────────────────────────────

    pub async fn zone_statistics(
        &self,
        zone_id: &str,
        range: Option<TimeRange>,
    ) -> Result<ZoneStatistics, Error> {
        let mut params = Vec::new();
        if let Some(range) = range {
            params.push(("start", range.start.to_rfc3339_opts(SecondsFormat::Secs, true)));
            params.push(("end", range.end.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        self.get_with_params(&format!("/api/v1/analytics/zones/{zone_id}"), &params)
            .await
    }

    pub async fn dashboard_report(&self) -> Result<DashboardReport, Error> {
        self.get("/api/v1/analytics/dashboard").await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Parse the JSON envelope and extract `data`.
async fn unwrap_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp.text().await?;
    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
        let preview_len = body.len().min(200);
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", &body[..preview_len]),
            body: body.clone(),
        }
    })?;

    if !envelope.success {
        return Err(Error::Envelope {
            message: envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "request rejected".to_owned()),
        });
    }

    envelope.data.ok_or(Error::Deserialization {
        message: "envelope missing `data`".to_owned(),
        body,
    })
}

/// Like [`unwrap_envelope`] but for endpoints whose `data` we discard.
/// An empty 2xx body is accepted as success.
async fn check_envelope(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(());
    }

    let envelope: Envelope<serde_json::Value> =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

    if envelope.success {
        Ok(())
    } else {
        Err(Error::Envelope {
            message: envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "request rejected".to_owned()),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Parse the base URL and strip any trailing slash so `join` behaves.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let trimmed = url.path().trim_end_matches('/').to_owned();
    url.set_path(&trimmed);
    Ok(url)
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slash() {
        let url = normalize_base_url("https://geofence.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://geofence.example.com/");
        assert_eq!(
            url.join("/api/v1/zones").unwrap().as_str(),
            "https://geofence.example.com/api/v1/zones"
        );
    }

    #[test]
    fn redacted_key_shows_prefix_only() {
        let client = GeofenceClient::new(
            "https://geofence.example.com",
            SecretString::from("demo-api-key-123456".to_owned()),
        )
        .unwrap();
        assert_eq!(client.redacted_key(), "demo-api...");
    }
}
