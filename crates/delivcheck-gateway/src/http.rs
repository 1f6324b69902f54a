//! HTTP client for the verification service's batch endpoint.

use async_trait::async_trait;
use delivcheck_core::{VerificationRecord, VerificationRequest};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{GatewayConfig, GatewayError, VerificationGateway};

/// HTTP gateway posting JSON batches to `<base>/v1/records/verify`.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    profile: &'a str,
    records: &'a [VerificationRequest],
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    records: Vec<VerificationRecord>,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn verify_url(&self) -> String {
        format!("{}/v1/records/verify", self.config.base_url())
    }

    fn classify_transport(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.timeout)
        } else {
            GatewayError::Http(e)
        }
    }
}

#[async_trait]
impl VerificationGateway for HttpGateway {
    async fn submit_batch(
        &self,
        requests: &[VerificationRequest],
    ) -> Result<Vec<VerificationRecord>, GatewayError> {
        let url = self.verify_url();
        let body = BatchRequest {
            profile: &self.config.profile,
            records: requests,
        };

        info!(
            url = %url,
            count = requests.len(),
            sandbox = self.config.sandbox,
            "submitting verification batch"
        );
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = status_error(status, body);
            if err.is_authentication() {
                warn!(status = status.as_u16(), "verification credentials rejected");
            }
            return Err(err);
        }

        let bytes = resp.bytes().await.map_err(|e| self.classify_transport(e))?;
        let records = parse_records(&bytes, requests.len())?;
        info!(count = records.len(), "verification batch complete");
        Ok(records)
    }
}

/// Error for a non-success response. 401 and 403 mean the credentials were
/// rejected; everything else is a service fault.
fn status_error(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Authentication(body),
        _ => GatewayError::Service {
            status: status.as_u16(),
            body,
        },
    }
}

/// Records of a success response. No records for a non-empty batch is a
/// service fault.
fn parse_records(bytes: &[u8], requested: usize) -> Result<Vec<VerificationRecord>, GatewayError> {
    let parsed: BatchResponse = serde_json::from_slice(bytes)?;
    if parsed.records.is_empty() && requested > 0 {
        return Err(GatewayError::EmptyResponse { requested });
    }
    Ok(parsed.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivcheck_core::{AddressId, AddressSubtype};

    #[test]
    fn verify_url_uses_mode_endpoint() {
        let gateway = HttpGateway::new(GatewayConfig {
            endpoint: "http://localhost:4000/".into(),
            sandbox_endpoint: Some("http://localhost:4001".into()),
            sandbox: true,
            ..GatewayConfig::default()
        })
        .unwrap();
        assert_eq!(gateway.verify_url(), "http://localhost:4001/v1/records/verify");
    }

    #[test]
    fn batch_request_json_shape() {
        let records = vec![VerificationRequest {
            record_id: AddressId(42),
            country_code: "DE".into(),
            postal_code: "53113".into(),
            city: "Bonn".into(),
            street_name: "Charles-de-Gaulle-Straße".into(),
            street_number: "20".into(),
            first_name: "Max".into(),
            last_name: "Mustermann".into(),
        }];
        let body = BatchRequest {
            profile: "shop-de",
            records: &records,
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();
        assert_eq!(json["profile"], "shop-de");
        assert_eq!(json["records"][0]["record_id"], 42);
        assert_eq!(json["records"][0]["street_number"], "20");
    }

    #[test]
    fn batch_response_parses_records() {
        let json = r#"{
            "records": [
                {
                    "record_id": 42,
                    "person": { "first_name": "Max", "last_name": "Mustermann" },
                    "parcel_station": { "number": "112", "postal_code": "53113", "city": "Bonn" },
                    "status_codes": ["PDC050105", "BAC000111"]
                },
                { "record_id": 43, "status_codes": [] }
            ]
        }"#;
        let parsed: BatchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].subtype(), AddressSubtype::ParcelStation);
        assert_eq!(parsed.records[1].record_id, AddressId(43));
    }

    #[test]
    fn batch_response_without_records() {
        let parsed: BatchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn status_error_mapping() {
        let cases = [
            (StatusCode::UNAUTHORIZED, true),
            (StatusCode::FORBIDDEN, true),
            (StatusCode::BAD_REQUEST, false),
            (StatusCode::NOT_FOUND, false),
            (StatusCode::INTERNAL_SERVER_ERROR, false),
            (StatusCode::SERVICE_UNAVAILABLE, false),
        ];
        for (status, authentication) in cases {
            let err = status_error(status, "body".into());
            assert_eq!(err.is_authentication(), authentication, "{status}");
            match err {
                GatewayError::Authentication(body) => assert_eq!(body, "body"),
                GatewayError::Service { status: code, body } => {
                    assert_eq!(code, status.as_u16());
                    assert_eq!(body, "body");
                }
                other => panic!("unexpected error for {status}: {other}"),
            }
        }
    }

    #[test]
    fn empty_records_for_a_batch_is_an_error() {
        let err = parse_records(br#"{ "records": [] }"#, 3).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse { requested: 3 }));

        let err = parse_records(b"{}", 1).unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse { requested: 1 }));

        assert!(parse_records(b"{}", 0).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_a_json_error() {
        let err = parse_records(b"<html>", 1).unwrap_err();
        assert!(matches!(err, GatewayError::Json(_)));
    }

    #[test]
    fn records_are_passed_through() {
        let body = br#"{ "records": [ { "record_id": 7, "status_codes": ["PDC050105"] } ] }"#;
        let records = parse_records(body, 1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, AddressId(7));
    }
}
