//! CinetPay checkout API client (v2).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use dealshop_core::{CurrencyCode, Price};

use super::{
    GatewayStatus, PaymentError, PaymentGateway, PaymentLink, PaymentRequest,
    PaymentVerification,
};
use crate::config::CinetPayConfig;

/// Response code for a created payment.
const CODE_CREATED: &str = "201";

/// Response code for a successful status check.
const CODE_OK: &str = "00";

/// Payment channels offered on the checkout page.
const CHANNELS: &str = "ALL";

/// CinetPay API client.
#[derive(Clone)]
pub struct CinetPayClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    site_id: String,
}

impl std::fmt::Debug for CinetPayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CinetPayClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("site_id", &self.site_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct InitPaymentBody<'a> {
    apikey: &'a str,
    site_id: &'a str,
    transaction_id: &'a str,
    amount: i64,
    currency: &'a str,
    description: &'a str,
    notify_url: &'a str,
    return_url: &'a str,
    channels: &'a str,
}

#[derive(Serialize)]
struct CheckPaymentBody<'a> {
    apikey: &'a str,
    site_id: &'a str,
    transaction_id: &'a str,
}

/// Every CinetPay response shares this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    description: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitPaymentData {
    payment_token: String,
    payment_url: String,
}

#[derive(Debug, Deserialize)]
struct CheckPaymentData {
    amount: Amount,
    currency: String,
    status: String,
}

/// CinetPay sends amounts either as numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(i64),
    Text(String),
}

impl Amount {
    fn to_price(&self) -> Result<Price, PaymentError> {
        match self {
            Self::Number(n) => Ok(Price::new(*n)),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Price::new)
                .map_err(|e| PaymentError::Parse(format!("invalid amount {s:?}: {e}"))),
        }
    }
}

impl CinetPayClient {
    /// Create a new CinetPay client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CinetPayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            site_id: config.site_id.clone(),
        })
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<String, PaymentError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // Business errors come back with 4xx and a JSON envelope; anything
        // else that isn't 2xx is a transport problem.
        if status.is_server_error() {
            return Err(PaymentError::Api {
                code: status.as_u16().to_string(),
                message: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl PaymentGateway for CinetPayClient {
    #[tracing::instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    async fn generate_payment_url(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, PaymentError> {
        let body = InitPaymentBody {
            apikey: self.api_key.expose_secret(),
            site_id: &self.site_id,
            transaction_id: &request.transaction_id,
            amount: request.amount.amount(),
            currency: request.currency.as_str(),
            description: &request.description,
            notify_url: &request.notify_url,
            return_url: &request.return_url,
            channels: CHANNELS,
        };

        let text = self.post("/v2/payment", &body).await?;
        let link = parse_payment_link(&text)?;

        tracing::info!(amount = %request.amount, "payment link created");
        Ok(link)
    }

    #[tracing::instrument(skip(self))]
    async fn verify_payment(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentVerification, PaymentError> {
        let body = CheckPaymentBody {
            apikey: self.api_key.expose_secret(),
            site_id: &self.site_id,
            transaction_id,
        };

        let text = self.post("/v2/payment/check", &body).await?;
        parse_verification(transaction_id, &text)
    }
}

fn parse_envelope<T: for<'de> Deserialize<'de>>(
    text: &str,
    expected_code: &str,
) -> Result<T, PaymentError> {
    let envelope: Envelope<T> =
        serde_json::from_str(text).map_err(|e| PaymentError::Parse(e.to_string()))?;

    if envelope.code != expected_code {
        let message = match envelope.description {
            Some(description) if !description.is_empty() => {
                format!("{}: {description}", envelope.message)
            }
            _ => envelope.message,
        };
        return Err(PaymentError::Api {
            code: envelope.code,
            message,
        });
    }

    envelope
        .data
        .ok_or_else(|| PaymentError::Parse("response has no data".to_owned()))
}

fn parse_payment_link(text: &str) -> Result<PaymentLink, PaymentError> {
    let data: InitPaymentData = parse_envelope(text, CODE_CREATED)?;
    Ok(PaymentLink {
        payment_url: data.payment_url,
        payment_token: data.payment_token,
    })
}

fn parse_verification(transaction_id: &str, text: &str) -> Result<PaymentVerification, PaymentError> {
    let data: CheckPaymentData = parse_envelope(text, CODE_OK)?;
    let currency = data
        .currency
        .parse::<CurrencyCode>()
        .map_err(PaymentError::Parse)?;

    Ok(PaymentVerification {
        status: GatewayStatus::from_gateway(&data.status),
        transaction_id: transaction_id.to_owned(),
        amount: data.amount.to_price()?,
        currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payment_link() {
        let body = r#"{
            "code": "201",
            "message": "CREATED",
            "description": "Transaction created with success",
            "data": {
                "payment_token": "TOKEN_ABC123XYZ",
                "payment_url": "https://checkout.cinetpay.com/payment/TOKEN_ABC123XYZ"
            },
            "api_response_id": "1700000000.1234"
        }"#;

        let link = parse_payment_link(body).unwrap();
        assert_eq!(link.payment_token, "TOKEN_ABC123XYZ");
        assert!(link.payment_url.contains("cinetpay.com"));
    }

    #[test]
    fn test_parse_payment_link_api_error() {
        let body = r#"{
            "code": "608",
            "message": "MINIMUM_REQUIRED_FIELDS",
            "description": "amount must be a multiple of 5",
            "data": null
        }"#;

        match parse_payment_link(body) {
            Err(PaymentError::Api { code, message }) => {
                assert_eq!(code, "608");
                assert!(message.contains("multiple of 5"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_verification_accepted() {
        let body = r#"{
            "code": "00",
            "message": "SUCCES",
            "data": {
                "amount": "10000",
                "currency": "XOF",
                "status": "ACCEPTED",
                "payment_method": "OM"
            }
        }"#;

        let verification = parse_verification("TRX123456", body).unwrap();
        assert_eq!(verification.status, GatewayStatus::Accepted);
        assert_eq!(verification.transaction_id, "TRX123456");
        assert_eq!(verification.amount, Price::new(10000));
        assert_eq!(verification.currency, CurrencyCode::XOF);
    }

    #[test]
    fn test_parse_verification_numeric_amount() {
        let body = r#"{"code":"00","message":"SUCCES","data":{"amount":7600,"currency":"XOF","status":"REFUSED"}}"#;

        let verification = parse_verification("TRX1", body).unwrap();
        assert_eq!(verification.status, GatewayStatus::Refused);
        assert_eq!(verification.amount, Price::new(7600));
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        assert!(matches!(
            parse_verification("TRX1", "<html>bad gateway</html>"),
            Err(PaymentError::Parse(_))
        ));
    }
}
