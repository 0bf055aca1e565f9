use log::{debug, error};
use reqwest_middleware::{
    reqwest::{StatusCode, Url},
    ClientWithMiddleware,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("problem sending request to payment gateway: {0}")]
    Send(#[from] reqwest_middleware::Error),
    #[error("problem reading payment gateway response: {0}")]
    Decode(#[from] reqwest_middleware::reqwest::Error),
    #[error("invalid payment gateway url: {0}")]
    Url(String),
    #[error("payment gateway rejected request with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount in the currency's minor unit (cents for usd)
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<String>,
}

impl PaymentIntentRequest {
    pub fn card(amount: i64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            payment_method_types: vec![String::from("card")],
        }
    }

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("amount", self.amount.to_string()),
            ("currency", self.currency.clone()),
        ];
        fields.extend(
            self.payment_method_types
                .iter()
                .map(|method| ("payment_method_types[]", method.clone())),
        );
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    message: String,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, Error>;
}

#[derive(Clone)]
pub struct StripeClient {
    pub base_url: Url,
    pub client: ClientWithMiddleware,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(client: ClientWithMiddleware, base_url: &Url, secret_key: SecretString) -> Self {
        Self {
            base_url: base_url.to_owned(),
            client,
            secret_key,
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, Error> {
        let url = self
            .base_url
            .join("/v1/payment_intents")
            .map_err(|e| Error::Url(e.to_string()))?;
        debug!(
            "creating payment intent for {} {}",
            request.amount, request.currency
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|e| {
                error!("error sending to payment gateway: {}", e);
                Error::Send(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<PaymentIntent>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GatewayErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or(body);
        error!("payment gateway returned {}: {}", status, message);
        Err(Error::Rejected { status, message })
    }
}
