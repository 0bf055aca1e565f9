use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::info;
use uuid::Uuid;

use super::payments::{Error, PaymentGateway, PaymentIntent, PaymentIntentRequest};

/// In-process gateway for local runs and end to end tests, hands out fake
/// client secrets and remembers every request it saw
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    requests: Arc<RwLock<Vec<PaymentIntentRequest>>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<PaymentIntentRequest> {
        self.requests
            .read()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, Error> {
        let id = format!("pi_mock_{}", Uuid::now_v7().simple());
        info!(
            "mock payment intent {} for {} {}",
            id, request.amount, request.currency
        );

        let intent = PaymentIntent {
            client_secret: format!("{}_secret_{}", id, Uuid::now_v7().simple()),
            id,
            amount: request.amount,
            currency: request.currency.clone(),
        };
        if let Ok(mut requests) = self.requests.write() {
            requests.push(request);
        }
        Ok(intent)
    }
}
