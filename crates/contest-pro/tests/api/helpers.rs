use async_trait::async_trait;
use contest_pro::{
    app, build_app_with_gateway, infra::payments_mock::MockPaymentGateway, DBConnection,
    DBSettings, PaymentError as Error, PaymentGateway, PaymentIntent, PaymentIntentRequest,
    Settings,
};
use mockall::mock;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{Arc, Once},
};
use tokio::net::TcpListener;

static INIT_LOGGER: Once = Once::new();

pub const TEST_SECRET: &str = "integration-test-secret";

mock! {
    #[derive(Send, Sync)]
    pub StripeGateway { }

    #[async_trait]
    impl PaymentGateway for StripeGateway {
        async fn create_payment_intent(
            &self,
            request: PaymentIntentRequest,
        ) -> Result<PaymentIntent, Error>;
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub users_db: DBConnection,
}

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.db_settings = DBSettings::testing();
    settings.auth_settings.jwt_secret = String::from(TEST_SECRET);
    settings
}

/// Serves the full router on an ephemeral port with fresh in-memory databases
pub async fn spawn_app(gateway: Arc<dyn PaymentGateway>) -> TestApp {
    init_logger();
    let settings = test_settings();
    let (state, mut db_connections) = build_app_with_gateway(settings.clone(), gateway)
        .await
        .expect("failed to build app");
    let users_db = db_connections.remove(0);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let address = listener.local_addr().unwrap();
    let router = app(state, settings.api_settings.origins);
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });

    TestApp {
        address: format!("http://{}", address),
        client: Client::new(),
        users_db,
    }
}

pub async fn spawn_app_with_mock_gateway() -> (TestApp, MockPaymentGateway) {
    let gateway = MockPaymentGateway::new();
    let app = spawn_app(Arc::new(gateway.clone())).await;
    (app, gateway)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn token_for(&self, email: &str) -> String {
        let response = self
            .client
            .post(self.url("/jwt"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn register(&self, email: &str, name: &str) -> Value {
        self.client
            .post(self.url("/users"))
            .json(&json!({ "email": email, "name": name }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Registers the user, promotes them straight in the database and returns their token
    pub async fn admin_token(&self, email: &str) -> String {
        self.register(email, "Admin").await;
        sqlx::query("UPDATE users SET role = 'admin' WHERE email = ?")
            .bind(email)
            .execute(self.users_db.write())
            .await
            .unwrap();
        self.token_for(email).await
    }

    pub async fn user_token(&self, email: &str) -> String {
        self.register(email, "User").await;
        self.token_for(email).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Response {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn patch(&self, path: &str, token: &str) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Creates a contest as `creator` and returns its id
    pub async fn create_contest(&self, token: &str, title: &str, contest_type: &str) -> String {
        let response = self
            .post(
                "/contests",
                Some(token),
                json!({
                    "title": title,
                    "price": 10,
                    "prize": 500,
                    "contestType": contest_type,
                    "deadline": "2030-01-01",
                }),
            )
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["insertedId"].as_str().unwrap().to_string()
    }
}
