pub async fn index() -> &'static str {
    "Contest Pro is running!"
}
