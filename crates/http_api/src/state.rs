use app_api::AppContext;

#[derive(Clone)]
pub struct HttpState {
    pub context: AppContext,
    /// Bearer token required on ingest routes. `None` leaves them open.
    pub ingest_token: Option<String>,
}

impl HttpState {
    pub fn new(context: AppContext, ingest_token: Option<String>) -> Self {
        let ingest_token = ingest_token.filter(|token| !token.trim().is_empty());
        Self {
            context,
            ingest_token,
        }
    }
}
