use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam between the pipeline and the HTTP stack, so callers can decorate or
/// replace how feed requests are executed.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
