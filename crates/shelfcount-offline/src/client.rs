//! Stock-count client
//!
//! Typed calls against the server, all routed through the [`ClientWorker`] so the cache
//! and the submission queue see every request.

use crate::net::{NetworkError, Request, Response};
use crate::queue::{QueueError, SubmitOutcome};
use crate::worker::ClientWorker;
use shelfcount_core::models::{
    DriveStatusResponse, ProductLookup, StockSubmission, UploadTestRequest, UploadTestResponse,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server answered {status}: {message}")]
    Server { status: u16, message: String },
}

fn server_error(response: &Response) -> ClientError {
    let message = response
        .json::<serde_json::Value>()
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| response.text());
    ClientError::Server {
        status: response.status,
        message,
    }
}

fn expect_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.is_success() {
        return Err(server_error(&response));
    }
    Ok(response.json()?)
}

#[derive(Clone)]
pub struct StockClient {
    worker: Arc<ClientWorker>,
}

impl StockClient {
    pub fn new(worker: Arc<ClientWorker>) -> Self {
        Self { worker }
    }

    pub fn worker(&self) -> &Arc<ClientWorker> {
        &self.worker
    }

    /// Look up a product by barcode. `None` when the catalog does not know it.
    pub async fn lookup_product(&self, barcode: &str) -> Result<Option<ProductLookup>, ClientError> {
        let request = Request::get(format!("/get_product/{}", urlencoding::encode(barcode)));
        let served = self.worker.on_fetch(&request).await?;
        if served.response.status == 404 {
            tracing::debug!(barcode = %barcode, "Product not found");
            return Ok(None);
        }
        let mut product: ProductLookup = expect_json(served.response)?;
        if product.barcode.is_empty() {
            product.barcode = barcode.to_string();
        }
        Ok(Some(product))
    }

    /// Send a stock count. When the server cannot be reached the submission is queued and
    /// replayed on the next reconnect.
    pub async fn submit_stock(&self, submission: &StockSubmission) -> Result<SubmitOutcome, ClientError> {
        let request = Request::post_json("/submit_stock", submission)?;
        let outcome = self.worker.submit(request).await?;
        if let SubmitOutcome::Sent(response) = &outcome {
            if !response.is_success() {
                return Err(server_error(response));
            }
        }
        Ok(outcome)
    }

    pub async fn test_upload(
        &self,
        branch: &str,
        image_data: String,
    ) -> Result<UploadTestResponse, ClientError> {
        let body = UploadTestRequest {
            image_data,
            branch: branch.to_string(),
        };
        let request = Request::post_json("/test_upload", &body)?;
        let served = self.worker.on_fetch(&request).await?;
        expect_json(served.response)
    }

    pub async fn drive_status(&self) -> Result<DriveStatusResponse, ClientError> {
        let served = self.worker.on_fetch(&Request::get("/drive_status")).await?;
        expect_json(served.response)
    }

    pub async fn authorize_drive(&self, access_token: &str) -> Result<DriveStatusResponse, ClientError> {
        let request = Request::post_json(
            "/authorize_drive",
            &serde_json::json!({ "access_token": access_token }),
        )?;
        let served = self.worker.on_fetch(&request).await?;
        expect_json(served.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::net::{Network, ResponseKind};
    use crate::queue::MemoryQueueStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fixed answers keyed by path; anything else is unreachable.
    #[derive(Default)]
    struct CannedNetwork {
        answers: Mutex<Vec<(String, u16, String)>>,
        bodies: Mutex<Vec<Vec<u8>>>,
    }

    impl CannedNetwork {
        fn answer(&self, path: &str, status: u16, body: &str) {
            self.answers
                .lock()
                .unwrap()
                .push((path.to_string(), status, body.to_string()));
        }
    }

    #[async_trait]
    impl Network for CannedNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            if let Some(body) = &request.body {
                self.bodies.lock().unwrap().push(body.clone());
            }
            let answers = self.answers.lock().unwrap();
            match answers.iter().find(|(path, _, _)| *path == request.url) {
                Some((_, status, body)) => Ok(Response::new(*status, body.clone(), ResponseKind::Basic)),
                None => Err(NetworkError::Unreachable {
                    url: request.url.clone(),
                    reason: "offline".to_string(),
                }),
            }
        }
    }

    fn client(network: Arc<CannedNetwork>) -> StockClient {
        let worker = ClientWorker::new(
            Arc::new(MemoryCacheStore::new()),
            Arc::new(MemoryQueueStore::default()),
            network,
        );
        StockClient::new(Arc::new(worker))
    }

    fn submission() -> StockSubmission {
        StockSubmission {
            barcode: "8850999320014".to_string(),
            product_name: "Drinking water".to_string(),
            quantity: 12,
            branch: "CITY".to_string(),
            manual_product_name: None,
            image_data: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_normalizes_product_name() {
        let network = Arc::new(CannedNetwork::default());
        network.answer(
            "/get_product/8850999320014",
            200,
            r#"{"product_name":"Drinking water","selling_price":7.0}"#,
        );
        let client = client(network);

        let product = client.lookup_product("8850999320014").await.unwrap().unwrap();
        assert_eq!(product.name.as_deref(), Some("Drinking water"));
        assert_eq!(product.barcode, "8850999320014");
    }

    #[tokio::test]
    async fn test_lookup_unknown_barcode() {
        let network = Arc::new(CannedNetwork::default());
        network.answer("/get_product/a%2Fb", 404, r#"{"error":"not found"}"#);
        let client = client(network);
        assert_eq!(client.lookup_product("a/b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offline_submission_is_queued() {
        let network = Arc::new(CannedNetwork::default());
        let client = client(network.clone());

        let outcome = client.submit_stock(&submission()).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued(_)));
        assert_eq!(client.worker().pending_submissions().await.unwrap().len(), 1);

        network.answer("/submit_stock", 200, r#"{"success":true}"#);
        let report = client.worker().on_reconnect().await.unwrap();
        assert_eq!(report.replayed, 1);

        let sent: StockSubmission = serde_json::from_slice(&network.bodies.lock().unwrap()[1]).unwrap();
        assert_eq!(sent, submission());
    }

    #[tokio::test]
    async fn test_rejected_submission_surfaces_server_error() {
        let network = Arc::new(CannedNetwork::default());
        network.answer("/submit_stock", 400, r#"{"error":"quantity is required"}"#);
        let client = client(network);

        match client.submit_stock(&submission()).await {
            Err(ClientError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "quantity is required");
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(client.worker().pending_submissions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drive_status() {
        let network = Arc::new(CannedNetwork::default());
        network.answer(
            "/drive_status",
            200,
            r#"{"authorized":false,"message":"Direct storage access not authorized"}"#,
        );
        let status = client(network).drive_status().await.unwrap();
        assert!(!status.authorized);
    }
}
