use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use json_structs::output::AirQualityReading;
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::FeedConfig;
use crate::decode::{decode_response, parse_json};
use crate::error::{FeedError, Result};
use crate::request::LocationRequest;
use crate::transport::{HttpTransport, Transport};

/// Runs [`LocationRequest`]s against the feed.
///
/// One transport is shared by every call. Asynchronous calls run on a
/// worker pool owned by the client; dropping the client cancels calls that
/// are still in flight.
pub struct FeedClient<T = HttpTransport> {
    transport: Arc<T>,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl FeedClient<HttpTransport> {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url)?;
        Self::with_transport(transport, config.worker_threads)
    }
}

impl<T> FeedClient<T>
where
    T: Transport + 'static,
{
    pub fn with_transport(transport: T, worker_threads: usize) -> Result<Self> {
        if worker_threads == 0 {
            return Err(FeedError::Config("worker_threads must be at least 1".into()));
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("fetch-feed-worker")
            .enable_all()
            .build()
            .map_err(FeedError::Runtime)?;

        Ok(FeedClient {
            transport: Arc::new(transport),
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Fetches the raw response tree, blocking the current thread.
    ///
    /// Fails with [`FeedError::BlockingInAsync`] inside an asynchronous
    /// execution context; use [`call_async`](Self::call_async) there.
    pub fn call_sync(&self, request: &LocationRequest) -> Result<Value> {
        ensure_blocking_allowed()?;
        self.handle.block_on(perform(
            self.transport.as_ref(),
            request,
            CancellationToken::new(),
        ))
    }

    /// Fetches the raw response tree on the worker pool.
    pub fn call_async(
        &self,
        request: &LocationRequest,
        cancel: CancellationToken,
    ) -> PendingCall<Value> {
        let transport = Arc::clone(&self.transport);
        let request = request.clone();
        self.spawn(async move { perform(transport.as_ref(), &request, cancel).await })
    }

    /// Fetches and decodes a reading, blocking the current thread.
    ///
    /// Same restriction as [`call_sync`](Self::call_sync).
    pub fn request_sync(&self, request: &LocationRequest) -> Result<AirQualityReading> {
        decode_response(self.call_sync(request)?)
    }

    /// Fetches and decodes a reading on the worker pool.
    pub fn request_async(
        &self,
        request: &LocationRequest,
        cancel: CancellationToken,
    ) -> PendingCall<AirQualityReading> {
        let transport = Arc::clone(&self.transport);
        let request = request.clone();
        self.spawn(async move {
            let root = perform(transport.as_ref(), &request, cancel).await?;
            decode_response(root)
        })
    }

    fn spawn<R, F>(&self, work: F) -> PendingCall<R>
    where
        F: Future<Output = Result<R>> + Send + 'static,
        R: Send + 'static,
    {
        PendingCall {
            inner: self.handle.spawn(work),
            handle: self.handle.clone(),
        }
    }
}

impl<T> Drop for FeedClient<T> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn perform<T>(
    transport: &T,
    request: &LocationRequest,
    cancel: CancellationToken,
) -> Result<Value>
where
    T: Transport + ?Sized,
{
    let path = request.endpoint()?;
    let mut query = request.parameters();
    // The token is not checked here; the feed reports a bad one in its envelope.
    query.push(("token".to_string(), request.access_token().to_string()));

    debug!("requesting {}", path);
    let body = transport.get(&path, query, cancel).await?;
    parse_json(&body)
}

/// Outcome of a call running on the worker pool.
///
/// Await it from asynchronous code or [`wait`](PendingCall::wait) on it.
#[must_use = "the call's result is only available through its PendingCall"]
pub struct PendingCall<R> {
    inner: JoinHandle<Result<R>>,
    handle: Handle,
}

impl<R> PendingCall<R> {
    /// Blocks until the call finishes.
    ///
    /// Fails with [`FeedError::BlockingInAsync`] inside an asynchronous
    /// execution context, where the call should be awaited instead. The call
    /// itself keeps running.
    pub fn wait(self) -> Result<R> {
        ensure_blocking_allowed()?;
        let handle = self.handle.clone();
        handle.block_on(self)
    }
}

impl<R> Future for PendingCall<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner
            .poll_unpin(cx)
            .map(|joined| joined.unwrap_or_else(|err| Err(worker_failure(err))))
    }
}

// `block_on` panics on a thread that is already driving a runtime.
fn ensure_blocking_allowed() -> Result<()> {
    if Handle::try_current().is_ok() {
        error!("blocking feed call attempted from within an async context");
        return Err(FeedError::BlockingInAsync);
    }
    Ok(())
}

fn worker_failure(err: JoinError) -> FeedError {
    if err.is_cancelled() {
        return FeedError::Cancelled;
    }
    error!("feed worker failed: {}", err);
    FeedError::Worker(err.to_string())
}
