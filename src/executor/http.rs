use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::Client;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::domain::{RequestMetricEvent, TestDefinition};
use crate::error::{AppError, AppResult, RunError};
use crate::runtime::RunContext;

use super::{Completion, LoadExecutor};

/// Pause after a transport failure so a dead target is not hammered in a
/// tight loop.
const TRANSPORT_FAILURE_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct HttpExecutorSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpExecutorSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("loadrun/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Closed-loop HTTP GET driver: every virtual user sends its next request as
/// soon as the previous one finished.
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    settings: HttpExecutorSettings,
}

impl HttpExecutor {
    #[must_use]
    pub const fn new(settings: HttpExecutorSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, url: &Url, context: &RunContext) -> AppResult<Client> {
        let mut builder = Client::builder()
            .timeout(self.settings.request_timeout)
            .connect_timeout(self.settings.connect_timeout)
            .user_agent(self.settings.user_agent.as_str());
        // connect only to the addresses that passed validation
        if let Some(Host::Domain(domain)) = url.host()
            && !context.pinned_addrs().is_empty()
        {
            builder = builder.resolve_to_addrs(domain, context.pinned_addrs());
        }
        Ok(builder.build()?)
    }
}

impl LoadExecutor for HttpExecutor {
    fn execute(
        &self,
        definition: &TestDefinition,
        context: Arc<RunContext>,
        completion: Completion,
    ) -> AppResult<()> {
        let run_id = context.run_id();
        let url = Url::parse(&definition.target_url).map_err(|err| {
            AppError::run(RunError::ExecutorLaunch {
                run_id,
                message: format!("invalid target url: {}", err),
            })
        })?;
        let client = self.build_client(&url, &context)?;
        let virtual_users = definition.pool_size();

        tokio::spawn(async move {
            let mut workers = Vec::with_capacity(virtual_users);
            for _ in 0..virtual_users {
                let worker = run_virtual_user(client.clone(), url.clone(), Arc::clone(&context));
                match context.pool().spawn(worker) {
                    Some(handle) => workers.push(handle),
                    None => break,
                }
            }
            info!(run_id = %run_id, workers = workers.len(), "Virtual users started");

            for outcome in join_all(workers).await {
                if let Err(err) = outcome
                    && !err.is_cancelled()
                {
                    warn!(run_id = %run_id, "Virtual user task failed: {}", err);
                }
            }
            debug!(run_id = %run_id, "All virtual users finished");
            completion.complete();
        });
        Ok(())
    }
}

async fn run_virtual_user(client: Client, url: Url, context: Arc<RunContext>) {
    let deadline = context.deadline();
    while context.should_continue() {
        let started = Instant::now();
        let outcome = tokio::select! {
            () = context.cancelled() => break,
            () = sleep_until(deadline) => break,
            outcome = send_request(&client, &url) => outcome,
        };
        let latency_ms = elapsed_ms(started);
        match outcome {
            Ok(status) => context.record(RequestMetricEvent::new(latency_ms, status)),
            Err(err) => {
                debug!(run_id = %context.run_id(), "Request failed: {}", err);
                context.record(RequestMetricEvent::transport_failure(latency_ms));
                sleep(TRANSPORT_FAILURE_BACKOFF).await;
            }
        }
    }
}

/// Sends one GET and drains the body so the connection can be reused.
async fn send_request(client: &Client, url: &Url) -> Result<u16, reqwest::Error> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status().as_u16();
    response.bytes().await?;
    Ok(status)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
