use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use super::*;
use crate::domain::TestDefinition;
use crate::error::{AppError, AppResult};
use crate::runtime::RunContext;

const COMPLETION_LIMIT: Duration = Duration::from_secs(5);

async fn serve_status(status_line: &'static str) -> AppResult<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            tokio::spawn(answer(stream, status_line));
        }
    });
    Ok(addr)
}

async fn answer(mut stream: TcpStream, status_line: &'static str) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => request.extend_from_slice(chunk.get(..read).unwrap_or_default()),
        }
    }
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        status_line
    );
    if stream.write_all(response.as_bytes()).await.is_ok() {
        drop(stream.shutdown().await);
    }
}

fn context_for(definition: &TestDefinition, lifetime: Duration) -> Arc<RunContext> {
    Arc::new(RunContext::new(
        Uuid::new_v4(),
        definition.id,
        Instant::now()
            .checked_add(lifetime)
            .unwrap_or_else(Instant::now),
        definition.pool_size(),
        Vec::new(),
    ))
}

fn fast_executor() -> HttpExecutor {
    HttpExecutor::new(HttpExecutorSettings {
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_millis(500),
        ..HttpExecutorSettings::default()
    })
}

async fn run_until_complete(
    definition: &TestDefinition,
    context: &Arc<RunContext>,
) -> AppResult<()> {
    let (completion, done_rx) = Completion::channel(context.run_id());
    fast_executor().execute(definition, Arc::clone(context), completion)?;
    wait_done(done_rx).await
}

async fn wait_done(done_rx: oneshot::Receiver<()>) -> AppResult<()> {
    match tokio::time::timeout(COMPLETION_LIMIT, done_rx).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) => Err(AppError::validation("completion dropped without firing")),
        Err(_) => Err(AppError::validation("executor never completed")),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn records_successful_requests_until_deadline() -> AppResult<()> {
    let addr = serve_status("200 OK").await?;
    let definition = TestDefinition::new(format!("http://{}/", addr), 2, 1);
    let context = context_for(&definition, Duration::from_millis(300));

    run_until_complete(&definition, &context).await?;
    let report = context.snapshot();
    if report.total_requests == 0 || report.fail_count != 0 {
        return Err(AppError::validation(format!("unexpected report {:?}", report)));
    }
    if report.status_code_counts.get(&200) != Some(&report.total_requests) {
        return Err(AppError::validation("every request must count as 200"));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_errors_count_as_failures() -> AppResult<()> {
    let addr = serve_status("503 Service Unavailable").await?;
    let definition = TestDefinition::new(format!("http://{}/", addr), 1, 1);
    let context = context_for(&definition, Duration::from_millis(200));

    run_until_complete(&definition, &context).await?;
    let report = context.snapshot();
    if report.total_requests == 0 || report.fail_count != report.total_requests {
        return Err(AppError::validation(format!("unexpected report {:?}", report)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_target_records_transport_failures() -> AppResult<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let definition = TestDefinition::new(format!("http://{}/", addr), 1, 1);
    let context = context_for(&definition, Duration::from_millis(300));

    run_until_complete(&definition, &context).await?;
    let report = context.snapshot();
    if report.total_requests == 0 || report.status_code_counts.get(&0) != Some(&report.fail_count) {
        return Err(AppError::validation(format!("unexpected report {:?}", report)));
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_ends_run_before_deadline() -> AppResult<()> {
    let addr = serve_status("200 OK").await?;
    let definition = TestDefinition::new(format!("http://{}/", addr), 2, 60);
    let context = context_for(&definition, Duration::from_secs(60));
    let (completion, done_rx) = Completion::channel(context.run_id());
    fast_executor().execute(&definition, Arc::clone(&context), completion)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    context.cancel();
    wait_done(done_rx).await?;
    if started.elapsed() > Duration::from_secs(3) {
        return Err(AppError::validation("cancel must end the run promptly"));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn invalid_target_fails_to_launch() -> AppResult<()> {
    let definition = TestDefinition::new("not a url", 1, 1);
    let context = context_for(&definition, Duration::from_secs(1));
    let (completion, done_rx) = Completion::channel(context.run_id());
    if fast_executor()
        .execute(&definition, context, completion)
        .is_ok()
    {
        return Err(AppError::validation("invalid url must not launch"));
    }
    if done_rx.await.is_ok() {
        return Err(AppError::validation("failed launch must drop the completion"));
    }
    Ok(())
}
