use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, bail};
use clap::Parser;
use relay_core::{
    CancellationSource, CancellationToken, DispatchError, Mediator, MediatorBuilder,
    MediatorConfig, Notification, NotificationHandler, Request, RequestHandler, async_trait,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "relay", about = "Dispatch a few order messages through the mediator")]
struct Args {
    /// JSON mediator config, e.g. {"ambiguity": "first_registered"}
    #[arg(long)]
    config: Option<PathBuf>,

    /// SKU of the order to create
    #[arg(long, default_value = "A1")]
    sku: String,

    /// Make the email handler fail, so the publish stops there
    #[arg(long)]
    fail_email: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderId(String);

#[derive(Debug, thiserror::Error)]
enum OrderError {
    #[error("sku must not be empty")]
    EmptySku,
    #[error("cancelled")]
    Cancelled,
    #[error("email service unavailable")]
    EmailUnavailable,
}

struct CreateOrderRequest {
    sku: String,
}

impl Request for CreateOrderRequest {
    type Response = OrderId;
    type Error = OrderError;
}

/// Never registered; sending it shows the not-found path.
struct DeleteOrderRequest;

impl Request for DeleteOrderRequest {
    type Response = OrderId;
    type Error = OrderError;
}

struct OrderCreated {
    order_id: OrderId,
    sku: String,
}

impl Notification for OrderCreated {
    type Error = OrderError;
}

struct CreateOrderHandler {
    next_id: AtomicU64,
}

#[async_trait]
impl RequestHandler<CreateOrderRequest> for CreateOrderHandler {
    async fn handle(
        &self,
        request: CreateOrderRequest,
        cancel: &CancellationToken,
    ) -> Result<OrderId, OrderError> {
        if cancel.is_cancelled() {
            return Err(OrderError::Cancelled);
        }
        if request.sku.is_empty() {
            return Err(OrderError::EmptySku);
        }
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(OrderId(format!("{}-{n}", request.sku)))
    }
}

struct AuditHandler;

#[async_trait]
impl NotificationHandler<OrderCreated> for AuditHandler {
    async fn handle(&self, event: &OrderCreated, _cancel: &CancellationToken) -> Result<(), OrderError> {
        info!(order_id = %event.order_id.0, sku = %event.sku, "audit: order created");
        Ok(())
    }
}

struct EmailHandler {
    fail: bool,
}

#[async_trait]
impl NotificationHandler<OrderCreated> for EmailHandler {
    async fn handle(&self, event: &OrderCreated, _cancel: &CancellationToken) -> Result<(), OrderError> {
        if self.fail {
            return Err(OrderError::EmailUnavailable);
        }
        info!(order_id = %event.order_id.0, "email: confirmation sent");
        Ok(())
    }
}

/// Installs the global subscriber (`RUST_LOG`, default `info`).
///
/// Safe to call more than once: `try_init` fails once a global subscriber exists, and that
/// first subscriber stays in place.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Err only when already initialised
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<MediatorConfig> {
    let Some(path) = path else {
        return Ok(MediatorConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    MediatorConfig::from_json_str(&json).with_context(|| format!("parsing config {}", path.display()))
}

fn build_mediator(args: &Args, config: MediatorConfig) -> anyhow::Result<Mediator> {
    let mediator = MediatorBuilder::new()
        .config(config)
        .register_request::<CreateOrderRequest, _>(CreateOrderHandler {
            next_id: AtomicU64::new(1),
        })?
        // 登録順 = 実行順: audit → email → metrics
        .register_notification::<OrderCreated, _>(AuditHandler)
        .register_notification::<OrderCreated, _>(EmailHandler {
            fail: args.fail_email,
        })
        .register_notification_fn(|event: &OrderCreated, _cancel| {
            let order_id = event.order_id.0.clone();
            async move {
                info!(%order_id, "metrics: order counted");
                Ok::<_, OrderError>(())
            }
        })
        .expect_request::<CreateOrderRequest>()
        .expect_notification::<OrderCreated>()
        .build()?;
    Ok(mediator)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;
    let mediator = build_mediator(&args, config)?;

    // (A) send: 1 handler → OrderId
    let source = CancellationSource::new();
    let order_id = mediator
        .send_with(
            CreateOrderRequest {
                sku: args.sku.clone(),
            },
            &source.token(),
        )
        .await?;
    println!("created order: {}", order_id.0);

    // (B) publish: audit → email → metrics（失敗したらそこで止まる）
    let event = OrderCreated {
        order_id: order_id.clone(),
        sku: args.sku.clone(),
    };
    match mediator.publish(event).await {
        Ok(()) => println!("order created event delivered"),
        Err(DispatchError::Handler(err)) => println!("order created event stopped: {err}"),
        Err(err) => return Err(err.into()),
    }

    // (C) send without a handler
    match mediator.send(DeleteOrderRequest).await {
        Err(err @ DispatchError::HandlerNotFound(_)) => println!("delete order: {err}"),
        Ok(id) => bail!("unexpected handler for DeleteOrderRequest: {}", id.0),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
