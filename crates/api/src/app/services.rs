//! Infrastructure wiring behind the HTTP handlers.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use bindery_checkout::{
    CheckoutProcessor, FlatRateSource, ProgressSink, QuoteIssuer, QuoteRegistry,
};
use bindery_core::BookId;
use bindery_generation::{BookStore, GenerateError, GenerationRequest, UnitGenerator};
use bindery_infra::books::InMemoryBookStore;
use bindery_infra::gateways::{InMemoryOrderGateway, InMemoryPaymentGateway};
use bindery_infra::jobs::{InMemoryJobStore, JobExecutor, JobExecutorConfig, JobExecutorHandle};
use bindery_infra::rooms::ProgressRooms;
use bindery_infra::worker::GenerationWorker;

use super::AppConfig;

/// Deterministic in-process generator (dev/test). A model-backed generator
/// replaces this behind the same trait in deployment.
struct TemplateGenerator;

impl UnitGenerator for TemplateGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
        unit_count: usize,
    ) -> Result<String, GenerateError> {
        let chapter = match request.kind {
            bindery_generation::GenerationKind::NextUnit => unit_count + 1,
            bindery_generation::GenerationKind::RegenerateUnit => {
                request.target_index.unwrap_or_default() as usize + 1
            }
        };
        Ok(format!("Chapter {chapter}: a freshly generated adventure."))
    }
}

/// Shared service graph, one per process.
pub struct AppServices {
    pub books: Arc<InMemoryBookStore>,
    pub jobs: Arc<InMemoryJobStore>,
    pub executor: JobExecutorHandle,
    pub quotes: Arc<QuoteRegistry>,
    pub issuer: QuoteIssuer,
    pub rooms: Arc<ProgressRooms>,
    pub processor: CheckoutProcessor,
    pub orders: Arc<InMemoryOrderGateway>,
}

pub fn build_services(config: &AppConfig) -> AppServices {
    let books = Arc::new(InMemoryBookStore::new());
    let jobs = InMemoryJobStore::arc();

    let worker = GenerationWorker::new(
        Arc::new(TemplateGenerator),
        books.clone() as Arc<dyn BookStore>,
    );
    let executor = JobExecutor::new(jobs.clone(), Box::new(worker)).spawn(
        JobExecutorConfig::default()
            .with_name("generation-executor")
            .with_poll_interval(Duration::from_millis(25)),
    );

    let quotes = Arc::new(QuoteRegistry::new());
    let issuer = QuoteIssuer::new(
        Box::new(FlatRateSource),
        chrono::Duration::seconds(config.quote_validity_secs),
        config.base_price,
        config.currency.clone(),
    );

    let rooms = Arc::new(ProgressRooms::new());
    let orders = Arc::new(InMemoryOrderGateway::new());
    let payments = Arc::new(InMemoryPaymentGateway::new());
    let processor = CheckoutProcessor::new(
        quotes.clone(),
        orders.clone(),
        payments,
        rooms.clone() as Arc<dyn ProgressSink>,
    );

    AppServices {
        books,
        jobs,
        executor,
        quotes,
        issuer,
        rooms,
        processor,
        orders,
    }
}

/// SSE stream over a book's progress room.
///
/// Lossy: a lagging subscriber skips ahead rather than slowing the
/// publisher down.
pub fn book_progress_stream(
    services: Arc<AppServices>,
    book_id: BookId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.rooms.join(book_id);

    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event("progress").data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
