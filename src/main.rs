use std::{process, sync::Arc};

use lectern::{
    application::{
        error::AppError,
        query::{ElasticsearchProvider, QueryService, load_document},
        sites,
        warm::WarmService,
    },
    cache::{CacheConfig, ContentCacheWarmer, FsContentSource},
    config::{self, Command, QueryArgs, Settings, WarmArgs},
    graphql::{DefaultFieldNameCodec, FetcherConfig},
    infra::telemetry,
    site::SiteRegistry,
};
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let messages = error.messages();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?messages, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let registry = Arc::new(SiteRegistry::from_settings(
        &settings.sites,
        CacheConfig::from(&settings.cache),
    ));

    let result = match cli_args.command {
        Command::Warm(args) => run_warm(&registry, args).await,
        Command::Query(args) => run_query(&settings, &registry, args).await,
        Command::Sites(_) => run_sites(&registry),
    };

    registry.clear();
    result
}

async fn run_warm(registry: &Arc<SiteRegistry>, args: WarmArgs) -> Result<(), AppError> {
    let source = Arc::new(FsContentSource::new(registry.root()));
    let service = WarmService::new(
        Arc::clone(registry),
        Arc::new(ContentCacheWarmer::new(source)),
    );

    let report = service.warm(&args.site, args.switch_cache).await?;
    info!(
        target: "lectern::warm",
        site = %report.site,
        warmed = report.warmed,
        evicted = report.evicted,
        skipped = report.skipped,
        "Warm-up finished"
    );
    print_json(&json!({
        "site": report.site,
        "switched": report.switched,
        "warmed": report.warmed,
        "evicted": report.evicted,
        "skipped": report.skipped,
        "generation": report.generation,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    }))
}

async fn run_query(
    settings: &Settings,
    registry: &Arc<SiteRegistry>,
    args: QueryArgs,
) -> Result<(), AppError> {
    let env = load_document(&args.document).await?;
    let service = QueryService::new(
        Arc::clone(registry),
        Arc::new(ElasticsearchProvider::new(settings.search.clone())),
        Arc::new(DefaultFieldNameCodec),
        FetcherConfig::from(&settings.graphql),
    );

    let result = service.run(&args.site, &env).await?;
    print_json(&json!({ env.field.name.as_str(): result }))
}

fn run_sites(registry: &SiteRegistry) -> Result<(), AppError> {
    let overview = sites::overview(registry)?;
    print_json(&json!(overview))
}

fn print_json(value: &serde_json::Value) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
