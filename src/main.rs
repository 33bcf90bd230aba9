use aqi_map::adapters::console::stdout_writer;
use aqi_map::core::{AqiSource, ConfigProvider};
use aqi_map::domain::map::{to_fixed, PopupView};
use aqi_map::utils::error::ErrorSeverity;
use aqi_map::utils::{logger, validation};
use aqi_map::{
    color_for, AqiQueryClient, CliConfig, Command, ConsoleDisplay, ConsoleMapSurface, Coordinate,
    MapConfig, MapInteractionController, MarkerPresenter, Result,
};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;

// 單執行緒事件迴圈：點擊之間靠 await 交錯，不會真的平行
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting aqi-map");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::info!("🔗 Backend: {}", config.backend_url());

    let result = match cli.command() {
        Command::Run { skip_startup } => run_map(&config, skip_startup).await,
        Command::Query { coordinate, raw } => query_once(&config, coordinate, raw).await,
        Command::Forecast { coordinate, hours } => forecast(&config, coordinate, hours).await,
        Command::Ingest => ingest(&config).await,
        Command::Train => train(&config).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ aqi-map failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run_map(config: &MapConfig, skip_startup: bool) -> Result<()> {
    let client = AqiQueryClient::from_config(config)?;
    let out = stdout_writer();
    let presenter = MarkerPresenter::new(ConsoleMapSurface::new(out.clone()), config.marker_defaults());
    let controller = Arc::new(MapInteractionController::new(
        client,
        presenter,
        ConsoleDisplay::new(out),
        config.sequencing(),
    ));

    controller.initialize(&config.map_view()).await;

    let mut tasks = JoinSet::new();

    if !skip_startup {
        let c = controller.clone();
        let coord = config.startup_coordinate();
        tasks.spawn(async move {
            // 失敗只記錄，不影響之後的點擊
            let _ = c.run_startup_query(coord).await;
        });
    }

    tracing::info!("⌨️  Enter `lat,lon` per line to click the map (Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let coord = line
            .parse::<Coordinate>()
            .and_then(|c| validation::validate_coordinate("click", &c).map(|_| c));
        match coord {
            Ok(coord) => {
                let c = controller.clone();
                tasks.spawn(async move {
                    let outcome = c.handle_click(coord).await;
                    tracing::debug!("Click settled: {:?}", outcome);
                });
            }
            Err(e) => tracing::warn!("Ignoring `{}`: {}", line, e),
        }

        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!("Click task failed: {}", e);
            }
        }
    }

    tracing::info!("Input closed, waiting for {} pending queries", tasks.len());
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Click task failed: {}", e);
        }
    }

    tracing::info!("✅ Final status: {}", controller.status().await);
    Ok(())
}

async fn query_once(config: &MapConfig, coord: Coordinate, raw: bool) -> Result<()> {
    validation::validate_coordinate("coordinate", &coord)?;
    let client = AqiQueryClient::from_config(config)?;

    if raw {
        let body = client.query_raw(coord).await?;
        return print_json(&body);
    }

    let reading = client.query(coord).await?;
    println!(
        "Nearest station {} ({})",
        reading.position(),
        color_for(reading.aqi_category.as_deref())
    );
    println!("{}", PopupView::from_reading(&reading));
    Ok(())
}

async fn forecast(config: &MapConfig, coord: Coordinate, hours: u32) -> Result<()> {
    validation::validate_coordinate("coordinate", &coord)?;
    let client = AqiQueryClient::from_config(config)?;

    for point in client.forecast(coord, hours).await? {
        let category = point.aqi_category.as_deref().unwrap_or("Unknown");
        println!(
            "{}  PM2.5 {:>6} µg/m³  {:<14} ({})",
            point.timestamp,
            to_fixed(point.pm25, 1),
            category,
            color_for(point.aqi_category.as_deref())
        );
    }
    Ok(())
}

async fn ingest(config: &MapConfig) -> Result<()> {
    let client = AqiQueryClient::from_config(config)?;
    let body = client.ingest_synthetic().await?;
    tracing::info!("✅ Synthetic ingest finished");
    print_json(&body)
}

async fn train(config: &MapConfig) -> Result<()> {
    let client = AqiQueryClient::from_config(config)?;
    let body = client.train().await?;
    tracing::info!("✅ Model training finished");
    print_json(&body)
}

fn print_json(body: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    Ok(())
}
