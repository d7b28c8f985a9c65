use anyhow::{Context as _, Result};
use sidepanel::core::config_manager;
use sidepanel::core::prefs::{PrefRegistry, register_browser_prefs};
use sidepanel::{Config, DomainBinding, HostWindow, PanelCoordinator, PanelEvent};
use sidepanel_services::{DataSource, LoggingDomainService};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = parse_config_path();
    let config = match config_manager::load_config_from(&config_path) {
        Ok(config) => {
            log::info!("Config loaded from {}", config_path.display());
            config
        }
        Err(e) => {
            log::error!("{:#}", e);
            log::warn!("Falling back to the embedded default config");
            config_manager::load_default_config()?
        }
    };

    let mut prefs = PrefRegistry::new();
    register_browser_prefs(&mut prefs).context("failed to register browser preferences")?;
    log::info!(
        "Toolbar labels: {}",
        if prefs.show_toolbar_labels()? { "shown" } else { "hidden" }
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("sidepanel-domain")
        .enable_all()
        .build()
        .context("failed to start the domain runtime")?;

    run_window(&config, runtime.handle().clone());

    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

/// Drive one host window through a full panel lifecycle
fn run_window(config: &Config, runtime: tokio::runtime::Handle) {
    let service = Arc::new(LoggingDomainService::new(config.endpoints.clone()));
    let binding = DomainBinding::new(service, runtime);

    let window = HostWindow::new(config.content_context());
    let (tx, rx) = mpsc::channel();
    window.panel_bus().subscribe(move |event| {
        if matches!(event, PanelEvent::FetchCompleted { .. }) {
            if let Err(e) = tx.send(event.clone()) {
                log::debug!("Event loop gone, dropping event for {}: {}", event.panel_id(), e);
            }
        }
    });

    let installed = window.install_panels(&config.panels, Some(&binding));
    for (id, e) in &installed.failed {
        log::warn!("Panel {} unavailable: {}", id, e);
    }
    let Some(registry) = window.registry() else {
        return;
    };

    let mut views = Vec::new();
    for coordinator in &installed.coordinators {
        let id = coordinator.id().clone();
        let view = match registry.open(&id) {
            Ok(view) => view,
            Err(e) => {
                log::error!("Failed to open panel {}: {}", id, e);
                continue;
            }
        };
        log::info!(
            "Panel {} showing {} in view {}",
            id,
            view.url().map(ToString::to_string).unwrap_or_default(),
            view.id()
        );
        views.push((id.clone(), view));

        if coordinator.has_domain_service() {
            match coordinator.request_fetch(DataSource::Sentinel2) {
                Ok(request_id) => log::info!("Panel {} dispatched request {}", id, request_id),
                Err(e) => log::error!("Failed to dispatch request for {}: {}", id, e),
            }
        }
    }

    pump_events(&rx, &installed.coordinators);

    for (id, view) in views {
        drop(view);
        if let Err(e) = registry.close(&id) {
            log::error!("Failed to close panel {}: {}", id, e);
        }
    }

    let stats = window.panel_bus().stats();
    log::info!(
        "Panel bus: {} published, {} delivered",
        stats.events_published,
        stats.events_delivered
    );
    window.destroy();
}

/// UI-thread event loop: handle delivered results once per frame, never
/// waiting on a single request, until nothing is in flight or time runs out
fn pump_events(rx: &mpsc::Receiver<PanelEvent>, coordinators: &[Rc<PanelCoordinator>]) {
    let deadline = Instant::now() + REQUEST_TIMEOUT;
    loop {
        // Sampled before draining so a result published by a just-finished
        // request is handled in this frame
        let pending: usize = coordinators.iter().map(|c| c.pending_requests()).sum();
        rx.try_iter().for_each(handle_event);

        if pending == 0 {
            break;
        }
        if Instant::now() >= deadline {
            log::warn!("{} request(s) still pending, closing panels anyway", pending);
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
}

fn handle_event(event: PanelEvent) {
    if let PanelEvent::FetchCompleted {
        panel_id,
        request_id,
        result,
        ..
    } = event
    {
        match result {
            Ok(data) => log::info!(
                "Panel {} request {} returned {} scene(s) from {}",
                panel_id,
                request_id,
                data.scenes.len(),
                data.endpoint
            ),
            Err(e) => log::warn!("Panel {} request {} failed: {}", panel_id, request_id, e),
        }
    }
}

/// Parse config path from command line arguments or use user data directory
fn parse_config_path() -> PathBuf {
    let mut args = std::env::args().skip(1);

    while let Some(flag) = args.next() {
        if flag == "--config" {
            if let Some(value) = args.next() {
                return PathBuf::from(value);
            }
        }
    }

    match config_manager::initialize_user_config() {
        Ok(path) => {
            log::info!("Using config from user data directory: {}", path.display());
            path
        }
        Err(e) => {
            log::error!("Failed to initialize user config: {}", e);
            let fallback = config_manager::get_user_config_path_or_temp();
            if let Err(err) = config_manager::ensure_default_config_at(&fallback) {
                log::error!(
                    "Failed to create fallback config at {}: {}",
                    fallback.display(),
                    err
                );
            }
            log::warn!("Falling back to {}", fallback.display());
            fallback
        }
    }
}
