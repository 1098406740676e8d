use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dnsfun_core::{
    Config, DefaultHandler, HelpRecords, Registration, Router, Service, ServiceName,
    ServiceRegistry,
};
use dnsfun_snapshot::restore;
use hickory_proto::rr::Name;
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::control::{ControlMessage, Signals};
use crate::error::{io_err, ServerError};
use crate::listener::listen;
use crate::sweeper::snapshot_loop;

/// Grace period for blocking work (an in-flight refresh) after the loop ends.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Everything built at startup, read-only once serving begins.
pub struct Server {
    registry: Arc<ServiceRegistry>,
    router: Arc<Router>,
    help: Arc<HelpRecords>,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn help(&self) -> &HelpRecords {
        &self.help
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Restore, register every service, then install the help and default
/// handlers. Any structural error here is fatal.
pub fn assemble(config: &Config, registrations: Vec<Registration>) -> Result<Server, ServerError> {
    let bind_addr = config.server.bind_addr()?;
    let mut registry = ServiceRegistry::new();
    let mut router = Router::new();

    for Registration {
        name,
        service,
        snapshot,
    } in registrations
    {
        if snapshot.enabled && service.supports_snapshot() {
            if let Some(file) = snapshot.file.as_deref() {
                restore(&name, service.as_ref(), file);
            }
        }
        registry.register(name, service, &snapshot, &mut router)?;
    }

    let help = Arc::new(HelpRecords::build(
        registry.help_entries(),
        &config.server,
    )?);
    help.clone().install(&mut router)?;
    router.handle(Name::root(), Arc::new(DefaultHandler))?;

    tracing::info!(
        services = registry.len(),
        help_records = help.len(),
        zones = router.zones().len(),
        "registry built",
    );

    Ok(Server {
        registry: Arc::new(registry),
        router: Arc::new(router),
        help,
        bind_addr,
    })
}

/// Start the server runtime and block the current thread until it exits.
pub fn start_blocking(server: Server) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("building tokio runtime", e))?;
    let result = runtime.block_on(run(server));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Bind the configured address, install signal handlers and serve.
pub async fn run(server: Server) -> Result<(), ServerError> {
    let signals = Signals::install()?;
    let addr = server.bind_addr;
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|e| io_err(format!("binding udp {addr}"), e))?;
    tracing::info!(%addr, "listening");

    let (control_tx, control_rx) = mpsc::channel::<ControlMessage>(8);
    let signal_handle = tokio::spawn(signals.forward(control_tx));

    let result = serve(server, socket, control_rx).await;
    signal_handle.abort();
    result
}

/// Serve queries on `socket` until the snapshot loop exits.
///
/// Control messages arrive on `control_rx`; the process ends right after the
/// sweep for a [`ControlMessage::Terminate`] has completed.
pub async fn serve(
    server: Server,
    socket: UdpSocket,
    control_rx: mpsc::Receiver<ControlMessage>,
) -> Result<(), ServerError> {
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let listener_handle = {
        let socket = Arc::new(socket);
        let router = server.router.clone();
        let shutdown = shutdown_tx.subscribe();
        tokio::spawn(listen(socket, router, shutdown))
    };

    let refreshers: Vec<JoinHandle<()>> = server
        .registry
        .iter()
        .filter_map(|entry| {
            let every = entry.service.refresh_interval()?;
            Some(tokio::spawn(refresher(
                entry.name.clone(),
                entry.service.clone(),
                every,
                shutdown_tx.subscribe(),
            )))
        })
        .collect();

    snapshot_loop(server.registry.clone(), control_rx).await;

    let _ = shutdown_tx.send(());
    handle_join("udp_listener", listener_handle.await)?;
    for handle in refreshers {
        // An in-flight refresh is not waited for.
        handle.abort();
    }
    Ok(())
}

/// Call `service.refresh()` every `every`, starting immediately.
async fn refresher(
    name: ServiceName,
    service: Arc<dyn Service>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    if every.is_zero() {
        tracing::warn!(service = %name, "refresh interval is zero, not refreshing");
        return;
    }
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = interval.tick() => {
                let service = service.clone();
                match tokio::task::spawn_blocking(move || service.refresh()).await {
                    Ok(Ok(())) => tracing::debug!(service = %name, "refresh done"),
                    Ok(Err(err)) => tracing::warn!(service = %name, error = %err, "refresh failed"),
                    Err(err) => tracing::error!(service = %name, error = %err, "refresh task failed"),
                }
            }
        }
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), ServerError>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(ServerError::Join(format!("{task} ({err})"))),
    }
}

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` (default
/// `info`). Safe to call more than once.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use dnsfun_core::{ServiceError, ServiceRequest};
    use hickory_proto::rr::Record;

    #[derive(Default)]
    struct Ticking(AtomicUsize);

    impl Service for Ticking {
        fn query(&self, _request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
            Ok(vec![])
        }
        fn refresh(&self) -> Result<(), ServiceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresher_ticks_immediately_and_stops_on_shutdown() {
        let service = Arc::new(Ticking::default());
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let handle = tokio::spawn(refresher(
            ServiceName::from("ticking"),
            service.clone(),
            Duration::from_secs(3600),
            shutdown_tx.subscribe(),
        ));

        for _ in 0..100 {
            if service.0.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(service.0.load(Ordering::SeqCst), 1);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn zero_interval_refresher_returns() {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        refresher(
            ServiceName::from("ticking"),
            Arc::new(Ticking::default()),
            Duration::ZERO,
            shutdown_tx.subscribe(),
        )
        .await;
    }

    #[test]
    fn join_errors_name_the_task() {
        let err = handle_join("udp_listener", Ok(Err(ServerError::Join("x".into())))).unwrap_err();
        assert!(matches!(err, ServerError::Join(_)));
    }
}
