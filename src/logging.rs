use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Per-request metadata, stamped on arrival via the request-local cache:
/// a process-wide sequence number and the arrival time.
#[derive(Debug, Copy, Clone)]
pub struct RequestStamp {
    pub id: usize,
    pub arrived: Instant,
}

impl RequestStamp {
    /// Stamp with the next sequence number. The counter wraps back to zero
    /// if you somehow exceed a usize.
    fn next() -> RequestStamp {
        static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestStamp {
            id: REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed),
            arrived: Instant::now(),
        }
    }
}

/// A rocket fairing that logs every request and response, with per-request
/// IDs and latency. Only the method, route, and status are logged; request
/// bodies can contain credentials and must never appear in the log.
#[derive(Debug, Copy, Clone)]
pub struct LoggerFairing;

#[rocket::async_trait]
impl Fairing for LoggerFairing {
    fn info(&self) -> Info {
        Info {
            name: "Logger",
            kind: Kind::Liftoff | Kind::Request | Kind::Response | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let config = rocket.config();
        let protocol = if config.tls_enabled() { "https" } else { "http" };
        info!(
            "Serving on {protocol}://{}:{}",
            config.address, config.port
        );
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let stamp = req.local_cache(RequestStamp::next);
        info!("#{} {} {}", stamp.id, req.method(), req.uri());
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let stamp = req.local_cache(RequestStamp::next);
        let status = res.status();
        let elapsed = stamp.arrived.elapsed().as_millis();
        // Log the matched route by name where there is one; unrouted
        // requests (404s on arbitrary paths) fall back to the raw method.
        let target = match req.route() {
            Some(route) => match route.name {
                Some(ref name) => name.to_string(),
                None => route.uri.to_string(),
            },
            None => format!("unrouted {}", req.method()),
        };
        let line = format!("#{} {} -> {} in {elapsed}ms", stamp.id, target, status.code);
        match status.class() {
            StatusClass::ServerError => error!("{line}"),
            StatusClass::ClientError => warn!("{line}"),
            _ => info!("{line}"),
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
    }
}
