use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rocket::{
    fairing::{Fairing, Info, Kind},
    http::StatusClass,
    Data, Orbit, Request, Response, Rocket,
};

use crate::config::Config;
use crate::model::{
    api::auth::{AuthToken, Voter, AUTH_TOKEN_COOKIE},
    store::CampaignStore,
};

/// Pairs up the request and response log lines of one exchange.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct RequestId(pub usize);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl RequestId {
    /// Atomically get the next ID. Wraps around to zero on overflow.
    pub fn next() -> RequestId {
        static REQUEST_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        RequestId(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// When the request arrived.
struct Received(Instant);

/// Describe who is making the request, without rejecting anything.
/// Authorization happens in the route guards.
fn actor(req: &Request<'_>) -> String {
    let config = match req.rocket().state::<Config>() {
        Some(config) => config,
        None => return "-".to_string(),
    };
    match req.cookies().get(AUTH_TOKEN_COOKIE) {
        // The rights are reported as found, whatever the route requires.
        Some(cookie) => match AuthToken::<Voter>::from_cookie(cookie, config) {
            Ok(token) => format!("{}:{}", token.rights, token.id),
            Err(_) => "invalid-session".to_string(),
        },
        None => "anonymous".to_string(),
    }
}

/// A rocket fairing that logs launch, every request and response, and shutdown.
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
        let protocol = if rocket.config().tls_enabled() {
            "https"
        } else {
            "http"
        };
        let ip = &rocket.config().address;
        let port = &rocket.config().port;
        info!("Server launched on {protocol}://{ip}:{port}");

        if let Some(store) = rocket.state::<CampaignStore>() {
            let campaigns = store.campaigns().await;
            let open = campaigns.iter().filter(|c| c.state.is_open()).count();
            info!("Serving {} campaign(s), {open} open for voting", campaigns.len());
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        req.local_cache(|| Received(Instant::now()));
        let id = req.local_cache(RequestId::next);
        info!("->req{id} {} {} as {}", req.method(), req.uri(), actor(req));
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let id = req.local_cache(RequestId::next);
        let elapsed = req.local_cache(|| Received(Instant::now())).0.elapsed();
        let code = res.status();
        let route = match req.route() {
            Some(r) => match r.name {
                Some(ref name) => format!("{name} ({})", r.uri),
                None => r.uri.to_string(),
            },
            None => "UNKNOWN ROUTE".to_string(),
        };
        let log_msg = format!("<-rsp{id} {code} {route} in {}ms", elapsed.as_millis());
        match code.class() {
            StatusClass::ServerError => error!("{log_msg}"),
            StatusClass::ClientError => warn!("{log_msg}"),
            _ => info!("{log_msg}"),
        }
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        warn!("Shutdown requested, stopping gracefully...");
        if let Some(store) = rocket.state::<CampaignStore>() {
            info!(
                "{} campaign(s) held by the {} store",
                store.campaigns().await.len(),
                store.persistence_name()
            );
        }
    }
}
