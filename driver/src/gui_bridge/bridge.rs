use crate::gui_bridge::model::{CreatedReply, ErrorReply, ViewQuery, VoteReply};
use crate::workflow::runner::Runner;
use anyhow::Context;
use log::{debug, info};
use serde::Serialize;
use sigmapcore::record::{SignalDraft, SignalId};
use sigmapcore::store::StoreError;
use sigmapcore::votes::{MemoryStorage, VoteCounter, VoteDirection, VoteError, VoteOutcome};
use sigmapcore::{Clock, SignalError};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

const ANONYMOUS_DEVICE: &str = "anonymous";
/// Upper bound on devices whose cooldowns the bridge tracks at once.
const MAX_TRACKED_DEVICES: usize = 10_000;

fn reply<T: Serialize>(body: &T, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error(message: impl Into<String>, status: StatusCode) -> WithStatus<Json> {
    reply(&ErrorReply::new(message), status)
}

fn store_error(err: &StoreError) -> WithStatus<Json> {
    match err {
        StoreError::UnknownId(id) => error(format!("unknown signal {id}"), StatusCode::NOT_FOUND),
        other => error(other.to_string(), StatusCode::SERVICE_UNAVAILABLE),
    }
}

struct DeviceSlot {
    counter: Arc<VoteCounter>,
    last_seen: i64,
}

struct BridgeState {
    runner: Runner,
    // cooldown state per device, held only for the lifetime of the bridge
    devices: Mutex<HashMap<String, DeviceSlot>>,
}

/// HTTP endpoint a map front end talks to.
#[derive(Clone)]
pub struct GuiBridge {
    state: Arc<BridgeState>,
}

impl GuiBridge {
    pub fn new(runner: Runner) -> Self {
        Self {
            state: Arc::new(BridgeState {
                runner,
                devices: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn devices(&self) -> MutexGuard<'_, HashMap<String, DeviceSlot>> {
        self.state
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Counter for `device`. Devices idle for a whole cooldown window have
    /// no live cooldowns left and are dropped first; past the cap the
    /// longest-idle device goes.
    fn counter_for(&self, device: &str) -> Arc<VoteCounter> {
        let runner = &self.state.runner;
        let now = runner.clock().now_millis();
        let window = runner.cooldown().as_millis() as i64;
        let mut devices = self.devices();
        devices.retain(|_, slot| now.saturating_sub(slot.last_seen) < window);

        if !devices.contains_key(device) && devices.len() >= MAX_TRACKED_DEVICES {
            let idlest = devices
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(name, _)| name.clone());
            if let Some(name) = idlest {
                debug!("evicting cooldown state of device {}", name);
                devices.remove(&name);
            }
        }

        let slot = devices
            .entry(device.to_string())
            .or_insert_with(|| DeviceSlot {
                counter: Arc::new(runner.vote_counter(Arc::new(MemoryStorage::new()))),
                last_seen: now,
            });
        slot.last_seen = now;
        slot.counter.clone()
    }

    /// Marks `device` active after its vote, so a cooldown recorded just
    /// now outlives the slot.
    fn touch(&self, device: &str) {
        let now = self.state.runner.clock().now_millis();
        if let Some(slot) = self.devices().get_mut(device) {
            slot.last_seen = now;
        }
    }

    fn rows(&self, query: &ViewQuery) -> WithStatus<Json> {
        match query.sort_state() {
            Ok(sort) => reply(
                &self.state.runner.view(&query.criteria(), sort).rows,
                StatusCode::OK,
            ),
            Err(message) => error(message, StatusCode::BAD_REQUEST),
        }
    }

    fn markers(&self, query: &ViewQuery) -> WithStatus<Json> {
        match query.sort_state() {
            Ok(sort) => reply(
                &self.state.runner.view(&query.criteria(), sort).markers,
                StatusCode::OK,
            ),
            Err(message) => error(message, StatusCode::BAD_REQUEST),
        }
    }

    fn coverage(&self, id: SignalId) -> WithStatus<Json> {
        match self.state.runner.coverage(&id) {
            Ok(Some(circle)) => reply(&circle, StatusCode::OK),
            Ok(None) => error(format!("signal {id} has no coverage"), StatusCode::NOT_FOUND),
            Err(err) => store_error(&err),
        }
    }

    fn create(&self, draft: SignalDraft) -> WithStatus<Json> {
        match self.state.runner.submit(draft) {
            Ok(id) => reply(&CreatedReply { status: "ok", id }, StatusCode::CREATED),
            Err(SignalError::InvalidInput(message)) => error(message, StatusCode::BAD_REQUEST),
            Err(SignalError::Store(err)) => store_error(&err),
        }
    }

    fn vote(&self, id: SignalId, direction: &str, device: Option<String>) -> WithStatus<Json> {
        let direction = match direction.parse::<VoteDirection>() {
            Ok(direction) => direction,
            Err(message) => return error(message, StatusCode::BAD_REQUEST),
        };
        let device = device
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_DEVICE.to_string());

        let result = self.counter_for(&device).vote(&id, direction);
        self.touch(&device);
        match result {
            Ok(VoteOutcome::Accepted { votes }) => reply(&VoteReply::Ok { votes }, StatusCode::OK),
            Ok(outcome @ VoteOutcome::Rejected { remaining }) => reply(
                &VoteReply::Cooldown {
                    remaining_secs: remaining.as_secs().max(1),
                    notice: outcome.notice(),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            Err(VoteError::Store(err)) => store_error(&err),
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let bridge = self.clone();
        let bridge_filter = warp::any().map(move || bridge.clone());

        let list_route = warp::path!("signals")
            .and(warp::get())
            .and(warp::query::<ViewQuery>())
            .and(bridge_filter.clone())
            .map(|query: ViewQuery, bridge: GuiBridge| bridge.rows(&query));

        let markers_route = warp::path!("markers")
            .and(warp::get())
            .and(warp::query::<ViewQuery>())
            .and(bridge_filter.clone())
            .map(|query: ViewQuery, bridge: GuiBridge| bridge.markers(&query));

        let coverage_route = warp::path!("signals" / String / "coverage")
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|id: String, bridge: GuiBridge| bridge.coverage(SignalId::new(id)));

        let create_route = warp::path!("signals")
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter.clone())
            .map(|draft: SignalDraft, bridge: GuiBridge| bridge.create(draft));

        let vote_route = warp::path!("signals" / String / "vote" / String)
            .and(warp::post())
            .and(warp::header::optional::<String>("x-device-id"))
            .and(bridge_filter.clone())
            .map(
                |id: String, direction: String, device: Option<String>, bridge: GuiBridge| {
                    bridge.vote(SignalId::new(id), &direction, device)
                },
            );

        let metrics_route = warp::path!("metrics")
            .and(warp::get())
            .and(bridge_filter)
            .map(|bridge: GuiBridge| {
                reply(&bridge.state.runner.metrics().snapshot(), StatusCode::OK)
            });

        list_route
            .or(markers_route)
            .or(coverage_route)
            .or(create_route)
            .or(vote_route)
            .or(metrics_route)
            .with(warp::log("sigmap::bridge"))
    }

    /// Serves until `shutdown` resolves.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("binding bridge to {addr}"))?;
        self.publish_status(&format!("HTTP bridge listening on http://{bound}"));
        server.await;
        info!("bridge on {} stopped", bound);
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }
}
