//! REST API Server Module
//!
//! Exposes the instruction set and read-only queries over HTTP for relays and
//! resolvers.

mod handlers;

pub use handlers::{ApiResponse, EventsQuery, JsonDeserializeError, WhitelistStatus};

use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use warp::Filter;

use crate::config::ApiConfig;
use crate::service::HtlcService;
use crate::types::{BridgeId, OrderId};
use handlers::with_service;

/// HTTP front end over a shared `HtlcService`.
pub struct ApiServer {
    config: ApiConfig,
    service: HtlcService,
}

impl ApiServer {
    /// # Arguments
    ///
    /// * `config` - Bind address
    /// * `service` - Service the routes read from and apply to
    pub fn new(config: ApiConfig, service: HtlcService) -> Self {
        Self { config, service }
    }

    /// Binds to the configured host and port and serves until shutdown.
    pub async fn run(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid API bind address {}:{}",
                    self.config.host, self.config.port
                )
            })?;
        info!("Starting API server on {}", addr);

        warp::serve(self.create_routes()).run(addr).await;
        Ok(())
    }

    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let service = self.service.clone();

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| warp::reply::json(&ApiResponse::ok("HTLC service is running".to_string())));

        // POST /instructions - apply one signed instruction
        let instructions = warp::path("instructions")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and(with_service(service.clone()))
            .and_then(handlers::apply_instruction_handler);

        // GET /orders/:id
        let get_order = warp::path("orders")
            .and(warp::path::param::<OrderId>())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(handlers::get_order_handler);

        // GET /orders/:id/secret
        let get_secret = warp::path("orders")
            .and(warp::path::param::<OrderId>())
            .and(warp::path("secret"))
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(handlers::get_secret_handler);

        // GET /bridges
        let list_bridges = warp::path("bridges")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(handlers::list_bridges_handler);

        // GET /bridges/:id
        let get_bridge = warp::path("bridges")
            .and(warp::path::param::<BridgeId>())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(handlers::get_bridge_handler);

        // GET /whitelist/:address
        let get_whitelist = warp::path("whitelist")
            .and(warp::path::param::<String>())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(handlers::get_whitelist_handler);

        // GET /events?since=<index>&limit=<n>
        let events = warp::path("events")
            .and(warp::path::end())
            .and(warp::get())
            .and(warp::query::<EventsQuery>())
            .and(with_service(service))
            .and_then(handlers::get_events_handler);

        health
            .or(instructions)
            .or(get_order)
            .or(get_secret)
            .or(list_bridges)
            .or(get_bridge)
            .or(get_whitelist)
            .or(events)
            .recover(handlers::handle_rejection)
    }

    /// Exposes the routes for in-process tests.
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
