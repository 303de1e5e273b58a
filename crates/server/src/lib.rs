//! HTTP surfaces of the recommender: the perfumist suggest API and the edge
//! gateway, plus the startup wiring both binaries share.

pub mod api;
pub mod bootstrap;
pub mod cors;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod shutdown;
pub mod suggest;

pub use bootstrap::{
    bootstrap, bootstrap_with_config, build_recommender, Application, BootstrapError,
};
pub use cors::CorsPolicy;
pub use gateway::{gateway_router, GatewayState};
pub use logging::init_logging;
pub use shutdown::shutdown_signal;
pub use suggest::{perfumist_router, PerfumistState};
