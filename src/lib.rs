//! resource-forge: a directory of action descriptors served as a versioned REST API,
//! plus the scaffolding that writes new descriptors.

pub mod actions;
pub mod case;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod pipeline;
pub mod registry;
pub mod response;
pub mod routes;
pub mod scaffold;
pub mod sql;
pub mod state;
pub mod validation;

pub use actions::{Action, ActionKind, RequestContext};
pub use config::{ResourceModel, Settings};
pub use discovery::{discover, DiscoveredResource};
pub use dispatcher::Dispatcher;
pub use error::{AppError, ConfigError, GatewayError, ScaffoldError};
pub use gateway::{MemoryGateway, ModelGateway, PgGateway, SearchQuery};
pub use pipeline::{assemble, API_PREFIX};
pub use registry::{ResourceRegistry, RouteBinding};
pub use response::ResponseBody;
pub use scaffold::{ForgeOutcome, OverwritePolicy, Scaffolder};
pub use state::AppState;
