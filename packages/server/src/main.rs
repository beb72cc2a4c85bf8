#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crash map application.
//!
//! Reads `BIND_ADDR`, `PORT`, `CRASH_MAP_DATA_DIR` and
//! `CRASH_MAP_DATASETS` from the environment.

#[actix_web::main]
async fn main() -> Result<(), crash_map_server::ServerError> {
    crash_map_server::run_server().await
}
