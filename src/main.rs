mod api;
mod app;
mod app_env;
mod boot;
mod favorites_runtime;
mod idb;
mod map_runtime;
mod persisted_store;
mod realtime_runtime;
mod socket;
mod venue_runtime;

fn main() {
    boot::start();
}
