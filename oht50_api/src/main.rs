//! Placeholder binary for the `oht50_api` crate.
//!
//! Placeholder: in full implementation this would start an HTTP server
//! (e.g. axum or actix-web) with routes for status, commands, and config,
//! translating requests into `oht50_api::CoreApi` calls after bearer-token
//! authentication and per-register authorisation — both explicitly out of
//! scope for the core (SPEC_FULL §6).

fn main() {
    tracing_subscriber::fmt().compact().init();

    tracing::info!("OHT-50 API Gateway starting...");
    tracing::info!("API Gateway initialized — placeholder (not yet implemented)");
}
