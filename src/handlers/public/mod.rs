// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, account creation and service liveness. These handlers
// get no caller identity and must validate every input themselves.
pub mod auth;
pub mod system;
