// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer token verified once by the auth route layer)
pub mod protected; // /api/users, /api/courses, /api/weeklyTopics, /api/coveredTopics
pub mod public; // /, /health, /signup, /login, POST /api/users
