/*
[INPUT]:  Authentication flow results and wallet events
[OUTPUT]: Consistent client-side session state
[POS]:    Session layer - cache and orchestration
[UPDATE]: When session state handling or the login flow changes
*/

pub mod cache;
pub mod orchestrator;

pub use cache::{Identity, SessionCache, SessionState};
pub use orchestrator::{AuthOrchestrator, LoginOutcome, WalletWatch};
