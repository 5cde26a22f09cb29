//! Anti-cheat
//!
//! Session key binding, the rendered-obstacle integrity check and the
//! evidence payload submitted with a score.

pub mod session_key;
pub mod integrity;
pub mod evidence;

pub use session_key::SessionKey;
pub use integrity::{verify_obstacle, ExpectedObstacle, IntegrityViolation};
pub use evidence::{GameSessionEvidence, build_evidence};
