//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup, in rule order)
//!     → matcher.rs (literal prefix test, strip prefix)
//!     → sanitize.rs (normalize the remainder)
//!     → router.rs (resolve remainder under the target)
//!     → redirect.rs (only for ?raw=true)
//!
//! Route Compilation (at startup):
//!     ProxyRule[]
//!     → Parse targets
//!     → Optional longest-prefix sort (explicit opt-in)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins

pub mod matcher;
pub mod query;
pub mod redirect;
pub mod router;
pub mod sanitize;

pub use matcher::{PathPrefixMatcher, RouteMatch};
pub use query::QueryParams;
pub use redirect::build_redirect;
pub use router::{EscapeError, Route, Router};
pub use sanitize::sanitize;
