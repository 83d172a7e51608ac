//! Gateway module
//!
//! The ordered chain every guarded request passes through before reaching a
//! handler: envelope → credential → admin policy → quota → forward.

pub mod envelope;
pub mod middleware;
pub mod pipeline;

pub use envelope::RequestEnvelope;
pub use middleware::{gateway_middleware, AuthenticatedIdentity, Gate};
pub use pipeline::{Admission, GatewayPipeline, PipelineStage, QuotaCeilings, RouteGuard};
