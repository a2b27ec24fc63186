pub mod configuration;
pub mod notification;
pub mod rpc;
pub mod state;
pub mod yang;

use holo_northbound::ProviderBase;
use holo_yang::ToYang;
use tracing::{Span, debug_span};

use crate::instance::Instance;

impl ProviderBase for Instance {
    fn yang_modules() -> &'static [&'static str] {
        &["ietf-pim"]
    }

    fn top_level_node(&self) -> String {
        format!(
            "/ietf-routing:routing/control-plane-protocols/control-plane-protocol[type={}]/ietf-pim:pim",
            holo_utils::protocol::Protocol::PIM.to_yang()
        )
    }

    fn debug_span(name: &str) -> Span {
        debug_span!("pim-instance", %name)
    }
}
