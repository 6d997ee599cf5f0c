//! FFB command stream handling.
//!
//! The HID backend delivers packets on a context the engine does not own.
//! The receiver stays a pure producer: decode, take the state mutex, update
//! the FFB fields, wake the physics thread. It never calls back into the
//! backend.

use std::sync::Arc;

use tracing::debug;

use hid_wheel_protocol::{parse_ffb_command, scaling, FfbCommand};

use crate::engine::Shared;

/// Decodes host FFB packets into shared-state updates.
pub struct FfbReceiver {
    shared: Arc<Shared>,
}

impl FfbReceiver {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Apply one packet. Malformed packets are dropped without touching
    /// state; every recognized command wakes the physics thread.
    pub fn handle_packet(&self, packet: &[u8]) {
        let Some(command) = parse_ffb_command(packet) else {
            debug!(len = packet.len(), "dropped unrecognized FFB packet");
            return;
        };

        {
            let mut state = self.shared.state.lock();
            let ffb = &mut state.ffb;
            match command {
                FfbCommand::ConstantForce { force } => {
                    ffb.force = force;
                }
                FfbCommand::StopForce => {
                    ffb.force = 0;
                }
                FfbCommand::DefaultAutocenter => {
                    if ffb.autocenter == 0 {
                        ffb.autocenter = scaling::DEFAULT_AUTOCENTER_STRENGTH;
                    }
                }
                FfbCommand::DisableAutocenter => {
                    ffb.autocenter = 0;
                }
                FfbCommand::SetAutocenter { strength } => {
                    if strength < 0 {
                        debug!(strength, "autocenter strength clamped to zero");
                    }
                    ffb.autocenter = strength.max(0);
                }
            }
        }

        self.shared.physics_wakeup.notify_one();
    }
}
