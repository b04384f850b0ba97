use futures::future::FutureExt;
use log::info;

use crate::error::DynResultFuture;
use crate::light::state::LightState;

/// Transport boundary for computed light states. Broker clients live
/// outside this crate; they only need to implement this trait.
pub trait LightSink {
    /// Deliver one state to the fixture topic.
    fn send_state(&mut self, state: &LightState) -> DynResultFuture<()>;
}

/// Writes each state as a `topic payload` line on stdout, in the exact
/// JSON shape a zigbee2mqtt bridge expects. Useful for piping into a
/// generic publisher or for dry runs.
pub struct ConsoleSink {
    topic: String,
}

impl ConsoleSink {
    pub fn new(topic: &str) -> ConsoleSink {
        ConsoleSink {
            topic: topic.to_string(),
        }
    }
}

impl LightSink for ConsoleSink {
    fn send_state(&mut self, state: &LightState) -> DynResultFuture<()> {
        let line = match serde_json::to_string(state) {
            Ok(payload) => Ok(format!("{} {}", self.topic, payload)),
            Err(e) => Err(e),
        };
        async move {
            let line = line?;
            info!("publish: {}", line);
            println!("{}", line);
            Ok(())
        }
        .boxed()
    }
}

/// Keeps states in memory instead of sending them. Lets the daemon and
/// tests run without any transport attached.
#[derive(Default)]
pub struct NullSink {
    pub sent: Vec<LightState>,
}

impl LightSink for NullSink {
    fn send_state(&mut self, state: &LightState) -> DynResultFuture<()> {
        self.sent.push(state.clone());
        futures::future::ready(Ok(())).boxed()
    }
}
