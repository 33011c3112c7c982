use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Deserializer};
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// A message pushed on `/event_notifs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event_type")]
pub enum SimEvent {
    /// A node started sending `event` along `path` (node names, origin first).
    #[serde(rename = "sending")]
    Sending { event: String, path: Vec<u32> },
    /// `target` received `event`.
    #[serde(rename = "receive")]
    Receive {
        event: String,
        #[serde(deserialize_with = "node_ref")]
        target: u32,
    },
    /// Anything newer than this dashboard understands.
    #[serde(other)]
    Unknown,
}

pub fn parse_event(text: &str) -> Result<SimEvent, serde_json::Error> {
    serde_json::from_str(text)
}

/// Node references arrive either as a number or as a container name such as `synapse3`.
fn node_ref<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NodeRef {
        Name(u32),
        Label(String),
    }

    match NodeRef::deserialize(deserializer)? {
        NodeRef::Name(name) => Ok(name),
        NodeRef::Label(label) => label
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid node reference: {label}"))),
    }
}

/// Reads the push channel forever, reconnecting after `reconnect_delay` whenever the
/// connection drops. Returns once the receiving side has gone away.
pub async fn run(
    url: String,
    reconnect_delay: Duration,
    events: UnboundedSender<SimEvent>,
    repaint: Option<egui::Context>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                info!(url = %url, "Connected to event stream");
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => match parse_event(&text) {
                            Ok(SimEvent::Unknown) => debug!("Ignoring unknown event type"),
                            Ok(event) => {
                                if events.send(event).is_err() {
                                    return;
                                }
                                if let Some(ctx) = &repaint {
                                    ctx.request_repaint();
                                }
                            }
                            Err(e) => warn!(error = %e, "Malformed event notification"),
                        },
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "Event stream read failed");
                            break;
                        }
                    }
                }
                info!(url = %url, "Event stream closed");
            }
            Err(e) => warn!(url = %url, error = %e, "Event stream connection failed"),
        }

        if events.is_closed() {
            return;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}
