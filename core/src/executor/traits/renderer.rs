use crate::executor::events::EventEnvelope;

/// Output renderer plugin: turns run events into user-facing output.
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, envelope: &EventEnvelope);
}
