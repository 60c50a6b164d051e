use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Ask the shell for exactly one animation-frame callback. The core never
/// blocks on a timer: while a segment is running, each handled frame
/// requests the next, so playback suspends only at the host event loop's
/// animation-frame granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRequest {
    /// Frame generation the request belongs to. Pulses answering an older
    /// epoch are stale and must be discarded by the core.
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePulse {
    pub epoch: u64,
    /// Shell animation clock, milliseconds. Deltas between consecutive
    /// pulses drive segment fractions.
    pub timestamp_ms: u64,
}

impl Operation for FrameRequest {
    type Output = FramePulse;
}

pub struct Animator<Ev> {
    context: CapabilityContext<FrameRequest, Ev>,
}

impl<Ev> std::fmt::Debug for Animator<Ev> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator").finish_non_exhaustive()
    }
}

impl<Ev> Capability<Ev> for Animator<Ev> {
    type Operation = FrameRequest;
    type MappedSelf<MappedEv> = Animator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Animator::new(self.context.map_event(f))
    }
}

impl<Ev> Animator<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FrameRequest, Ev>) -> Self {
        Self { context }
    }

    pub fn request_frame<F>(&self, epoch: u64, make_event: F)
    where
        F: Fn(FramePulse) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let pulse = ctx.request_from_shell(FrameRequest { epoch }).await;
            ctx.update_app(make_event(pulse));
        });
    }
}
