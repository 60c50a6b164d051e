use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::model::StoryId;

/// Fire-and-forget notifications to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenterOperation {
    /// Run the closing transition, collapsing onto the given story's icon.
    CloseCollection { story_id: StoryId },
}

impl Operation for PresenterOperation {
    type Output = ();
}

pub struct Presenter<Ev> {
    context: CapabilityContext<PresenterOperation, Ev>,
}

impl<Ev> std::fmt::Debug for Presenter<Ev> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter").finish_non_exhaustive()
    }
}

impl<Ev> Capability<Ev> for Presenter<Ev> {
    type Operation = PresenterOperation;
    type MappedSelf<MappedEv> = Presenter<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Presenter::new(self.context.map_event(f))
    }
}

impl<Ev> Presenter<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PresenterOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn close_collection(&self, story_id: StoryId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(PresenterOperation::CloseCollection { story_id })
                .await;
        });
    }
}
