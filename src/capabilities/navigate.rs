use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// History manipulation with explicit intent. `GuardBack` asks the shell to
/// counter any back-navigation by immediately moving forward again while
/// enabled; screens that must not be re-entered after completion use it
/// instead of ad hoc history juggling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum NavOperation {
    Push { url: String },
    Replace { url: String },
    Back,
    Forward,
    GuardBack { enabled: bool },
}

impl Operation for NavOperation {
    type Output = ();
}

#[derive(Clone)]
pub struct Navigator<E> {
    context: CapabilityContext<NavOperation, E>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavOperation;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<E> Navigator<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<NavOperation, E>) -> Self {
        Self { context }
    }

    fn notify(&self, operation: NavOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }

    pub fn push(&self, url: impl Into<String>) {
        self.notify(NavOperation::Push { url: url.into() });
    }

    /// Replace the current history entry; back cannot return to the replaced
    /// location.
    pub fn replace(&self, url: impl Into<String>) {
        self.notify(NavOperation::Replace { url: url.into() });
    }

    pub fn back(&self) {
        self.notify(NavOperation::Back);
    }

    pub fn forward(&self) {
        self.notify(NavOperation::Forward);
    }

    pub fn guard_back(&self, enabled: bool) {
        self.notify(NavOperation::GuardBack { enabled });
    }
}
