use super::decorator::ArtifactDecorator;
use super::error::{StructuralViolation, TreeError};
use super::kind::{ArtifactKind, ArtifactType};
use super::messages::{
    ArtifactConstructed, ArtifactGenerated, ArtifactGenerating, ChildAdded, ChildRemoved,
    DecoratorAdded, DecoratorRemoved, GenerationOutcome,
};
use crate::bus::MessageBus;
use crate::generation::{CancellationSignal, GenerationError, Phase, RunReport, RunStatus};
use crate::progress::ProgressHandler;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, warn};

/// Artifact-specific fields
pub type PropertyBag = Map<String, Value>;

struct ArtifactState {
    parent: Option<Weak<ArtifactInner>>,
    children: Vec<Artifact>,
    decorators: IndexMap<String, Arc<dyn ArtifactDecorator>>,
    properties: PropertyBag,
}

struct ArtifactInner {
    id: String,
    kind: ArtifactKind,
    bus: MessageBus,
    state: RwLock<ArtifactState>,
}

/// Shared handle to a node of an artifact tree
///
/// Clones refer to the same node. A node owns its children in generation
/// order and holds a non-owning link to its parent. Every mutation publishes a
/// notification on the bus the artifact was constructed with.
#[derive(Clone)]
pub struct Artifact {
    inner: Arc<ArtifactInner>,
}

/// Non-owning handle to an [`Artifact`]
#[derive(Clone)]
pub struct WeakArtifact {
    inner: Weak<ArtifactInner>,
}

impl WeakArtifact {
    pub fn upgrade(&self) -> Option<Artifact> {
        self.inner.upgrade().map(|inner| Artifact { inner })
    }
}

impl fmt::Debug for WeakArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(artifact) => write!(f, "WeakArtifact({})", artifact.id()),
            None => f.write_str("WeakArtifact(<dropped>)"),
        }
    }
}

impl Artifact {
    /// Creates a detached artifact and publishes [`ArtifactConstructed`] on `bus`
    ///
    /// Construction subscribers may attach decorators or children before this
    /// returns.
    pub fn construct(
        bus: &MessageBus,
        kind: ArtifactKind,
        id: impl Into<String>,
    ) -> Result<Artifact, TreeError> {
        let artifact = Artifact::new(bus.clone(), kind, id.into());
        debug!(id = %artifact.id(), kind = %kind, "Constructed artifact");
        bus.publish(&ArtifactConstructed {
            artifact: artifact.clone(),
        })?;
        Ok(artifact)
    }

    /// Typed variant of [`Artifact::construct`]
    pub fn construct_as<T: ArtifactType>(
        bus: &MessageBus,
        id: impl Into<String>,
    ) -> Result<Artifact, TreeError> {
        Self::construct(bus, T::KIND, id)
    }

    fn new(bus: MessageBus, kind: ArtifactKind, id: String) -> Self {
        Self {
            inner: Arc::new(ArtifactInner {
                id,
                kind,
                bus,
                state: RwLock::new(ArtifactState {
                    parent: None,
                    children: Vec::new(),
                    decorators: IndexMap::new(),
                    properties: PropertyBag::new(),
                }),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.inner.kind
    }

    /// Exact kind check
    pub fn is<T: ArtifactType>(&self) -> bool {
        self.inner.kind == T::KIND
    }

    /// Bus this artifact publishes tree notifications on
    pub fn bus(&self) -> &MessageBus {
        &self.inner.bus
    }

    pub fn ptr_eq(&self, other: &Artifact) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakArtifact {
        WeakArtifact {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn parent(&self) -> Option<Artifact> {
        self.read()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Artifact { inner })
    }

    /// Children in generation order
    pub fn children(&self) -> Vec<Artifact> {
        self.read().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.read().children.len()
    }

    pub fn child(&self, id: &str) -> Option<Artifact> {
        self.read().children.iter().find(|c| c.id() == id).cloned()
    }

    /// Children of exact kind `T`
    pub fn children_of<T: ArtifactType>(&self) -> Vec<Artifact> {
        self.read()
            .children
            .iter()
            .filter(|c| c.is::<T>())
            .cloned()
            .collect()
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> Vec<Artifact> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(artifact) = current {
            current = artifact.parent();
            ancestors.push(artifact);
        }
        ancestors
    }

    pub fn root(&self) -> Artifact {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// This artifact followed by all descendants, depth-first pre-order
    pub fn descendants(&self) -> Vec<Artifact> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(artifact) = stack.pop() {
            let children = artifact.children();
            stack.extend(children.into_iter().rev());
            out.push(artifact);
        }
        out
    }

    /// Slash-separated ids from the root down to this artifact
    pub fn path(&self) -> String {
        let mut ids: Vec<String> = self
            .ancestors()
            .iter()
            .rev()
            .map(|a| a.id().to_string())
            .collect();
        ids.push(self.id().to_string());
        ids.join("/")
    }

    /// Appends `child` and publishes [`ChildAdded`]
    ///
    /// Fails without mutating if `child` already has a parent (including
    /// this one), is this artifact, or is one of its ancestors.
    pub fn add_child(&self, child: &Artifact) -> Result<(), TreeError> {
        if self.ptr_eq(child) {
            return Err(StructuralViolation::SelfParent(self.id().to_string()).into());
        }
        if let Some(parent) = child.parent() {
            return Err(StructuralViolation::AlreadyParented {
                child: child.id().to_string(),
                parent: parent.id().to_string(),
            }
            .into());
        }
        if self.ancestors().iter().any(|a| a.ptr_eq(child)) {
            return Err(StructuralViolation::Cycle {
                parent: self.id().to_string(),
                child: child.id().to_string(),
            }
            .into());
        }

        child.write().parent = Some(Arc::downgrade(&self.inner));
        self.write().children.push(child.clone());

        debug!(parent = %self.id(), child = %child.id(), "Added child");
        self.inner
            .bus
            .publish(&ChildAdded::new(self.clone(), child.clone()))?;
        Ok(())
    }

    /// Removes `child`, clears its parent link and publishes [`ChildRemoved`]
    pub fn remove_child(&self, child: &Artifact) -> Result<(), TreeError> {
        let removed = {
            let mut state = self.write();
            let position = state.children.iter().position(|c| c.ptr_eq(child));
            position.map(|index| state.children.remove(index))
        };

        let Some(removed) = removed else {
            return Err(StructuralViolation::NotAChild {
                parent: self.id().to_string(),
                child: child.id().to_string(),
            }
            .into());
        };

        removed.write().parent = None;

        debug!(parent = %self.id(), child = %removed.id(), "Removed child");
        self.inner
            .bus
            .publish(&ChildRemoved::new(self.clone(), removed))?;
        Ok(())
    }

    /// Removes this artifact from its parent. Returns `false` if it had none.
    pub fn detach(&self) -> Result<bool, TreeError> {
        match self.parent() {
            Some(parent) => parent.remove_child(self).map(|_| true),
            None => Ok(false),
        }
    }

    /// Attaches `decorator` and publishes [`DecoratorAdded`]
    ///
    /// A key that is already present is rejected and the existing decorator is
    /// left in place.
    pub fn add_decorator(&self, decorator: Arc<dyn ArtifactDecorator>) -> Result<(), TreeError> {
        let key = decorator.key().to_string();
        {
            let mut state = self.write();
            if state.decorators.contains_key(&key) {
                return Err(StructuralViolation::DuplicateDecorator {
                    artifact: self.id().to_string(),
                    key,
                }
                .into());
            }
            decorator
                .base()
                .attach(self)
                .map_err(|owner| StructuralViolation::DecoratorInUse {
                    key: key.clone(),
                    owner,
                })?;
            state.decorators.insert(key.clone(), decorator);
        }

        debug!(artifact = %self.id(), decorator = %key, "Attached decorator");
        self.inner.bus.publish(&DecoratorAdded {
            artifact: self.clone(),
            key,
        })?;
        Ok(())
    }

    /// Detaches the decorator under `key` and publishes [`DecoratorRemoved`]
    pub fn remove_decorator(&self, key: &str) -> Result<Arc<dyn ArtifactDecorator>, TreeError> {
        let removed = self.write().decorators.shift_remove(key);
        let Some(decorator) = removed else {
            return Err(StructuralViolation::MissingDecorator {
                artifact: self.id().to_string(),
                key: key.to_string(),
            }
            .into());
        };
        decorator.base().detach();

        self.inner.bus.publish(&DecoratorRemoved {
            artifact: self.clone(),
            key: key.to_string(),
        })?;
        Ok(decorator)
    }

    pub fn has_decorator(&self, key: &str) -> bool {
        self.read().decorators.contains_key(key)
    }

    pub fn decorator(&self, key: &str) -> Option<Arc<dyn ArtifactDecorator>> {
        self.read().decorators.get(key).cloned()
    }

    /// Decorator keys in attach order
    pub fn decorator_keys(&self) -> Vec<String> {
        self.read().decorators.keys().cloned().collect()
    }

    /// First attached decorator of concrete type `D`
    pub fn decorator_of<D: ArtifactDecorator>(&self) -> Option<Arc<D>> {
        let decorators: Vec<Arc<dyn ArtifactDecorator>> =
            self.read().decorators.values().cloned().collect();
        decorators
            .into_iter()
            .find_map(|d| d.into_any().downcast::<D>().ok())
    }

    pub fn has_capability<D: ArtifactDecorator>(&self) -> bool {
        self.read()
            .decorators
            .values()
            .any(|d| (**d).as_any().is::<D>())
    }

    /// Whether any attached decorator can generate right now
    pub fn can_generate(&self) -> bool {
        self.read()
            .decorators
            .values()
            .any(|d| d.generator().map(|g| g.can_generate()).unwrap_or(false))
    }

    /// Runs every attached generation capability that currently can generate
    ///
    /// Each invocation is bracketed by [`ArtifactGenerating`] and
    /// [`ArtifactGenerated`]. Stops at the first capability error.
    pub async fn generate(
        &self,
        progress: &dyn ProgressHandler,
        cancel: &CancellationSignal,
    ) -> Result<Vec<RunReport>, GenerationError> {
        let decorators: Vec<Arc<dyn ArtifactDecorator>> =
            self.read().decorators.values().cloned().collect();
        let mut reports = Vec::new();

        for decorator in decorators {
            let Some(generator) = decorator.generator() else {
                continue;
            };
            if !generator.can_generate() {
                debug!(artifact = %self.id(), decorator = %decorator.key(), "Generator not ready, skipping");
                continue;
            }

            self.publish_lifecycle(&ArtifactGenerating {
                artifact: self.clone(),
                decorator: decorator.key().to_string(),
            })?;

            let mut result = generator.generate(self, progress, cancel).await;
            let outcome = match &result {
                Ok(report) => match &report.status {
                    RunStatus::Completed => GenerationOutcome::Completed,
                    RunStatus::Cancelled { .. } => GenerationOutcome::Cancelled,
                    RunStatus::Aborted { error, .. } => GenerationOutcome::Aborted(error.clone()),
                },
                Err(e) => GenerationOutcome::Aborted(e.to_string()),
            };

            let announced = self.publish_lifecycle(&ArtifactGenerated {
                artifact: self.clone(),
                decorator: decorator.key().to_string(),
                outcome,
            });
            match (&mut result, announced) {
                (Ok(report), Err(e)) => {
                    report.record_failure(Phase::CreatedSolution, self.id(), e);
                }
                (Err(_), Err(e)) => {
                    warn!(artifact = %self.id(), error = %e, "ArtifactGenerated handler failed after generation error");
                }
                _ => {}
            }

            reports.push(result?);
        }

        Ok(reports)
    }

    fn publish_lifecycle<M: crate::bus::Message>(&self, message: &M) -> Result<(), GenerationError> {
        self.inner
            .bus
            .publish(message)
            .map_err(|source| GenerationError::Tree {
                subject: self.id().to_string(),
                source: source.into(),
            })
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.read().properties.get(name).cloned()
    }

    pub fn property_str(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().properties.insert(name.into(), value.into());
    }

    pub fn properties(&self) -> PropertyBag {
        self.read().properties.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, ArtifactState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ArtifactState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Artifact {}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Artifact")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("children", &state.children.len())
            .field("decorators", &state.decorators.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::decorator::{DecoratorBase, TagDecorator};
    use crate::artifact::kind::{File, Layer, Project, Scope};
    use crate::artifact::messages::TreeMutation;
    use std::sync::Mutex;

    fn bus() -> MessageBus {
        MessageBus::new("tree")
    }

    fn make(bus: &MessageBus, id: &str) -> Artifact {
        Artifact::construct_as::<Project>(bus, id).unwrap()
    }

    #[test]
    fn test_construct_publishes_constructed() {
        let bus = bus();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        bus.subscribe(move |m: &ArtifactConstructed| {
            s.lock().unwrap().push(m.artifact.id().to_string());
            Ok(())
        });

        let artifact = Artifact::construct_as::<Layer>(&bus, "Domain").unwrap();
        assert_eq!(artifact.id(), "Domain");
        assert!(artifact.is::<Layer>());
        assert!(!artifact.is::<Scope>());
        assert_eq!(*seen.lock().unwrap(), vec!["Domain"]);
    }

    #[test]
    fn test_add_then_remove_child_restores_state() {
        let bus = bus();
        let parent = make(&bus, "a");
        let child = make(&bus, "b");

        parent.add_child(&child).unwrap();
        assert_eq!(child.parent(), Some(parent.clone()));
        assert_eq!(parent.children(), vec![child.clone()]);

        parent.remove_child(&child).unwrap();
        assert!(child.parent().is_none());
        assert!(parent.children().is_empty());
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let bus = bus();
        let parent = make(&bus, "root");
        for id in ["c", "a", "b"] {
            parent.add_child(&make(&bus, id)).unwrap();
        }
        let ids: Vec<String> = parent.children().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reparent_without_detach_fails() {
        let bus = bus();
        let first = make(&bus, "first");
        let second = make(&bus, "second");
        let child = make(&bus, "child");

        first.add_child(&child).unwrap();
        let err = second.add_child(&child).unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(StructuralViolation::AlreadyParented { .. })
        ));
        assert_eq!(child.parent(), Some(first.clone()));
        assert!(second.children().is_empty());

        child.detach().unwrap();
        second.add_child(&child).unwrap();
        assert_eq!(child.parent(), Some(second));
    }

    #[test]
    fn test_self_and_cycle_rejected() {
        let bus = bus();
        let a = make(&bus, "a");
        let b = make(&bus, "b");
        a.add_child(&b).unwrap();

        assert!(matches!(
            a.add_child(&a).unwrap_err().violation(),
            Some(StructuralViolation::SelfParent(_))
        ));
        assert!(matches!(
            b.add_child(&a).unwrap_err().violation(),
            Some(StructuralViolation::Cycle { .. })
        ));
    }

    #[test]
    fn test_remove_absent_child_fails() {
        let bus = bus();
        let a = make(&bus, "a");
        let b = make(&bus, "b");
        let err = a.remove_child(&b).unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(StructuralViolation::NotAChild { .. })
        ));
    }

    #[test]
    fn test_mutations_publish_in_order() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        bus.subscribe(move |m: &ChildAdded| {
            l.lock().unwrap().push(format!("added {}>{}", m.parent().id(), m.child().id()));
            Ok(())
        });
        let l = log.clone();
        bus.subscribe(move |m: &ChildRemoved| {
            l.lock().unwrap().push(format!("removed {}>{}", m.parent().id(), m.child().id()));
            Ok(())
        });
        let l = log.clone();
        bus.subscribe(move |m: &TreeMutation| {
            l.lock().unwrap().push(format!("mutation {:?}", m.change));
            Ok(())
        });

        let a = make(&bus, "a");
        let b = make(&bus, "b");
        a.add_child(&b).unwrap();
        a.remove_child(&b).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "added a>b",
                "mutation Added",
                "removed a>b",
                "mutation Removed"
            ]
        );
    }

    #[test]
    fn test_failing_subscriber_surfaces_after_mutation() {
        let bus = bus();
        bus.subscribe(|_: &ChildAdded| Err(anyhow::anyhow!("rejected")));

        let a = make(&bus, "a");
        let b = make(&bus, "b");
        let err = a.add_child(&b).unwrap_err();
        assert!(matches!(err, TreeError::Notification(_)));
        assert_eq!(b.parent(), Some(a));
    }

    #[test]
    fn test_duplicate_decorator_key_rejected() {
        let bus = bus();
        let artifact = make(&bus, "a");
        let original: Arc<dyn ArtifactDecorator> =
            Arc::new(TagDecorator::new("binding").with_property("v", 1));
        artifact.add_decorator(original.clone()).unwrap();

        let err = artifact
            .add_decorator(Arc::new(TagDecorator::new("binding").with_property("v", 2)))
            .unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(StructuralViolation::DuplicateDecorator { .. })
        ));

        let current = artifact.decorator("binding").unwrap();
        assert!(Arc::ptr_eq(&current, &original));
        assert_eq!(current.base().property("v"), Some(Value::from(1)));
        assert_eq!(artifact.decorator_keys(), vec!["binding"]);
    }

    #[test]
    fn test_decorator_owner_lifecycle() {
        let bus = bus();
        let a = make(&bus, "a");
        let b = make(&bus, "b");
        let tag: Arc<dyn ArtifactDecorator> = Arc::new(TagDecorator::new("pinned"));

        a.add_decorator(tag.clone()).unwrap();
        assert_eq!(tag.owner(), Some(a.clone()));

        let err = b.add_decorator(tag.clone()).unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(StructuralViolation::DecoratorInUse { .. })
        ));

        let removed = a.remove_decorator("pinned").unwrap();
        assert!(removed.owner().is_none());
        assert!(!a.has_decorator("pinned"));
        b.add_decorator(tag).unwrap();
        assert!(b.has_decorator("pinned"));
    }

    struct Binding {
        base: DecoratorBase,
        template: &'static str,
    }

    impl ArtifactDecorator for Binding {
        fn base(&self) -> &DecoratorBase {
            &self.base
        }
    }

    #[test]
    fn test_capability_probe_by_type() {
        let bus = bus();
        let file = Artifact::construct_as::<File>(&bus, "readme").unwrap();
        file.add_decorator(Arc::new(TagDecorator::new("tag"))).unwrap();
        assert!(!file.has_capability::<Binding>());

        file.add_decorator(Arc::new(Binding {
            base: DecoratorBase::new("binding"),
            template: "hello",
        }))
        .unwrap();

        assert!(file.has_capability::<Binding>());
        let binding = file.decorator_of::<Binding>().unwrap();
        assert_eq!(binding.template, "hello");
        assert!(!file.can_generate());
    }

    #[test]
    fn test_descendants_and_path() {
        let bus = bus();
        let root = make(&bus, "root");
        let a = make(&bus, "a");
        let b = make(&bus, "b");
        let c = make(&bus, "c");
        root.add_child(&a).unwrap();
        a.add_child(&c).unwrap();
        root.add_child(&b).unwrap();

        let ids: Vec<String> = root.descendants().iter().map(|x| x.id().to_string()).collect();
        assert_eq!(ids, vec!["root", "a", "c", "b"]);
        assert_eq!(c.path(), "root/a/c");
        assert_eq!(c.root(), root);
    }

    #[test]
    fn test_properties() {
        let bus = bus();
        let a = make(&bus, "a");
        a.set_property("layer", "Domain");
        assert_eq!(a.property_str("layer").as_deref(), Some("Domain"));
        assert!(a.property("missing").is_none());
    }
}
