use std::collections::HashMap;

use shared::{
    domain::{ContainerId, ViewId},
    error::RegistryError,
};

use crate::view::{ViewRecord, ViewSpec};

struct ContainerRecord {
    /// View whose subtree holds this container, if any. Walking
    /// container → owner → container is the ancestor predicate for
    /// enclosing-view queries.
    owner: Option<ViewId>,
    parent: Option<ContainerId>,
}

/// Tracks every existing view by id, plus the container tree needed for
/// sibling and ancestor queries.
pub struct ViewRegistry {
    views: HashMap<ViewId, ViewRecord>,
    containers: HashMap<ContainerId, ContainerRecord>,
    next_order: u32,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            containers: HashMap::new(),
            next_order: 0,
        }
    }

    /// Register a container node. `owner` is the view the container lives
    /// inside (None for a root container).
    pub fn register_container(
        &mut self,
        container: ContainerId,
        owner: Option<ViewId>,
        parent: Option<ContainerId>,
    ) {
        self.containers
            .insert(container, ContainerRecord { owner, parent });
    }

    pub fn add(&mut self, spec: ViewSpec) -> Result<(), RegistryError> {
        if self.views.contains_key(&spec.id) {
            return Err(RegistryError::DuplicateId(spec.id));
        }
        self.containers
            .entry(spec.container.clone())
            .or_insert(ContainerRecord {
                owner: None,
                parent: None,
            });
        let order = self.next_order;
        self.next_order += 1;
        let record = ViewRecord::from_spec(spec, order);
        self.views.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn remove(&mut self, id: &ViewId) -> Option<ViewRecord> {
        self.views.remove(id)
    }

    pub fn contains(&self, id: &ViewId) -> bool {
        self.views.contains_key(id)
    }

    pub fn get(&self, id: &ViewId) -> Option<&ViewRecord> {
        self.views.get(id)
    }

    pub fn get_mut(&mut self, id: &ViewId) -> Option<&mut ViewRecord> {
        self.views.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// All views sharing `id`'s container (including `id` itself), in
    /// document order.
    pub fn sibling_views(&self, id: &ViewId) -> Vec<ViewId> {
        let Some(record) = self.views.get(id) else {
            return Vec::new();
        };
        let mut siblings: Vec<&ViewRecord> = self
            .views
            .values()
            .filter(|v| v.container == record.container)
            .collect();
        siblings.sort_by_key(|v| v.order);
        siblings.into_iter().map(|v| v.id.clone()).collect()
    }

    /// The view enclosing `container`, walking up the container chain
    /// until one with an owning view is found.
    pub fn enclosing_view(&self, container: &ContainerId) -> Option<ViewId> {
        let mut current = self.containers.get(container);
        while let Some(record) = current {
            if let Some(owner) = &record.owner {
                return Some(owner.clone());
            }
            current = record.parent.as_ref().and_then(|p| self.containers.get(p));
        }
        None
    }

    pub fn parent_view(&self, id: &ViewId) -> Option<ViewId> {
        let record = self.views.get(id)?;
        self.enclosing_view(&record.container)
    }

    /// Ancestor views of `id`, nearest first.
    pub fn ancestor_views(&self, id: &ViewId) -> Vec<ViewId> {
        let mut chain = Vec::new();
        let mut current = self.parent_view(id);
        while let Some(view) = current {
            current = self.parent_view(&view);
            chain.push(view);
        }
        chain
    }

    /// A view with no enclosing ancestor view.
    pub fn is_top_level(&self, id: &ViewId) -> bool {
        self.parent_view(id).is_none()
    }

    pub fn is_visible(&self, id: &ViewId, check_ancestors: bool) -> bool {
        let Some(record) = self.views.get(id) else {
            return false;
        };
        if !record.visibility.is_visible() {
            return false;
        }
        if !check_ancestors {
            return true;
        }
        self.ancestor_views(id).iter().all(|ancestor| {
            self.views
                .get(ancestor)
                .is_some_and(|v| v.visibility.is_visible())
        })
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}
