use std::collections::HashMap;

use tokio::sync::watch;
use tracing::debug;
use tracing::trace;

use crate::Error;
use crate::Notification;
use crate::NotificationId;
use crate::NotificationStore;
use crate::ProjectionConfig;
use crate::ProjectionFilter;
use crate::ReadStateError;
use crate::Result;

/// A registered surface: its configuration plus the channel its view is
/// published on
#[derive(Debug)]
pub struct Projection {
    config: ProjectionConfig,
    publisher: watch::Sender<Vec<Notification>>,
}

impl Projection {
    fn new(config: ProjectionConfig) -> Self {
        let (publisher, _) = watch::channel(Vec::new());
        Self { config, publisher }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Capped, filtered view of the store in store order
    pub fn compute(
        &self,
        store: &NotificationStore,
    ) -> Vec<Notification> {
        let include_unconfirmed = self.config.include_unconfirmed;
        store
            .iter()
            .filter(|e| self.config.filter.matches(e, include_unconfirmed))
            .take(self.config.capacity)
            .map(|e| e.visible(include_unconfirmed))
            .collect()
    }

    /// Ids shown as unread by this surface right now
    pub fn unread_ids(
        &self,
        store: &NotificationStore,
    ) -> Vec<NotificationId> {
        self.compute(store)
            .into_iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect()
    }

    fn refresh(
        &self,
        store: &NotificationStore,
    ) -> bool {
        let view = self.compute(store);
        self.publisher.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        })
    }

    fn view(&self) -> ProjectionView {
        ProjectionView {
            name: self.config.name.clone(),
            receiver: self.publisher.subscribe(),
        }
    }
}

/// Read side of a projection handed to a UI surface
#[derive(Debug, Clone)]
pub struct ProjectionView {
    name: String,
    receiver: watch::Receiver<Vec<Notification>>,
}

impl ProjectionView {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the view as last published
    pub fn current_view(&self) -> Vec<Notification> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next published change.
    ///
    /// # Errors
    /// `ChannelError::EngineStopped` once the engine has been dropped.
    pub async fn changed(&mut self) -> Result<()> {
        self.receiver
            .changed()
            .await
            .map_err(|_| Error::Channel(crate::ChannelError::EngineStopped))
    }

    /// Waits until the published view satisfies `predicate` and returns it
    pub async fn wait_for<F>(
        &mut self,
        mut predicate: F,
    ) -> Result<Vec<Notification>>
    where
        F: FnMut(&[Notification]) -> bool,
    {
        let view = self
            .receiver
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| Error::Channel(crate::ChannelError::EngineStopped))?;
        Ok(view.clone())
    }
}

/// All projections served by one engine
#[derive(Debug, Default)]
pub struct ProjectionRegistry {
    projections: Vec<Projection>,
    by_name: HashMap<String, usize>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a surface and returns the view it reads from.
    ///
    /// # Errors
    /// `Error::InvalidConfig` for an invalid or duplicate configuration.
    pub fn register(
        &mut self,
        config: ProjectionConfig,
    ) -> Result<ProjectionView> {
        config.validate()?;
        if self.by_name.contains_key(&config.name) {
            return Err(Error::InvalidConfig(format!(
                "projection '{}' is already registered",
                config.name
            )));
        }

        debug!(name = %config.name, capacity = config.capacity, filter = %config.filter, "projection registered");
        let projection = Projection::new(config);
        let view = projection.view();
        self.by_name.insert(projection.config.name.clone(), self.projections.len());
        self.projections.push(projection);
        Ok(view)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Projection> {
        self.by_name.get(name).map(|&i| &self.projections[i])
    }

    pub fn view(
        &self,
        name: &str,
    ) -> Option<ProjectionView> {
        self.get(name).map(Projection::view)
    }

    pub fn views(&self) -> Vec<ProjectionView> {
        self.projections.iter().map(Projection::view).collect()
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    /// Recomputes every projection; returns how many views changed
    pub fn refresh(
        &self,
        store: &NotificationStore,
    ) -> usize {
        let changed = self.projections.iter().filter(|p| p.refresh(store)).count();
        trace!(changed, "projections refreshed");
        changed
    }

    /// Unread ids of a single surface, the scope of "mark all read"
    pub fn unread_ids(
        &self,
        name: &str,
        store: &NotificationStore,
    ) -> Result<Vec<NotificationId>> {
        self.get(name)
            .map(|p| p.unread_ids(store))
            .ok_or_else(|| ReadStateError::UnknownProjection(name.to_string()).into())
    }

    /// Replaces the filter of a surface and republishes its view.
    /// Returns whether the filter changed.
    ///
    /// # Errors
    /// `ReadStateError::UnknownProjection` when no surface has that name.
    pub fn set_filter(
        &mut self,
        name: &str,
        filter: ProjectionFilter,
        store: &NotificationStore,
    ) -> Result<bool> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| ReadStateError::UnknownProjection(name.to_string()))?;
        let projection = &mut self.projections[index];
        if projection.config.filter == filter {
            return Ok(false);
        }

        debug!(name, from = %projection.config.filter, to = %filter, "projection filter changed");
        projection.config.filter = filter;
        projection.refresh(store);
        Ok(true)
    }

    /// Surfaces filtering `unread` with the page size each needs, capped at
    /// `max_page_size`. A snapshot that is not unread-only may hold too few
    /// unread entries to fill them.
    pub fn unread_requests(
        &self,
        max_page_size: usize,
    ) -> Vec<(String, usize)> {
        self.projections
            .iter()
            .filter(|p| p.config.filter == ProjectionFilter::Unread)
            .map(|p| (p.config.name.clone(), p.config.capacity.min(max_page_size)))
            .collect()
    }

    /// Page size and `unread_only` flag for the activation snapshot: large
    /// enough for the biggest surface, unread-only when every surface is.
    pub fn snapshot_request(
        &self,
        max_page_size: usize,
    ) -> (usize, bool) {
        let limit = self
            .projections
            .iter()
            .map(|p| p.config.capacity)
            .max()
            .unwrap_or(max_page_size)
            .min(max_page_size);
        let unread_only = !self.projections.is_empty()
            && self
                .projections
                .iter()
                .all(|p| p.config.filter == ProjectionFilter::Unread);
        (limit, unread_only)
    }
}
