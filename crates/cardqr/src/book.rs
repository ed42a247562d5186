//! The profile book: every saved profile plus the active-profile pointer.
//!
//! The whole profile list is written back to the store on each mutation.
//! Views subscribe to [`BookEvent`]s to re-render after changes.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::profile::{Profile, ProfileId};
use crate::store::{KeyValueStore, ACTIVE_PROFILE_KEY, PROFILES_KEY};

/// Capacity of the change notification channel.
const EVENT_CAPACITY: usize = 64;

/// A change to the profile book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookEvent {
    /// A profile was created or replaced.
    Saved(ProfileId),
    /// A profile was removed.
    Deleted(ProfileId),
    /// The active pointer moved.
    ActiveChanged(Option<ProfileId>),
}

/// Ordered profiles plus the active pointer, persisted through a store.
#[derive(Debug)]
pub struct ProfileBook<S> {
    store: S,
    profiles: Vec<Profile>,
    active: Option<ProfileId>,
    events: broadcast::Sender<BookEvent>,
}

impl<S: KeyValueStore> ProfileBook<S> {
    /// Load the book from `store`.
    ///
    /// On first run (or if the stored list is empty) a default profile is
    /// seeded, made active, and persisted so its id stays stable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read or the seed can't be written.
    pub fn load(store: S) -> Result<Self> {
        let mut profiles: Vec<Profile> = store.get(PROFILES_KEY, Vec::new())?;
        let mut active: Option<ProfileId> = store.get(ACTIVE_PROFILE_KEY, None)?;

        if profiles.is_empty() {
            let seed = Profile::default();
            info!("Seeding default profile {}", seed.id);
            active = Some(seed.id.clone());
            profiles.push(seed);
            store.set(PROFILES_KEY, &profiles)?;
            store.set(ACTIVE_PROFILE_KEY, &active)?;
        } else if !store.contains(ACTIVE_PROFILE_KEY)? {
            active = profiles.first().map(|p| p.id.clone());
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        debug!("Loaded {} profiles", profiles.len());
        Ok(Self {
            store,
            profiles,
            active,
            events,
        })
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BookEvent> {
        self.events.subscribe()
    }

    /// All profiles in order.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the book has no profiles. Never true after [`load`](Self::load).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The stored active id, which may be `None` or dangling.
    #[must_use]
    pub fn active_id(&self) -> Option<&ProfileId> {
        self.active.as_ref()
    }

    /// The active profile, falling back to the first profile.
    #[must_use]
    pub fn active(&self) -> &Profile {
        self.active
            .as_ref()
            .and_then(|id| self.get(id))
            .unwrap_or(&self.profiles[0])
    }

    /// Look up a profile by id.
    #[must_use]
    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.id == id)
    }

    /// Resolve an optional id: the named profile, or the active one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] if `id` is given but unknown.
    pub fn resolve(&self, id: Option<&ProfileId>) -> Result<&Profile> {
        match id {
            Some(id) => self
                .get(id)
                .ok_or_else(|| Error::profile_not_found(id.as_str())),
            None => Ok(self.active()),
        }
    }

    /// Replace the profile with the same id, or append it if new, then make
    /// it active.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn save(&mut self, profile: Profile) -> Result<()> {
        let id = profile.id.clone();
        match self.profiles.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        self.persist_profiles()?;
        self.emit(BookEvent::Saved(id.clone()));
        self.set_active(Some(id))
    }

    /// Append a new empty profile named `Profile <n+1>` and make it active.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn add(&mut self) -> Result<&Profile> {
        let profile = Profile::new(format!("Profile {}", self.profiles.len() + 1));
        let id = profile.id.clone();
        info!("Adding profile {} ({})", profile.name, id);
        self.profiles.push(profile);
        self.persist_profiles()?;
        self.emit(BookEvent::Saved(id.clone()));
        self.set_active(Some(id))?;
        Ok(self.active())
    }

    /// Make `id` the active profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] for an unknown id, or a store error.
    pub fn select(&mut self, id: &ProfileId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::profile_not_found(id.as_str()));
        }
        self.set_active(Some(id.clone()))
    }

    /// Remove a profile.
    ///
    /// If it was active, the first remaining profile becomes active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LastProfile`] when only one profile remains (nothing
    /// changes), [`Error::ProfileNotFound`] for an unknown id, or a store error.
    pub fn delete(&mut self, id: &ProfileId) -> Result<()> {
        if self.profiles.len() == 1 {
            warn!("Refusing to delete the last profile");
            return Err(Error::LastProfile);
        }
        let index = self
            .profiles
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| Error::profile_not_found(id.as_str()))?;

        let removed = self.profiles.remove(index);
        info!("Deleted profile {} ({})", removed.name, removed.id);
        self.persist_profiles()?;
        self.emit(BookEvent::Deleted(removed.id));

        if self.active.as_ref() == Some(id) {
            let next = self.profiles.first().map(|p| p.id.clone());
            self.set_active(next)?;
        }
        Ok(())
    }

    /// Borrow the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn set_active(&mut self, id: Option<ProfileId>) -> Result<()> {
        self.store.set(ACTIVE_PROFILE_KEY, &id)?;
        if self.active != id {
            debug!("Active profile is now {:?}", id);
            self.active = id.clone();
            self.emit(BookEvent::ActiveChanged(id));
        }
        Ok(())
    }

    fn persist_profiles(&self) -> Result<()> {
        self.store.set(PROFILES_KEY, &self.profiles)
    }

    fn emit(&self, event: BookEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
