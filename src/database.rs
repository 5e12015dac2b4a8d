use std::sync::{Mutex, MutexGuard, PoisonError};

use mongodb::{bson, Collection};

use crate::campaign::db::CampaignStore;
use crate::campaign::Campaign;
use crate::error::Error;
use crate::mission::db::MissionStore;
use crate::mission::MissionTemplate;
use crate::mission_log::db::MissionLogStore;
use crate::mission_log::MissionLog;
use crate::partner::db::PartnerStore;
use crate::partner::Partner;
use crate::reward::db::RewardStore;
use crate::reward::RewardTracking;
use crate::session::db::SessionStore;
use crate::session::Session;
use crate::user::db::ProfileStore;
use crate::user::Profile;

pub type MongoCampaignStore = Collection<Campaign>;
pub type MongoMissionStore = Collection<MissionTemplate>;
pub type MongoMissionLogStore = Collection<MissionLog>;
pub type MongoRewardStore = Collection<RewardTracking>;
pub type MongoPartnerStore = Collection<Partner>;
pub type MongoProfileStore = Collection<Profile>;
pub type MongoSessionStore = Collection<Session>;

pub type MemoryCampaignStore = MemoryCollection<Campaign>;
pub type MemoryMissionStore = MemoryCollection<MissionTemplate>;
pub type MemoryMissionLogStore = MemoryCollection<MissionLog>;
pub type MemoryRewardStore = MemoryCollection<RewardTracking>;
pub type MemoryPartnerStore = MemoryCollection<Partner>;
pub type MemoryProfileStore = MemoryCollection<Profile>;
pub type MemorySessionStore = MemoryCollection<Session>;

/// Access to every store the console reads from or writes to.
pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
    fn missions(&self) -> &dyn MissionStore;
    fn mission_logs(&self) -> &dyn MissionLogStore;
    fn rewards(&self) -> &dyn RewardStore;
    fn partners(&self) -> &dyn PartnerStore;
    fn profiles(&self) -> &dyn ProfileStore;
    fn sessions(&self) -> &dyn SessionStore;
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: MongoCampaignStore,
    missions: MongoMissionStore,
    mission_logs: MongoMissionLogStore,
    rewards: MongoRewardStore,
    partners: MongoPartnerStore,
    profiles: MongoProfileStore,
    sessions: MongoSessionStore,
}

impl MongoDatabase {
    pub async fn initialize(db: mongodb::Database) -> Result<MongoDatabase, Error> {
        // ping the database to ensure connection is established
        db.run_command(bson::doc! { "ping": 1 }, None).await?;

        crate::campaign::db::initialize(&db).await?;
        crate::mission::db::initialize(&db).await?;
        crate::mission_log::db::initialize(&db).await?;
        crate::reward::db::initialize(&db).await?;
        crate::partner::db::initialize(&db).await?;

        Ok(MongoDatabase {
            campaigns: db.collection("campaigns"),
            missions: db.collection("missions"),
            mission_logs: db.collection("mission_logs"),
            rewards: db.collection("rewards"),
            partners: db.collection("partners"),
            profiles: db.collection("profiles"),
            sessions: db.collection("sessions"),
        })
    }
}

impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn missions(&self) -> &dyn MissionStore {
        &self.missions
    }

    fn mission_logs(&self) -> &dyn MissionLogStore {
        &self.mission_logs
    }

    fn rewards(&self) -> &dyn RewardStore {
        &self.rewards
    }

    fn partners(&self) -> &dyn PartnerStore {
        &self.partners
    }

    fn profiles(&self) -> &dyn ProfileStore {
        &self.profiles
    }

    fn sessions(&self) -> &dyn SessionStore {
        &self.sessions
    }
}

/// Process-local rows of a single entity. Used by the `memory` backend.
#[derive(Debug)]
pub struct MemoryCollection<T> {
    rows: Mutex<Vec<T>>,
}

impl<T: Clone> MemoryCollection<T> {
    pub fn new() -> MemoryCollection<T> {
        MemoryCollection {
            rows: Mutex::new(Vec::new()),
        }
    }

    fn rows(&self) -> MutexGuard<'_, Vec<T>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, row: T) {
        self.rows().push(row);
    }

    pub fn find(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows().iter().filter(|row| filter(row)).cloned().collect()
    }

    pub fn find_one(&self, filter: impl Fn(&T) -> bool) -> Option<T> {
        self.rows().iter().find(|row| filter(row)).cloned()
    }

    /// Applies `update` to every matching row and returns how many matched.
    pub fn update(&self, filter: impl Fn(&T) -> bool, mut update: impl FnMut(&mut T)) -> usize {
        let mut matched = 0;
        for row in self.rows().iter_mut().filter(|row| filter(row)) {
            update(row);
            matched += 1;
        }
        matched
    }

    /// Replaces the first matching row, inserting `row` if none matched when `upsert` is set.
    pub fn replace(&self, filter: impl Fn(&T) -> bool, row: T, upsert: bool) -> usize {
        let mut rows = self.rows();
        match rows.iter_mut().find(|existing| filter(existing)) {
            Some(existing) => {
                *existing = row;
                1
            }
            None if upsert => {
                rows.push(row);
                0
            }
            None => 0,
        }
    }

    pub fn delete(&self, filter: impl Fn(&T) -> bool) -> usize {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|row| !filter(row));
        before - rows.len()
    }
}

impl<T: Clone> Default for MemoryCollection<T> {
    fn default() -> MemoryCollection<T> {
        MemoryCollection::new()
    }
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub campaigns: MemoryCampaignStore,
    pub missions: MemoryMissionStore,
    pub mission_logs: MemoryMissionLogStore,
    pub rewards: MemoryRewardStore,
    pub partners: MemoryPartnerStore,
    pub profiles: MemoryProfileStore,
    pub sessions: MemorySessionStore,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }
}

impl Database for MemoryDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn missions(&self) -> &dyn MissionStore {
        &self.missions
    }

    fn mission_logs(&self) -> &dyn MissionLogStore {
        &self.mission_logs
    }

    fn rewards(&self) -> &dyn RewardStore {
        &self.rewards
    }

    fn partners(&self) -> &dyn PartnerStore {
        &self.partners
    }

    fn profiles(&self) -> &dyn ProfileStore {
        &self.profiles
    }

    fn sessions(&self) -> &dyn SessionStore {
        &self.sessions
    }
}
