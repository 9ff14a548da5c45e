use crate::model::{SeasonId, TeamSummary, View};
use log::debug;
use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// Name of the bucket a team list is stored under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(view: &View, division: Option<&str>, past_season: Option<SeasonId>) -> Self {
        match (view, division, past_season) {
            (View::Division, Some(division), _) => Self(format!("division-{division}")),
            (View::PastSeasons, _, Some(season_id)) => Self(format!("past_season-{season_id}")),
            _ => Self(view.as_str().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    teams: Vec<TeamSummary>,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct TeamCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl Default for TeamCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl TeamCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored list only while it is younger than the TTL
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<&[TeamSummary]> {
        let entry = self.entries.get(key)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age < self.ttl {
            debug!("Team cache hit for {key} (age {age:?})");
            Some(&entry.teams)
        } else {
            debug!("Team cache entry for {key} is stale (age {age:?})");
            None
        }
    }

    pub fn insert(&mut self, key: CacheKey, teams: Vec<TeamSummary>, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                teams,
                fetched_at: now,
            },
        );
    }

    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            debug!("Dropping {} team cache buckets", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn team(id: u64) -> TeamSummary {
        TeamSummary {
            id,
            name: format!("Team {id}"),
            game_id: 1,
            game_title: "Chess".to_string(),
            game_division: Some("Strategy".to_string()),
            game_has_image: false,
            manager_id: None,
            member_count: 1,
            max_size: None,
            season_name: None,
            season_active: None,
            created_at: None,
        }
    }

    #[test]
    fn test_key_derivation() {
        assert_eq!(CacheKey::derive(&View::All, None, None).as_str(), "all");
        assert_eq!(
            CacheKey::derive(&View::Division, Some("Shooter"), None).as_str(),
            "division-Shooter"
        );
        assert_eq!(
            CacheKey::derive(&View::Division, None, None).as_str(),
            "division"
        );
        assert_eq!(
            CacheKey::derive(&View::PastSeasons, None, Some(4)).as_str(),
            "past_season-4"
        );
        assert_eq!(
            CacheKey::derive(&View::PastSeasons, None, None).as_str(),
            "past_seasons"
        );
        // Filters only shape the key for the view they belong to
        assert_eq!(
            CacheKey::derive(&View::Manage, Some("Shooter"), Some(4)).as_str(),
            "manage"
        );
    }

    #[test]
    fn test_freshness_window() {
        let mut cache = TeamCache::default();
        let key = CacheKey::derive(&View::All, None, None);
        let start = Instant::now();
        cache.insert(key.clone(), vec![team(1), team(2)], start);

        assert_eq!(cache.get(&key, start).map(|t| t.len()), Some(2));
        assert_eq!(
            cache.get(&key, start + Duration::from_secs(29)).map(|t| t.len()),
            Some(2)
        );
        assert!(cache.get(&key, start + CACHE_TTL).is_none());
        assert!(cache.get(&key, start + Duration::from_secs(31)).is_none());
    }

    #[test]
    fn test_invalidate_all() {
        let mut cache = TeamCache::default();
        let start = Instant::now();
        let keys = [
            CacheKey::derive(&View::All, None, None),
            CacheKey::derive(&View::Division, Some("Sports"), None),
            CacheKey::derive(&View::PastSeasons, None, Some(2)),
        ];
        for key in keys.iter() {
            cache.insert(key.clone(), vec![team(1)], start);
        }
        assert_eq!(cache.len(), 3);

        cache.invalidate_all();
        assert!(cache.is_empty());
        for key in keys.iter() {
            assert!(cache.get(key, start).is_none());
        }
    }

    #[test]
    fn test_custom_ttl() {
        let mut cache = TeamCache::new(Duration::from_secs(5));
        let key = CacheKey::derive(&View::Play, None, None);
        let start = Instant::now();
        cache.insert(key.clone(), vec![team(1)], start);
        assert!(cache.get(&key, start + Duration::from_secs(4)).is_some());
        assert!(cache.get(&key, start + Duration::from_secs(5)).is_none());
    }
}
