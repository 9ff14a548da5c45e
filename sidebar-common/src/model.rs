use enum_iterator::{Sequence, all};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{
    OffsetDateTime,
    format_description::well_known::{
        Iso8601,
        iso8601::{self, EncodedConfig},
    },
};

const CONFIG: EncodedConfig = iso8601::Config::DEFAULT.encode();
const FORMAT: Iso8601<CONFIG> = Iso8601::<CONFIG>;
time::serde::format_description!(iso8601_timestamp, OffsetDateTime, FORMAT);

pub type TeamId = u64;
pub type GameId = u64;
pub type SeasonId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub value: String,
    pub label: String,
}

/// A named scope of the team list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum View {
    #[default]
    All,
    Manage,
    Play,
    Division,
    PastSeasons,
    MyPast,
    PastManaged,
    /// A view name the server offered that this client has no special handling for
    Other(String),
}

impl View {
    pub fn from_value(value: &str) -> Self {
        match value {
            "all" => Self::All,
            "manage" => Self::Manage,
            "play" => Self::Play,
            "division" => Self::Division,
            "past_seasons" => Self::PastSeasons,
            "my_past" => Self::MyPast,
            "past_managed" => Self::PastManaged,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Manage => "manage",
            Self::Play => "play",
            Self::Division => "division",
            Self::PastSeasons => "past_seasons",
            Self::MyPast => "my_past",
            Self::PastManaged => "past_managed",
            Self::Other(name) => name,
        }
    }

    /// Whether teams in this view are shown in per-game folders
    pub fn groups_by_game(&self) -> bool {
        matches!(self, Self::All | Self::Division | Self::PastSeasons)
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::All => "No teams have been created yet.",
            Self::Manage => "You are not managing any teams.",
            Self::Play => "You are not a member of any teams.",
            Self::Division => "No teams found in this division.",
            Self::PastSeasons => "No teams found for this season.",
            _ => "No teams to display.",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse genre tag on a game community. The declaration order is the sidebar sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence)]
pub enum Division {
    Strategy,
    Shooter,
    Sports,
    Other,
}

impl Division {
    /// Rank given to games with a missing or unrecognized division
    pub const UNRANKED: usize = 999;

    pub fn name(self) -> &'static str {
        match self {
            Self::Strategy => "Strategy",
            Self::Shooter => "Shooter",
            Self::Sports => "Sports",
            Self::Other => "Other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        all::<Self>().find(|d| d.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn rank_of(name: Option<&str>) -> usize {
        name.and_then(Self::from_name)
            .and_then(|d| all::<Self>().position(|other| other == d))
            .unwrap_or(Self::UNRANKED)
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    pub game_id: GameId,
    pub game_title: String,
    pub game_division: Option<String>,
    #[serde(default)]
    pub game_has_image: bool,
    pub manager_id: Option<u64>,
    #[serde(default)]
    pub member_count: u32,
    pub max_size: Option<u32>,
    pub season_name: Option<String>,
    pub season_active: Option<bool>,
    #[serde(default, with = "iso8601_timestamp::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl TeamSummary {
    pub fn division_rank(&self) -> usize {
        Division::rank_of(self.game_division.as_deref())
    }

    pub fn in_division(&self, division: &str) -> bool {
        self.game_division
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case(division.trim()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastSeason {
    pub season_id: SeasonId,
    pub season_name: String,
}

/// Facts about the current user, computed by the dashboard rather than by the sidebar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    pub is_admin: bool,
}
