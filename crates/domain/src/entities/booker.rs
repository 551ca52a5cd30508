//! Booker entity - the decision profile behind autonomous booking.
//!
//! A booker is loaded fresh for every decision and only changes through
//! explicit saves to its repository.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, DomainError};
use crate::ids::{BookerId, CompanyId};
use crate::value_objects::ProductType;

/// Score at or above which a trait counts as dominant.
pub const DOMINANT_TRAIT: i32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStyle {
    LongTerm,
    ShortTerm,
    #[default]
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    #[default]
    Active,
    Inactive,
    Fired,
}

impl BookingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStyle::LongTerm => "long_term",
            BookingStyle::ShortTerm => "short_term",
            BookingStyle::Flexible => "flexible",
        }
    }
}

impl std::str::FromStr for BookingStyle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long_term" => Ok(BookingStyle::LongTerm),
            "short_term" => Ok(BookingStyle::ShortTerm),
            "flexible" => Ok(BookingStyle::Flexible),
            other => Err(DomainError::parse(format!("Unknown booking style: {other}"))),
        }
    }
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Active => "active",
            EmploymentStatus::Inactive => "inactive",
            EmploymentStatus::Fired => "fired",
        }
    }
}

impl std::str::FromStr for EmploymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EmploymentStatus::Active),
            "inactive" => Ok(EmploymentStatus::Inactive),
            "fired" => Ok(EmploymentStatus::Fired),
            other => Err(DomainError::parse(format!(
                "Unknown employment status: {other}"
            ))),
        }
    }
}

/// Worker archetypes a booker can have a soft spot for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerArchetype {
    Underdog,
    Veteran,
    FastRiser,
    SlowBurn,
}

/// Short label describing how a booker thinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativeProfile {
    Genius,
    CreativeVisionary,
    StrategicPlanner,
    Chaotic,
    Balanced,
}

impl fmt::Display for CreativeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CreativeProfile::Genius => "Genius Booker",
            CreativeProfile::CreativeVisionary => "Creative Visionary",
            CreativeProfile::StrategicPlanner => "Strategic Planner",
            CreativeProfile::Chaotic => "Chaotic Booker",
            CreativeProfile::Balanced => "Balanced Booker",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booker {
    pub id: BookerId,
    pub company_id: CompanyId,
    pub name: String,
    /// 0-100; creative bookers are less predictable
    pub creativity_score: i32,
    /// 0-100; logical bookers favour stability and remember patterns
    pub logic_score: i32,
    pub bias_resistance: i32,
    pub preferred_style: BookingStyle,
    pub preferred_product: ProductType,
    pub likes_underdog: bool,
    pub likes_veteran: bool,
    pub likes_fast_rise: bool,
    pub likes_slow_burn: bool,
    pub auto_booking_enabled: bool,
    pub employment_status: EmploymentStatus,
    pub hired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Booker {
    pub fn new(
        company_id: CompanyId,
        name: impl Into<String>,
        creativity_score: i32,
        logic_score: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookerId::new(),
            company_id,
            name: name.into(),
            creativity_score,
            logic_score,
            bias_resistance: 50,
            preferred_style: BookingStyle::default(),
            preferred_product: ProductType::default(),
            likes_underdog: false,
            likes_veteran: false,
            likes_fast_rise: false,
            likes_slow_burn: false,
            auto_booking_enabled: true,
            employment_status: EmploymentStatus::Active,
            hired_at: now,
            created_at: now,
        }
    }

    pub fn with_product(mut self, product: ProductType) -> Self {
        self.preferred_product = product;
        self
    }

    pub fn with_auto_booking(mut self, enabled: bool) -> Self {
        self.auto_booking_enabled = enabled;
        self
    }

    pub fn liking(mut self, archetype: WorkerArchetype) -> Self {
        match archetype {
            WorkerArchetype::Underdog => self.likes_underdog = true,
            WorkerArchetype::Veteran => self.likes_veteran = true,
            WorkerArchetype::FastRiser => self.likes_fast_rise = true,
            WorkerArchetype::SlowBurn => self.likes_slow_burn = true,
        }
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().chars().count() < 2 {
            return Err(DomainError::validation(
                "Booker name must be at least 2 characters",
            ));
        }
        if self.name.chars().count() > 200 {
            return Err(DomainError::validation(
                "Booker name must be at most 200 characters",
            ));
        }
        ensure_range("creativity_score", self.creativity_score, 0, 100)?;
        ensure_range("logic_score", self.logic_score, 0, 100)?;
        ensure_range("bias_resistance", self.bias_resistance, 0, 100)?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.employment_status == EmploymentStatus::Active
    }

    pub fn can_auto_book(&self) -> bool {
        self.auto_booking_enabled && self.is_active()
    }

    pub fn is_creative(&self) -> bool {
        self.creativity_score >= DOMINANT_TRAIT
    }

    pub fn is_logical(&self) -> bool {
        self.logic_score >= DOMINANT_TRAIT
    }

    /// Static consistency: the mean of creativity and logic.
    pub fn consistency_score(&self) -> i32 {
        (self.creativity_score + self.logic_score) / 2
    }

    pub fn favors(&self, archetype: WorkerArchetype) -> bool {
        match archetype {
            WorkerArchetype::Underdog => self.likes_underdog,
            WorkerArchetype::Veteran => self.likes_veteran,
            WorkerArchetype::FastRiser => self.likes_fast_rise,
            WorkerArchetype::SlowBurn => self.likes_slow_burn,
        }
    }

    pub fn creative_profile(&self) -> CreativeProfile {
        match (self.creativity_score, self.logic_score) {
            (c, l) if c >= DOMINANT_TRAIT && l >= DOMINANT_TRAIT => CreativeProfile::Genius,
            (c, _) if c >= DOMINANT_TRAIT => CreativeProfile::CreativeVisionary,
            (_, l) if l >= DOMINANT_TRAIT => CreativeProfile::StrategicPlanner,
            (c, l) if c <= 30 && l <= 30 => CreativeProfile::Chaotic,
            _ => CreativeProfile::Balanced,
        }
    }
}
