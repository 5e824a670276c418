//! Static rules catalog: resources, ages, building and unit stats.
//!
//! Everything in here is data. The tables are plain `match` expressions so the
//! compiler checks every kind has an entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Feeds citizens and most infantry.
    Food,
    /// Main construction material.
    Wood,
    /// Weapons and late buildings.
    Metal,
    /// Currency.
    Gold,
    /// Research; gates later ages.
    Knowledge,
    /// Industrial fuel.
    Oil,
}

impl Resource {
    /// All resources in canonical order.
    pub const ALL: [Resource; 6] = [
        Resource::Food,
        Resource::Wood,
        Resource::Metal,
        Resource::Gold,
        Resource::Knowledge,
        Resource::Oil,
    ];

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Metal => "metal",
            Resource::Gold => "gold",
            Resource::Knowledge => "knowledge",
            Resource::Oil => "oil",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An amount of every resource.
///
/// Used for stockpiles, per-tick rates, storage caps and costs alike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Food.
    pub food: f64,
    /// Wood.
    pub wood: f64,
    /// Metal.
    pub metal: f64,
    /// Gold.
    pub gold: f64,
    /// Knowledge.
    pub knowledge: f64,
    /// Oil.
    pub oil: f64,
}

impl Resources {
    /// Nothing of anything.
    pub const ZERO: Resources = Resources {
        food: 0.0,
        wood: 0.0,
        metal: 0.0,
        gold: 0.0,
        knowledge: 0.0,
        oil: 0.0,
    };

    /// The same amount of every resource.
    #[must_use]
    pub const fn splat(value: f64) -> Self {
        Self {
            food: value,
            wood: value,
            metal: value,
            gold: value,
            knowledge: value,
            oil: value,
        }
    }

    /// Amount of one resource.
    #[must_use]
    pub const fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Metal => self.metal,
            Resource::Gold => self.gold,
            Resource::Knowledge => self.knowledge,
            Resource::Oil => self.oil,
        }
    }

    /// Mutable amount of one resource.
    pub fn get_mut(&mut self, resource: Resource) -> &mut f64 {
        match resource {
            Resource::Food => &mut self.food,
            Resource::Wood => &mut self.wood,
            Resource::Metal => &mut self.metal,
            Resource::Gold => &mut self.gold,
            Resource::Knowledge => &mut self.knowledge,
            Resource::Oil => &mut self.oil,
        }
    }

    /// Whether every amount in `cost` is available.
    #[must_use]
    pub fn covers(&self, cost: &Resources) -> bool {
        Resource::ALL
            .iter()
            .all(|&r| self.get(r) >= cost.get(r))
    }

    /// Amount missing to pay `cost`, zero where there is enough.
    #[must_use]
    pub fn shortfall(&self, cost: &Resources) -> Resources {
        let mut missing = Resources::ZERO;
        for r in Resource::ALL {
            *missing.get_mut(r) = (cost.get(r) - self.get(r)).max(0.0);
        }
        missing
    }

    /// Subtract `cost`, flooring each resource at zero.
    pub fn subtract(&mut self, cost: &Resources) {
        for r in Resource::ALL {
            let value = self.get_mut(r);
            *value = (*value - cost.get(r)).max(0.0);
        }
    }

    /// Add `delta` and clamp each resource to `[0, cap]`.
    pub fn add_clamped(&mut self, delta: &Resources, cap: &Resources) {
        for r in Resource::ALL {
            let value = self.get_mut(r);
            *value = (*value + delta.get(r)).clamp(0.0, cap.get(r).max(0.0));
        }
    }

    /// Add `other` without any cap.
    pub fn accumulate(&mut self, other: &Resources) {
        for r in Resource::ALL {
            *self.get_mut(r) += other.get(r);
        }
    }

    /// Sum of all amounts, used as a rough value measure.
    #[must_use]
    pub fn total(&self) -> f64 {
        Resource::ALL.iter().map(|&r| self.get(r)).sum()
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for r in Resource::ALL {
            let amount = self.get(r);
            if amount <= 0.0 {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{:.0} {}", amount.ceil(), r.name())?;
            first = false;
        }
        if first {
            f.write_str("nothing")?;
        }
        Ok(())
    }
}

/// A historical era. Ordered: later ages compare greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Age {
    /// Starting age.
    #[default]
    Classical,
    /// Second age.
    Medieval,
    /// Third age.
    Enlightenment,
    /// Fourth age.
    Industrial,
    /// Final age.
    Modern,
}

impl Age {
    /// Zero-based position of the age.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Age::Classical => 0,
            Age::Medieval => 1,
            Age::Enlightenment => 2,
            Age::Industrial => 3,
            Age::Modern => 4,
        }
    }

    /// The following age, if any.
    #[must_use]
    pub const fn next(self) -> Option<Age> {
        match self {
            Age::Classical => Some(Age::Medieval),
            Age::Medieval => Some(Age::Enlightenment),
            Age::Enlightenment => Some(Age::Industrial),
            Age::Industrial => Some(Age::Modern),
            Age::Modern => None,
        }
    }

    /// Population cap granted by the age itself.
    #[must_use]
    pub const fn population_bonus(self) -> u32 {
        match self {
            Age::Classical => 5,
            Age::Medieval => 10,
            Age::Enlightenment => 15,
            Age::Industrial => 20,
            Age::Modern => 25,
        }
    }

    /// Cost of leaving this age for the next one.
    #[must_use]
    pub fn advance_cost(self) -> Option<Resources> {
        let cost = match self {
            Age::Classical => Resources {
                food: 300.0,
                wood: 250.0,
                gold: 100.0,
                ..Resources::ZERO
            },
            Age::Medieval => Resources {
                food: 600.0,
                wood: 400.0,
                gold: 300.0,
                knowledge: 150.0,
                ..Resources::ZERO
            },
            Age::Enlightenment => Resources {
                food: 800.0,
                wood: 600.0,
                metal: 400.0,
                gold: 500.0,
                knowledge: 400.0,
                ..Resources::ZERO
            },
            Age::Industrial => Resources {
                food: 1000.0,
                metal: 800.0,
                gold: 800.0,
                knowledge: 800.0,
                oil: 300.0,
                ..Resources::ZERO
            },
            Age::Modern => return None,
        };
        Some(cost)
    }

    /// Multiplier applied to military health and attack for units created in this age.
    #[must_use]
    pub fn military_scale(self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let steps = self.index() as f32;
        1.0 + 0.1 * steps
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Age::Classical => "Classical",
            Age::Medieval => "Medieval",
            Age::Enlightenment => "Enlightenment",
            Age::Industrial => "Industrial",
            Age::Modern => "Modern",
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A deposit a resource building has to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deposit {
    /// Forest tiles (woodcutter's camps).
    Forest,
    /// Metal deposits (mines).
    Metal,
    /// Oil deposits (oil wells).
    Oil,
    /// Open water (docks).
    Water,
}

impl fmt::Display for Deposit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deposit::Forest => write!(f, "forest"),
            Deposit::Metal => write!(f, "a metal deposit"),
            Deposit::Oil => write!(f, "an oil deposit"),
            Deposit::Water => write!(f, "water"),
        }
    }
}

/// Broad building category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    /// Territory-defining city buildings.
    City,
    /// Housing, gathering and infrastructure.
    Economic,
    /// Unit production.
    Military,
    /// Walls and fortifications.
    Defensive,
    /// Wonders.
    Wonder,
}

/// Building kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Seat of a city; defines territory and trains citizens.
    CityCenter,
    /// Housing.
    House,
    /// Food.
    Farm,
    /// Wood; must touch a forest.
    WoodcuttersCamp,
    /// Metal; must touch a metal deposit.
    Mine,
    /// Gold.
    Market,
    /// Fishing food; must touch water; trains ships.
    Dock,
    /// Knowledge.
    Library,
    /// Oil; must touch an oil deposit.
    OilWell,
    /// Trains foot soldiers.
    Barracks,
    /// Trains cavalry.
    Stable,
    /// Trains catapults.
    SiegeWorkshop,
    /// Trains tanks.
    Factory,
    /// Fortified city seat; defines territory.
    Castle,
    /// Defensive wall segment.
    Wall,
    /// Road; passable.
    Road,
    /// Wonder.
    Wonder,
}

/// Static stats for a building kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingStats {
    /// Display name.
    pub name: &'static str,
    /// Category.
    pub category: BuildingCategory,
    /// Footprint width in tiles.
    pub width: u16,
    /// Footprint height in tiles.
    pub height: u16,
    /// Health when intact.
    pub max_health: f32,
    /// Placement cost.
    pub cost: Resources,
    /// Earliest age it can be placed in.
    pub min_age: Age,
    /// Population cap added once complete.
    pub housing: u32,
    /// Maximum number of gatherers that produce.
    pub worker_capacity: u32,
    /// Resource gathered by workers, if any.
    pub produces: Option<Resource>,
    /// Per-worker multiplier on the base gather rate.
    pub rate_multiplier: f64,
    /// Income per tick that needs no workers (taxation, culture).
    pub passive_income: Resources,
    /// Units this building can train.
    pub trains: &'static [UnitKind],
    /// Deposit the footprint has to touch.
    pub deposit: Option<Deposit>,
}

impl BuildingKind {
    /// All building kinds.
    pub const ALL: [BuildingKind; 17] = [
        BuildingKind::CityCenter,
        BuildingKind::House,
        BuildingKind::Farm,
        BuildingKind::WoodcuttersCamp,
        BuildingKind::Mine,
        BuildingKind::Market,
        BuildingKind::Dock,
        BuildingKind::Library,
        BuildingKind::OilWell,
        BuildingKind::Barracks,
        BuildingKind::Stable,
        BuildingKind::SiegeWorkshop,
        BuildingKind::Factory,
        BuildingKind::Castle,
        BuildingKind::Wall,
        BuildingKind::Road,
        BuildingKind::Wonder,
    ];

    /// Largest footprint side of any building.
    pub const MAX_FOOTPRINT: u16 = 3;

    /// Static stats for this kind.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn stats(self) -> BuildingStats {
        let base = BuildingStats {
            name: "",
            category: BuildingCategory::Economic,
            width: 1,
            height: 1,
            max_health: 300.0,
            cost: Resources::ZERO,
            min_age: Age::Classical,
            housing: 0,
            worker_capacity: 0,
            produces: None,
            rate_multiplier: 0.0,
            passive_income: Resources::ZERO,
            trains: &[],
            deposit: None,
        };
        match self {
            BuildingKind::CityCenter => BuildingStats {
                name: "City Center",
                category: BuildingCategory::City,
                width: 3,
                height: 3,
                max_health: 2000.0,
                cost: Resources {
                    wood: 400.0,
                    metal: 100.0,
                    gold: 200.0,
                    ..Resources::ZERO
                },
                housing: 5,
                passive_income: Resources {
                    gold: 0.02,
                    knowledge: 0.01,
                    ..Resources::ZERO
                },
                trains: &[UnitKind::Citizen],
                ..base
            },
            BuildingKind::House => BuildingStats {
                name: "House",
                cost: Resources {
                    wood: 30.0,
                    ..Resources::ZERO
                },
                housing: 5,
                ..base
            },
            BuildingKind::Farm => BuildingStats {
                name: "Farm",
                width: 2,
                height: 2,
                max_health: 400.0,
                cost: Resources {
                    wood: 60.0,
                    ..Resources::ZERO
                },
                worker_capacity: 4,
                produces: Some(Resource::Food),
                rate_multiplier: 1.0,
                ..base
            },
            BuildingKind::WoodcuttersCamp => BuildingStats {
                name: "Woodcutter's Camp",
                max_health: 350.0,
                cost: Resources {
                    wood: 50.0,
                    ..Resources::ZERO
                },
                worker_capacity: 4,
                produces: Some(Resource::Wood),
                rate_multiplier: 1.0,
                deposit: Some(Deposit::Forest),
                ..base
            },
            BuildingKind::Mine => BuildingStats {
                name: "Mine",
                max_health: 500.0,
                cost: Resources {
                    wood: 80.0,
                    ..Resources::ZERO
                },
                worker_capacity: 4,
                produces: Some(Resource::Metal),
                rate_multiplier: 0.6,
                deposit: Some(Deposit::Metal),
                ..base
            },
            BuildingKind::Market => BuildingStats {
                name: "Market",
                width: 2,
                height: 2,
                max_health: 600.0,
                cost: Resources {
                    food: 50.0,
                    wood: 120.0,
                    ..Resources::ZERO
                },
                worker_capacity: 3,
                produces: Some(Resource::Gold),
                rate_multiplier: 0.5,
                ..base
            },
            BuildingKind::Dock => BuildingStats {
                name: "Dock",
                max_health: 600.0,
                cost: Resources {
                    wood: 100.0,
                    ..Resources::ZERO
                },
                worker_capacity: 3,
                produces: Some(Resource::Food),
                rate_multiplier: 1.2,
                trains: &[UnitKind::FishingBoat, UnitKind::Galley],
                deposit: Some(Deposit::Water),
                ..base
            },
            BuildingKind::Library => BuildingStats {
                name: "Library",
                width: 2,
                height: 2,
                max_health: 500.0,
                cost: Resources {
                    wood: 150.0,
                    gold: 100.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                worker_capacity: 3,
                produces: Some(Resource::Knowledge),
                rate_multiplier: 0.4,
                ..base
            },
            BuildingKind::OilWell => BuildingStats {
                name: "Oil Well",
                max_health: 500.0,
                cost: Resources {
                    wood: 100.0,
                    metal: 150.0,
                    ..Resources::ZERO
                },
                min_age: Age::Industrial,
                worker_capacity: 3,
                produces: Some(Resource::Oil),
                rate_multiplier: 0.5,
                deposit: Some(Deposit::Oil),
                ..base
            },
            BuildingKind::Barracks => BuildingStats {
                name: "Barracks",
                category: BuildingCategory::Military,
                width: 2,
                height: 2,
                max_health: 1200.0,
                cost: Resources {
                    wood: 150.0,
                    ..Resources::ZERO
                },
                trains: &[UnitKind::Infantry, UnitKind::Archer, UnitKind::Musketeer],
                ..base
            },
            BuildingKind::Stable => BuildingStats {
                name: "Stable",
                category: BuildingCategory::Military,
                width: 2,
                height: 2,
                max_health: 1200.0,
                cost: Resources {
                    wood: 180.0,
                    gold: 50.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                trains: &[UnitKind::Cavalry],
                ..base
            },
            BuildingKind::SiegeWorkshop => BuildingStats {
                name: "Siege Workshop",
                category: BuildingCategory::Military,
                width: 2,
                height: 2,
                max_health: 1200.0,
                cost: Resources {
                    wood: 200.0,
                    metal: 50.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                trains: &[UnitKind::Catapult],
                ..base
            },
            BuildingKind::Factory => BuildingStats {
                name: "Factory",
                category: BuildingCategory::Military,
                width: 3,
                height: 3,
                max_health: 2500.0,
                cost: Resources {
                    wood: 200.0,
                    metal: 300.0,
                    gold: 200.0,
                    ..Resources::ZERO
                },
                min_age: Age::Industrial,
                trains: &[UnitKind::Tank],
                ..base
            },
            BuildingKind::Castle => BuildingStats {
                name: "Castle",
                category: BuildingCategory::Defensive,
                width: 3,
                height: 3,
                max_health: 4000.0,
                cost: Resources {
                    wood: 200.0,
                    metal: 300.0,
                    gold: 200.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                housing: 10,
                passive_income: Resources {
                    gold: 0.03,
                    ..Resources::ZERO
                },
                ..base
            },
            BuildingKind::Wall => BuildingStats {
                name: "Wall",
                category: BuildingCategory::Defensive,
                max_health: 800.0,
                cost: Resources {
                    wood: 15.0,
                    ..Resources::ZERO
                },
                ..base
            },
            BuildingKind::Road => BuildingStats {
                name: "Road",
                max_health: 100.0,
                cost: Resources {
                    wood: 5.0,
                    ..Resources::ZERO
                },
                ..base
            },
            BuildingKind::Wonder => BuildingStats {
                name: "Wonder",
                category: BuildingCategory::Wonder,
                width: 3,
                height: 3,
                max_health: 5000.0,
                cost: Resources {
                    wood: 800.0,
                    metal: 600.0,
                    gold: 800.0,
                    knowledge: 300.0,
                    ..Resources::ZERO
                },
                min_age: Age::Enlightenment,
                passive_income: Resources {
                    knowledge: 0.1,
                    ..Resources::ZERO
                },
                ..base
            },
        }
    }

    /// Footprint as `(width, height)`.
    #[must_use]
    pub fn size(self) -> (u16, u16) {
        let stats = self.stats();
        (stats.width, stats.height)
    }

    /// Whether this kind defines territory around itself.
    #[must_use]
    pub const fn defines_territory(self) -> bool {
        matches!(self, BuildingKind::CityCenter | BuildingKind::Castle)
    }

    /// Whether units may walk over this building.
    #[must_use]
    pub const fn is_road(self) -> bool {
        matches!(self, BuildingKind::Road)
    }

    /// Whether naval units may enter this building's tiles.
    #[must_use]
    pub const fn is_dock(self) -> bool {
        matches!(self, BuildingKind::Dock)
    }

    /// Snake-case identifier used in commands and JSON.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            BuildingKind::CityCenter => "city_center",
            BuildingKind::House => "house",
            BuildingKind::Farm => "farm",
            BuildingKind::WoodcuttersCamp => "woodcutters_camp",
            BuildingKind::Mine => "mine",
            BuildingKind::Market => "market",
            BuildingKind::Dock => "dock",
            BuildingKind::Library => "library",
            BuildingKind::OilWell => "oil_well",
            BuildingKind::Barracks => "barracks",
            BuildingKind::Stable => "stable",
            BuildingKind::SiegeWorkshop => "siege_workshop",
            BuildingKind::Factory => "factory",
            BuildingKind::Castle => "castle",
            BuildingKind::Wall => "wall",
            BuildingKind::Road => "road",
            BuildingKind::Wonder => "wonder",
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stats().name)
    }
}

impl FromStr for BuildingKind {
    type Err = String;

    /// Accepts keys (`woodcutters_camp`) and display names (`Woodcutter's Camp`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        BuildingKind::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| format!("unknown building type '{s}'"))
    }
}

/// How a unit fights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatClass {
    /// Non-military; never auto-aggroes and flees from soldiers.
    Civilian,
    /// Close combat.
    Melee,
    /// Shoots from a distance.
    Ranged,
    /// Heavy damage against buildings.
    Siege,
}

/// Unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Worker and builder.
    Citizen,
    /// Naval worker.
    FishingBoat,
    /// Basic melee soldier.
    Infantry,
    /// Basic ranged soldier.
    Archer,
    /// Fast melee.
    Cavalry,
    /// Siege engine.
    Catapult,
    /// Gunpowder ranged soldier.
    Musketeer,
    /// Armoured siege vehicle.
    Tank,
    /// Warship.
    Galley,
}

/// Static stats for a unit kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    /// Display name.
    pub name: &'static str,
    /// Health at creation in the classical age.
    pub max_health: f32,
    /// Damage per hit in the classical age.
    pub attack: f32,
    /// Weapon range in tiles.
    pub range: f32,
    /// Speed multiplier on the base step.
    pub speed: f32,
    /// Ticks between attacks.
    pub cooldown: u32,
    /// Production ticks.
    pub build_time: u32,
    /// Training cost.
    pub cost: Resources,
    /// Earliest age it can be trained in.
    pub min_age: Age,
    /// How it fights.
    pub class: CombatClass,
    /// Whether it moves on water.
    pub naval: bool,
}

impl UnitKind {
    /// All unit kinds.
    pub const ALL: [UnitKind; 9] = [
        UnitKind::Citizen,
        UnitKind::FishingBoat,
        UnitKind::Infantry,
        UnitKind::Archer,
        UnitKind::Cavalry,
        UnitKind::Catapult,
        UnitKind::Musketeer,
        UnitKind::Tank,
        UnitKind::Galley,
    ];

    /// Static stats for this kind.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn stats(self) -> UnitStats {
        match self {
            UnitKind::Citizen => UnitStats {
                name: "Citizen",
                max_health: 40.0,
                attack: 2.0,
                range: 1.0,
                speed: 1.0,
                cooldown: 20,
                build_time: 50,
                cost: Resources {
                    food: 50.0,
                    ..Resources::ZERO
                },
                min_age: Age::Classical,
                class: CombatClass::Civilian,
                naval: false,
            },
            UnitKind::FishingBoat => UnitStats {
                name: "Fishing Boat",
                max_health: 60.0,
                attack: 0.0,
                range: 0.0,
                speed: 1.2,
                cooldown: 20,
                build_time: 60,
                cost: Resources {
                    wood: 50.0,
                    ..Resources::ZERO
                },
                min_age: Age::Classical,
                class: CombatClass::Civilian,
                naval: true,
            },
            UnitKind::Infantry => UnitStats {
                name: "Infantry",
                max_health: 100.0,
                attack: 8.0,
                range: 1.2,
                speed: 1.0,
                cooldown: 15,
                build_time: 80,
                cost: Resources {
                    food: 60.0,
                    gold: 20.0,
                    ..Resources::ZERO
                },
                min_age: Age::Classical,
                class: CombatClass::Melee,
                naval: false,
            },
            UnitKind::Archer => UnitStats {
                name: "Archer",
                max_health: 60.0,
                attack: 6.0,
                range: 5.0,
                speed: 1.0,
                cooldown: 20,
                build_time: 90,
                cost: Resources {
                    food: 40.0,
                    wood: 40.0,
                    ..Resources::ZERO
                },
                min_age: Age::Classical,
                class: CombatClass::Ranged,
                naval: false,
            },
            UnitKind::Cavalry => UnitStats {
                name: "Cavalry",
                max_health: 140.0,
                attack: 10.0,
                range: 1.2,
                speed: 1.8,
                cooldown: 15,
                build_time: 110,
                cost: Resources {
                    food: 80.0,
                    gold: 60.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                class: CombatClass::Melee,
                naval: false,
            },
            UnitKind::Catapult => UnitStats {
                name: "Catapult",
                max_health: 120.0,
                attack: 30.0,
                range: 7.0,
                speed: 0.6,
                cooldown: 60,
                build_time: 150,
                cost: Resources {
                    wood: 150.0,
                    metal: 60.0,
                    ..Resources::ZERO
                },
                min_age: Age::Medieval,
                class: CombatClass::Siege,
                naval: false,
            },
            UnitKind::Musketeer => UnitStats {
                name: "Musketeer",
                max_health: 110.0,
                attack: 14.0,
                range: 4.0,
                speed: 1.0,
                cooldown: 25,
                build_time: 100,
                cost: Resources {
                    food: 60.0,
                    metal: 40.0,
                    gold: 30.0,
                    ..Resources::ZERO
                },
                min_age: Age::Enlightenment,
                class: CombatClass::Ranged,
                naval: false,
            },
            UnitKind::Tank => UnitStats {
                name: "Tank",
                max_health: 400.0,
                attack: 40.0,
                range: 5.0,
                speed: 1.5,
                cooldown: 30,
                build_time: 200,
                cost: Resources {
                    metal: 200.0,
                    gold: 100.0,
                    oil: 100.0,
                    ..Resources::ZERO
                },
                min_age: Age::Industrial,
                class: CombatClass::Siege,
                naval: false,
            },
            UnitKind::Galley => UnitStats {
                name: "Galley",
                max_health: 200.0,
                attack: 12.0,
                range: 4.0,
                speed: 1.4,
                cooldown: 25,
                build_time: 120,
                cost: Resources {
                    wood: 150.0,
                    gold: 40.0,
                    ..Resources::ZERO
                },
                min_age: Age::Classical,
                class: CombatClass::Ranged,
                naval: true,
            },
        }
    }

    /// Whether the unit is a soldier (anything but a civilian).
    #[must_use]
    pub fn is_military(self) -> bool {
        self.stats().class != CombatClass::Civilian
    }

    /// Whether the unit moves on water.
    #[must_use]
    pub fn is_naval(self) -> bool {
        self.stats().naval
    }

    /// Whether idle units of this kind look for work on their own.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        matches!(self, UnitKind::Citizen | UnitKind::FishingBoat)
    }

    /// Snake-case identifier used in commands and JSON.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            UnitKind::Citizen => "citizen",
            UnitKind::FishingBoat => "fishing_boat",
            UnitKind::Infantry => "infantry",
            UnitKind::Archer => "archer",
            UnitKind::Cavalry => "cavalry",
            UnitKind::Catapult => "catapult",
            UnitKind::Musketeer => "musketeer",
            UnitKind::Tank => "tank",
            UnitKind::Galley => "galley",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stats().name)
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        UnitKind::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| format!("unknown unit type '{s}'"))
    }
}

/// Lowercase, drop apostrophes, and turn spaces and dashes into underscores.
fn normalize_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ages_are_ordered() {
        assert!(Age::Classical < Age::Medieval);
        assert!(Age::Industrial < Age::Modern);
        assert_eq!(Age::Classical.next(), Some(Age::Medieval));
        assert_eq!(Age::Modern.next(), None);
        assert!(Age::Modern.advance_cost().is_none());
    }

    #[test]
    fn test_age_costs_fit_default_storage() {
        let mut age = Age::Classical;
        while let Some(cost) = age.advance_cost() {
            for r in Resource::ALL {
                assert!(cost.get(r) <= 1000.0, "{age} cost of {r} exceeds storage");
            }
            age = age.next().unwrap();
        }
    }

    #[test]
    fn test_resources_covers_and_shortfall() {
        let stock = Resources {
            food: 100.0,
            wood: 20.0,
            ..Resources::ZERO
        };
        let cost = Resources {
            food: 50.0,
            wood: 50.0,
            ..Resources::ZERO
        };
        assert!(!stock.covers(&cost));
        let missing = stock.shortfall(&cost);
        assert!((missing.wood - 30.0).abs() < 1e-9);
        assert!(missing.food.abs() < 1e-9);
    }

    #[test]
    fn test_add_clamped_respects_cap_and_floor() {
        let mut stock = Resources::splat(990.0);
        stock.add_clamped(&Resources::splat(50.0), &Resources::splat(1000.0));
        assert!((stock.food - 1000.0).abs() < 1e-9);

        stock.add_clamped(&Resources::splat(-5000.0), &Resources::splat(1000.0));
        assert!(stock.gold.abs() < 1e-9);
    }

    #[test]
    fn test_building_kind_parsing() {
        assert_eq!(
            "woodcutters_camp".parse::<BuildingKind>(),
            Ok(BuildingKind::WoodcuttersCamp)
        );
        assert_eq!(
            "Woodcutter's Camp".parse::<BuildingKind>(),
            Ok(BuildingKind::WoodcuttersCamp)
        );
        assert_eq!("City Center".parse::<BuildingKind>(), Ok(BuildingKind::CityCenter));
        assert!("castle of doom".parse::<BuildingKind>().is_err());
    }

    #[test]
    fn test_unit_kind_parsing() {
        assert_eq!("fishing-boat".parse::<UnitKind>(), Ok(UnitKind::FishingBoat));
        assert_eq!("Infantry".parse::<UnitKind>(), Ok(UnitKind::Infantry));
    }

    #[test]
    fn test_keys_round_trip_through_serde() {
        let json = serde_json::to_string(&BuildingKind::WoodcuttersCamp).unwrap();
        assert_eq!(json, "\"woodcutters_camp\"");
        for kind in BuildingKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }

    #[test]
    fn test_footprints_within_max() {
        for kind in BuildingKind::ALL {
            let (w, h) = kind.size();
            assert!(w <= BuildingKind::MAX_FOOTPRINT && h <= BuildingKind::MAX_FOOTPRINT);
        }
    }

    #[test]
    fn test_producers_have_capacity() {
        for kind in BuildingKind::ALL {
            let stats = kind.stats();
            if stats.produces.is_some() {
                assert!(stats.worker_capacity > 0, "{kind} produces without workers");
            }
        }
    }

    #[test]
    fn test_military_classification() {
        assert!(!UnitKind::Citizen.is_military());
        assert!(!UnitKind::FishingBoat.is_military());
        assert!(UnitKind::Archer.is_military());
        assert!(UnitKind::Galley.is_naval());
        assert!(UnitKind::Galley.is_military());
    }
}
