//! Structured text output for LLM consumption.
//!
//! Renders a [`PlayerView`] as a compact prompt block. Unit ids are printed
//! in the form the command API accepts, coordinates as `(x, y)`.

// Lines are assembled with push_str(&format!(..))
#![allow(clippy::format_push_string)]

use crate::export::{PlayerView, ThreatLevel};
use crate::game::{Resource, UnitTask};

/// Most entries printed per list before summarizing the rest.
const LIST_LIMIT: usize = 12;

/// Render a player view to structured text.
///
/// Output format:
/// ```text
/// === TICK 120 | PLAYER 1 (Alice) | CLASSICAL AGE ===
///
/// RESOURCES:
/// - food: 180 / 1000 (+0.20/tick)
/// ...
/// ```
#[must_use]
pub fn render_llm(view: &PlayerView) -> String {
    let mut output = String::new();
    render_header(&mut output, view);
    render_resources(&mut output, view);
    render_buildings(&mut output, view);
    render_units(&mut output, view);
    render_sightings(&mut output, view);
    render_assessment(&mut output, view);
    output
}

fn render_header(output: &mut String, view: &PlayerView) {
    let economy = &view.economy;
    output.push_str(&format!(
        "=== TICK {} | PLAYER {} ({}) | {} AGE ===\n",
        view.tick,
        economy.id,
        economy.name,
        economy.age.name().to_uppercase()
    ));
    if view.game_over {
        output.push_str("GAME OVER\n");
    }
    output.push_str(&format!(
        "Map {}x{}, territory {} tiles, {} tiles in sight\n\n",
        view.width, view.height, view.territory, view.visible_tiles
    ));
}

fn render_resources(output: &mut String, view: &PlayerView) {
    let economy = &view.economy;
    output.push_str("RESOURCES:\n");
    for resource in Resource::ALL {
        output.push_str(&format!(
            "- {}: {:.0} / {:.0} ({:+.2}/tick)\n",
            resource.name(),
            economy.resources.get(resource).floor(),
            economy.storage_cap.get(resource),
            economy.rates.get(resource)
        ));
    }
    output.push_str(&format!(
        "Population: {} / {} ({} queued)\n",
        economy.population, economy.population_cap, economy.queued
    ));
    match economy.next_age_cost {
        Some(cost) => output.push_str(&format!("Next age costs: {cost}\n\n")),
        None => output.push_str("Final age reached\n\n"),
    }
}

fn render_buildings(output: &mut String, view: &PlayerView) {
    output.push_str(&format!("YOUR BUILDINGS ({}):\n", view.buildings.len()));
    for building in view.buildings.iter().take(LIST_LIMIT) {
        output.push_str(&format!("- {} at ({}, {})", building.kind, building.x, building.y));
        if building.progress < 100.0 {
            output.push_str(&format!(" [building {:.0}%]", building.progress));
        }
        if building.capacity > 0 {
            output.push_str(&format!(" workers {}/{}", building.workers, building.capacity));
        }
        if !building.queue.is_empty() {
            let queue: Vec<String> = building.queue.iter().map(ToString::to_string).collect();
            output.push_str(&format!(" queue [{}]", queue.join(", ")));
        }
        if building.health < building.max_health {
            output.push_str(&format!(
                " hp {:.0}/{:.0}",
                building.health, building.max_health
            ));
        }
        output.push('\n');
    }
    push_overflow(output, view.buildings.len());
    output.push('\n');
}

fn render_units(output: &mut String, view: &PlayerView) {
    output.push_str(&format!("YOUR UNITS ({}):\n", view.units.len()));
    for unit in view.units.iter().take(LIST_LIMIT) {
        let task = if unit.task == UnitTask::Idle && !unit.moving {
            "IDLE".to_string()
        } else {
            unit.task.to_string()
        };
        output.push_str(&format!(
            "- {} {} at ({:.1}, {:.1}) hp {:.0} {}\n",
            unit.id, unit.kind, unit.position.x, unit.position.y, unit.health, task
        ));
    }
    push_overflow(output, view.units.len());
    output.push('\n');
}

fn render_sightings(output: &mut String, view: &PlayerView) {
    output.push_str("IN SIGHT:\n");
    if view.enemy_buildings.is_empty() && view.enemy_units.is_empty() {
        output.push_str("- no enemies\n");
    }
    for building in view.enemy_buildings.iter().take(LIST_LIMIT) {
        output.push_str(&format!(
            "- P{} {} at ({}, {}) hp {:.0}\n",
            building.owner, building.kind, building.x, building.y, building.health
        ));
    }
    push_overflow(output, view.enemy_buildings.len());
    for unit in view.enemy_units.iter().take(LIST_LIMIT) {
        output.push_str(&format!(
            "- P{} {} at ({:.1}, {:.1}) hp {:.0}\n",
            unit.owner, unit.kind, unit.position.x, unit.position.y, unit.health
        ));
    }
    push_overflow(output, view.enemy_units.len());

    if !view.resource_sites.is_empty() {
        let sites: Vec<String> = view
            .resource_sites
            .iter()
            .take(LIST_LIMIT)
            .map(|s| format!("{} ({},{})", s.deposit, s.x, s.y))
            .collect();
        output.push_str(&format!("Resource sites: {}", sites.join(", ")));
        if view.resource_sites.len() > LIST_LIMIT {
            output.push_str(&format!(" and {} more", view.resource_sites.len() - LIST_LIMIT));
        }
        output.push('\n');
    }
    output.push('\n');
}

fn render_assessment(output: &mut String, view: &PlayerView) {
    let assessment = &view.assessment;
    let threat = match assessment.threat {
        ThreatLevel::None => "none",
        ThreatLevel::Low => "low",
        ThreatLevel::High => "HIGH",
    };
    output.push_str("ASSESSMENT:\n");
    output.push_str(&format!(
        "- Army: {} soldiers (strength {:.0}) vs {} visible enemy soldiers (strength {:.0})\n",
        assessment.military_units,
        assessment.army_strength,
        assessment.visible_enemy_military,
        assessment.visible_enemy_strength
    ));
    output.push_str(&format!("- Threat: {threat}"));
    if assessment.under_attack {
        output.push_str(" (UNDER ATTACK)");
    }
    output.push('\n');
    output.push_str(&format!(
        "- Idle workers: {}, housing headroom: {}, scarcest: {}\n",
        assessment.idle_workers,
        assessment.housing_headroom,
        assessment.scarcest.name()
    ));
    for line in &assessment.advice {
        output.push_str(&format!("* {line}\n"));
    }
}

fn push_overflow(output: &mut String, total: usize) {
    if total > LIST_LIMIT {
        output.push_str(&format!("- ... and {} more\n", total - LIST_LIMIT));
    }
}
