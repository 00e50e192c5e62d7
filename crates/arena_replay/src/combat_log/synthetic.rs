//! Synthetic battle logs (demo binary, soak + determinism tests)
//!
//! Not a simulation: a cheap generator of *well-formed* logs: units walk
//! toward a random enemy and trade blows until one team is gone.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::events::{CombatEvent, CombatantSnapshot, LootDrop, Tick};
use super::CombatLog;

pub const GRID_COLUMNS: i32 = 8;
pub const GRID_ROWS: i32 = 8;

const UNIT_KINDS: [&str; 3] = ["knight", "archer", "mage"];
const TICK_LIMIT: Tick = 600;

struct SimUnit {
    id: String,
    team: usize,
    x: i32,
    y: i32,
    health: i32,
    max_health: i32,
    attack: i32,
}

/// Teams are "p1" (rows 0..1) and "p2" (rows 6..7)
pub fn skirmish(seed: u64, per_team: usize) -> CombatLog {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let teams = ["p1", "p2"];
    let per_team = per_team.clamp(1, (GRID_COLUMNS * 2) as usize);

    let mut units: Vec<SimUnit> = Vec::new();
    let mut roster = Vec::new();
    for (team, team_id) in teams.iter().enumerate() {
        for index in 0..per_team {
            let column = index as i32 % GRID_COLUMNS;
            let row = index as i32 / GRID_COLUMNS;
            let y = if team == 0 { row } else { GRID_ROWS - 1 - row };
            let max_health = rng.gen_range(60..=140);
            let attack = rng.gen_range(10..=30);
            let id = format!("{}-{}", team_id, index);
            let kind = UNIT_KINDS[rng.gen_range(0..UNIT_KINDS.len())];

            roster.push(CombatantSnapshot::new(&id, kind, team_id, column, y).with_stats(attack, max_health, max_health));
            units.push(SimUnit {
                id,
                team,
                x: column,
                y,
                health: max_health,
                max_health,
                attack,
            });
        }
    }

    let mut events = vec![CombatEvent::combat_start(0, roster)];
    let mut tick: Tick = 0;
    let mut winner: Option<&str> = None;

    while tick < TICK_LIMIT {
        tick += rng.gen_range(1..=3);

        let alive: Vec<usize> = (0..units.len()).filter(|&i| units[i].health > 0).collect();
        let actor = alive[rng.gen_range(0..alive.len())];
        let enemies: Vec<usize> = alive
            .iter()
            .copied()
            .filter(|&i| units[i].team != units[actor].team)
            .collect();
        if enemies.is_empty() {
            winner = Some(teams[units[actor].team]);
            break;
        }
        let target = enemies[rng.gen_range(0..enemies.len())];

        let dx = units[target].x - units[actor].x;
        let dy = units[target].y - units[actor].y;
        if dx.abs() + dy.abs() > 1 {
            if dx.abs() >= dy.abs() {
                units[actor].x += dx.signum();
            } else {
                units[actor].y += dy.signum();
            }
            events.push(CombatEvent::unit_move(tick, &units[actor].id, units[actor].x, units[actor].y));
            continue;
        }

        let damage = units[actor].attack;
        events.push(CombatEvent::unit_attack(tick, &units[actor].id, &units[target].id));
        units[target].health = (units[target].health - damage).max(0);
        events.push(CombatEvent::unit_damage(
            tick,
            &units[target].id,
            damage,
            units[target].health,
            units[target].max_health,
        ));

        if units[target].health == 0 {
            let loot = rng.gen_bool(0.3).then(|| LootDrop {
                item_id: "gold".to_string(),
                x: units[target].x,
                y: units[target].y,
            });
            events.push(CombatEvent::unit_death(tick, &units[target].id, loot));
        }
    }

    // Last kill may have ended the fight on the final tick
    if winner.is_none() {
        let survivors: Vec<usize> = units.iter().filter(|u| u.health > 0).map(|u| u.team).collect();
        if !survivors.is_empty() && survivors.iter().all(|&team| team == survivors[0]) {
            winner = Some(teams[survivors[0]]);
        }
    }

    events.push(CombatEvent::combat_end(tick + 1, winner));
    CombatLog::new(events)
}

/// Smallest complete battle: A (p1) walks one cell, kills B (p2) at tick 9,
/// p1 wins at tick 10
pub fn duel() -> CombatLog {
    CombatLog::new(vec![
        CombatEvent::combat_start(
            0,
            vec![
                CombatantSnapshot::new("A", "knight", "p1", 0, 0),
                CombatantSnapshot::new("B", "archer", "p2", 6, 7).with_stats(8, 100, 100),
            ],
        ),
        CombatEvent::unit_move(5, "A", 1, 0),
        CombatEvent::unit_attack(9, "A", "B"),
        CombatEvent::unit_damage(9, "B", 50, 50, 100),
        CombatEvent::unit_death(9, "B", None),
        CombatEvent::combat_end(10, Some("p1")),
    ])
}
