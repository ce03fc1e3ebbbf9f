//! Simulate command - play bot matches and report statistics
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_games(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: seeding and formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use parques_core::{play_out, ChaChaDice, Match, MatchConfig, RandomBot, RosterEntry};

use crate::options::MatchOptions;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of matches to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Players per match
    #[arg(long, default_value = "4")]
    pub players: usize,

    /// Give up on a match after this many actions
    #[arg(long, default_value = "200000")]
    pub max_actions: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub match_options: MatchOptions,
}

/// Result of a single match
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    winner_seat: Option<usize>,
    turns: u32,
    actions: usize,
    captures: u32,
}

/// Aggregated simulation results
#[derive(Clone, Debug)]
struct SimulationResults {
    games: Vec<GameRecord>,
    wins_by_seat: Vec<usize>,
    unfinished: usize,
    avg_turns: f32,
    avg_captures: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// 1. Resolve the match config
/// 2. Play every match in parallel
/// 3. Report results
pub fn run(args: SimulateArgs, seed: Option<u64>) -> Result<()> {
    let config = args.match_options.to_match_config()?;
    validate_player_count(&config, args.players)?;

    tracing::info!(
        "Simulating {} matches ({} players, {} seats)",
        args.games,
        args.players,
        config.variant.seats()
    );

    let base_seed = create_rng(seed).gen::<u64>();
    let results = play_games(&config, &args, base_seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all matches across the rayon pool
fn play_games(config: &MatchConfig, args: &SimulateArgs, base_seed: u64) -> Result<SimulationResults> {
    let progress = create_progress_bar(args.games as u64, args.json);

    let games = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let record = play_single_game(config, args.players, i + 1, base_seed, args.max_actions);
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>>>()?;

    progress.finish_and_clear();

    for game in games.iter().filter(|g| g.winner_seat.is_none()) {
        tracing::warn!(
            "Match {} did not finish within {} actions",
            game.game_number,
            args.max_actions
        );
    }

    Ok(compute_statistics(games, args.players))
}

/// Report simulation results
fn report_results(results: &SimulationResults, args: &SimulateArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one bot-vs-bot match; dice and bot get their own stream per game
fn play_single_game(
    config: &MatchConfig,
    players: usize,
    game_number: usize,
    base_seed: u64,
    max_actions: usize,
) -> Result<GameRecord> {
    let roster = (0..players)
        .map(|i| RosterEntry::new(format!("bot{}", i), format!("Bot {}", i)))
        .collect();
    let code = format!("SIM{:03}", game_number % 1000);
    let mut game = Match::new(format!("sim-{}", game_number), code, config.clone(), roster)?;
    game.start();

    let (dice_seed, bot_seed) = game_seeds(base_seed, game_number);
    let mut dice = ChaChaDice::from_seed(dice_seed);
    let mut bot = RandomBot::with_seed(bot_seed);

    let actions = play_out(&mut game, &mut dice, &mut bot, max_actions)
        .with_context(|| format!("Match {} aborted", game_number))?;

    Ok(GameRecord {
        game_number,
        winner_seat: game.winner().map(|p| p.seat),
        turns: game.turn_number(),
        actions,
        captures: game.players().iter().map(|p| p.stats.captures).sum(),
    })
}

/// Compute aggregate statistics from match records
fn compute_statistics(games: Vec<GameRecord>, players: usize) -> SimulationResults {
    let mut wins_by_seat = vec![0; players];
    let mut unfinished = 0;
    for game in &games {
        match game.winner_seat {
            Some(seat) if seat < players => wins_by_seat[seat] += 1,
            Some(_) => {}
            None => unfinished += 1,
        }
    }

    let (avg_turns, avg_captures) = if games.is_empty() {
        (0.0, 0.0)
    } else {
        let n = games.len() as f32;
        let turns: u32 = games.iter().map(|g| g.turns).sum();
        let captures: u32 = games.iter().map(|g| g.captures).sum();
        (turns as f32 / n, captures as f32 / n)
    };

    SimulationResults {
        games,
        wins_by_seat,
        unfinished,
        avg_turns,
        avg_captures,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Independent dice and bot seeds for one match
fn game_seeds(base_seed: u64, game_number: usize) -> (u64, u64) {
    let n = game_number as u64;
    (
        base_seed.wrapping_add(n.wrapping_mul(2)),
        base_seed.wrapping_add(n.wrapping_mul(2) + 1),
    )
}

fn validate_player_count(config: &MatchConfig, players: usize) -> Result<()> {
    if players < config.min_players || players > config.max_players() {
        anyhow::bail!(
            "--players must be between {} and {}",
            config.min_players,
            config.max_players()
        );
    }
    Ok(())
}

fn create_progress_bar(len: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} matches ({eta})") {
        bar.set_style(style);
    }
    bar
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &SimulationResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        winner_seat: Option<usize>,
        turns: u32,
        actions: usize,
        captures: u32,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        wins_by_seat: Vec<usize>,
        unfinished: usize,
        avg_turns: f32,
        avg_captures: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        wins_by_seat: results.wins_by_seat.clone(),
        unfinished: results.unfinished,
        avg_turns: results.avg_turns,
        avg_captures: results.avg_captures,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                winner_seat: g.winner_seat,
                turns: g.turns,
                actions: g.actions,
                captures: g.captures,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &SimulationResults) {
    let total = results.games.len();

    println!("\n=== Simulation Results ===");
    println!("Total matches: {}", total);
    for (seat, wins) in results.wins_by_seat.iter().enumerate() {
        println!(
            "Seat {} wins:   {} ({:.1}%)",
            seat,
            wins,
            percent(*wins, total)
        );
    }
    println!(
        "Unfinished:    {} ({:.1}%)",
        results.unfinished,
        percent(results.unfinished, total)
    );
    println!("Avg turns:     {:.1}", results.avg_turns);
    println!("Avg captures:  {:.1}", results.avg_captures);
}

// ============================================================================
// TESTS
// ============================================================================
