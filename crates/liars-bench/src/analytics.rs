use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use liars_core::LiarsError;
use liars_core::belief::{Estimator, HandCatalog};
use liars_core::game::{ActionKind, GameState, RoundRecord};
use liars_core::model::view::HandView;
use serde::Serialize;
use statrs::distribution::{Binomial, ContinuousCDF, Discrete, Normal};
use thiserror::Error;

use crate::config::PlayerConfig;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("player '{0}' appears in results but not in the configuration")]
    UnknownPlayer(String),
    #[error("round {round} has no hand recorded for '{player}'")]
    MissingHand { round: u32, player: String },
    #[error("belief estimate failed in round {round}: {source}")]
    Estimate {
        round: u32,
        #[source]
        source: LiarsError,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Where a game came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSource {
    Simulated,
    Recorded,
}

impl GameSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            GameSource::Simulated => "simulated",
            GameSource::Recorded => "recorded",
        }
    }
}

pub struct AnalyticsCollector {
    sources: BTreeMap<GameSource, SourceAccumulator>,
    players: HashMap<String, PlayerAccumulator>,
    player_order: Vec<String>,
}

impl AnalyticsCollector {
    pub fn new(players: &[PlayerConfig]) -> Self {
        let mut accumulators = HashMap::new();
        let mut order = Vec::new();
        for player in players {
            accumulators.insert(
                player.name.clone(),
                PlayerAccumulator::new(player.estimator),
            );
            order.push(player.name.clone());
        }

        Self {
            sources: BTreeMap::new(),
            players: accumulators,
            player_order: order,
        }
    }

    /// Folds one game's sealed rounds into the statistics for `source`.
    ///
    /// Every bid is re-scored from the observer's side with the conditional estimator,
    /// whatever estimator the players used during the game. Win counts only cover simulated
    /// games.
    pub fn record_game(
        &mut self,
        source: GameSource,
        state: &GameState,
        catalog: &HandCatalog,
    ) -> Result<(), AnalyticsError> {
        let players = state.players();
        let acc = self.sources.entry(source).or_default();
        acc.games += 1;

        for round in state.history().iter().filter(|round| round.is_sealed()) {
            acc.record_round(round, players, catalog)?;
        }

        // Recorded games may seat people outside the configured roster.
        match state.winner() {
            Some(_) if source == GameSource::Recorded => {}
            Some(winner) => {
                for name in players {
                    let player = self
                        .players
                        .get_mut(name)
                        .ok_or_else(|| AnalyticsError::UnknownPlayer(name.to_string()))?;
                    player.record_game(name == winner);
                }
            }
            None => acc.unfinished += 1,
        }

        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let sources = self
            .sources
            .into_iter()
            .map(|(source, acc)| acc.into_report(source))
            .collect();

        let mut players = Vec::new();
        for name in &self.player_order {
            if let Some(acc) = self.players.remove(name) {
                players.push(acc.into_report(name.clone()));
            }
        }

        AnalyticsSummary { sources, players }
    }
}

#[derive(Default)]
struct SourceAccumulator {
    games: usize,
    unfinished: usize,
    rounds: usize,
    challenge_probs: Vec<f64>,
    non_challenge_probs: Vec<f64>,
    challenge_aggressiveness: Vec<f64>,
    non_challenge_aggressiveness: Vec<f64>,
    bids_by_total_dice: BTreeMap<usize, Vec<f64>>,
    bids_by_dice_gap: BTreeMap<usize, Vec<f64>>,
    advantage_wins: BTreeMap<usize, Vec<f64>>,
}

impl SourceAccumulator {
    fn record_round(
        &mut self,
        round: &RoundRecord,
        players: [&str; 2],
        catalog: &HandCatalog,
    ) -> Result<(), AnalyticsError> {
        if round.actions.is_empty() {
            return Ok(());
        }
        let views = round_views(round, players)?;
        let [first, second] = &views;
        let total_dice = first.len() + second.len();
        let gap = first.len().abs_diff(second.len());
        self.rounds += 1;

        let bids = round.bids().count() as f64;
        self.bids_by_total_dice.entry(total_dice).or_default().push(bids);
        self.bids_by_dice_gap.entry(gap).or_default().push(bids);

        let mut observed = Vec::new();
        let mut aggressiveness = Vec::new();
        for action in &round.actions {
            let bid = action.bid().map_err(|source| AnalyticsError::Estimate {
                round: round.round,
                source,
            })?;
            let acting = views
                .iter()
                .position(|view| view.name() == action.actor)
                .ok_or_else(|| AnalyticsError::UnknownPlayer(action.actor.clone()))?;
            let (actor, other) = (&views[acting], &views[1 - acting]);

            match action.kind {
                ActionKind::Bid => {
                    let p = Estimator::Conditional
                        .estimate(catalog, other, &bid)
                        .map_err(|source| AnalyticsError::Estimate {
                            round: round.round,
                            source,
                        })?;
                    observed.push(p);
                    let claimed = bid.quantity() as f64 - actor.quantity_of(bid.face()) as f64;
                    aggressiveness.push(claimed / total_dice as f64);
                }
                ActionKind::Challenge => {
                    if let (Some((challenged, rest)), Some((bluff, bluffs))) =
                        (observed.split_last(), aggressiveness.split_last())
                    {
                        self.challenge_probs.push(*challenged);
                        self.non_challenge_probs.extend_from_slice(rest);
                        self.challenge_aggressiveness.push(*bluff);
                        self.non_challenge_aggressiveness.extend_from_slice(bluffs);
                    }
                }
            }
        }

        if gap != 0
            && let (Some(winner), Some(loser)) = (&round.winner, &round.loser)
        {
            let size_of = |name: &str| views.iter().find(|v| v.name() == name).map(HandView::len);
            if let (Some(winner_dice), Some(loser_dice)) =
                (size_of(winner.as_str()), size_of(loser.as_str()))
            {
                let advantaged = if winner_dice >= loser_dice { 1.0 } else { 0.0 };
                self.advantage_wins.entry(gap).or_default().push(advantaged);
            }
        }

        Ok(())
    }

    fn into_report(self, source: GameSource) -> SourceReport {
        let separation_p = mean_difference_p_value(&self.challenge_probs, &self.non_challenge_probs);
        SourceReport {
            source,
            games: self.games,
            unfinished: self.unfinished,
            rounds: self.rounds,
            challenged: SampleStats::from_values(&self.challenge_probs),
            unchallenged: SampleStats::from_values(&self.non_challenge_probs),
            separation_p,
            challenged_aggressiveness: SampleStats::from_values(&self.challenge_aggressiveness),
            unchallenged_aggressiveness: SampleStats::from_values(
                &self.non_challenge_aggressiveness,
            ),
            bids_by_total_dice: keyed_stats(&self.bids_by_total_dice),
            bids_by_dice_gap: keyed_stats(&self.bids_by_dice_gap),
            advantage_wins: keyed_stats(&self.advantage_wins),
        }
    }
}

fn round_views(round: &RoundRecord, players: [&str; 2]) -> Result<[HandView; 2], AnalyticsError> {
    let hand = |name: &str| {
        round
            .hand_of(name)
            .copied()
            .ok_or_else(|| AnalyticsError::MissingHand {
                round: round.round,
                player: name.to_string(),
            })
    };
    let (first, second) = (hand(players[0])?, hand(players[1])?);
    let view = |name: &str, own, opponent: usize| {
        HandView::new(name, own, opponent).map_err(|source| AnalyticsError::Estimate {
            round: round.round,
            source,
        })
    };
    Ok([
        view(players[0], first, second.len())?,
        view(players[1], second, first.len())?,
    ])
}

struct PlayerAccumulator {
    estimator: Estimator,
    outcomes: Vec<f64>,
}

impl PlayerAccumulator {
    fn new(estimator: Estimator) -> Self {
        Self {
            estimator,
            outcomes: Vec::new(),
        }
    }

    fn record_game(&mut self, won: bool) {
        self.outcomes.push(if won { 1.0 } else { 0.0 });
    }

    fn into_report(self, name: String) -> PlayerReport {
        let games = self.outcomes.len();
        let wins = self.outcomes.iter().filter(|won| **won > 0.0).count();
        let win_rate = if games == 0 {
            0.0
        } else {
            wins as f64 / games as f64
        };

        PlayerReport {
            name,
            estimator: self.estimator,
            games,
            wins,
            win_rate,
            ci95: confidence_interval(&self.outcomes),
            p_value: binomial_test(wins as u64, games as u64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub ci95: (f64, f64),
}

impl SampleStats {
    fn from_values(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean: mean(values),
            ci95: confidence_interval(values),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: GameSource,
    pub games: usize,
    pub unfinished: usize,
    pub rounds: usize,
    pub challenged: SampleStats,
    pub unchallenged: SampleStats,
    /// Two-sided p-value that challenged and unchallenged bids share a mean probability.
    pub separation_p: f64,
    pub challenged_aggressiveness: SampleStats,
    pub unchallenged_aggressiveness: SampleStats,
    pub bids_by_total_dice: Vec<(usize, SampleStats)>,
    pub bids_by_dice_gap: Vec<(usize, SampleStats)>,
    /// Share of rounds won by the player holding more dice, keyed by the size gap.
    pub advantage_wins: Vec<(usize, SampleStats)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub name: String,
    pub estimator: Estimator,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    /// Two-sided binomial test against an even match.
    pub p_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub sources: Vec<SourceReport>,
    pub players: Vec<PlayerReport>,
}

impl AnalyticsSummary {
    pub fn source(&self, source: GameSource) -> Option<&SourceReport> {
        self.sources.iter().find(|report| report.source == source)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Liar's Dice Summary\n\n");

        out.push_str("## Players\n\n");
        out.push_str("| Player | Estimator | Games | Wins | Win % | 95% CI | p-value |\n");
        out.push_str("|--------|-----------|-------|------|-------|--------|---------|\n");
        for player in &self.players {
            let _ = writeln!(
                out,
                "| {name} | {estimator} | {games} | {wins} | {rate:.1}% | [{lo:.3}, {hi:.3}] | {p:.3} |",
                name = player.name,
                estimator = player.estimator,
                games = player.games,
                wins = player.wins,
                rate = player.win_rate * 100.0,
                lo = player.ci95.0,
                hi = player.ci95.1,
                p = player.p_value,
            );
        }

        for report in &self.sources {
            let _ = writeln!(
                out,
                "\n## {} games\n\n{} games ({} unfinished), {} rounds\n",
                report.source.as_str(),
                report.games,
                report.unfinished,
                report.rounds
            );

            out.push_str("| Observer view | Bids | Mean P(correct) | 95% CI | Mean aggressiveness |\n");
            out.push_str("|---------------|------|-----------------|--------|---------------------|\n");
            for (label, probs, aggr) in [
                ("Challenged", &report.challenged, &report.challenged_aggressiveness),
                (
                    "Not challenged",
                    &report.unchallenged,
                    &report.unchallenged_aggressiveness,
                ),
            ] {
                let _ = writeln!(
                    out,
                    "| {label} | {count} | {mean:.3} | [{lo:.3}, {hi:.3}] | {aggr:.3} |",
                    count = probs.count,
                    mean = probs.mean,
                    lo = probs.ci95.0,
                    hi = probs.ci95.1,
                    aggr = aggr.mean,
                );
            }
            let _ = writeln!(
                out,
                "\nChallenged vs. not challenged p-value: {:.4}",
                report.separation_p
            );

            write_keyed_table(
                &mut out,
                "Bids per round by total dice",
                "Total dice",
                "Mean bids",
                &report.bids_by_total_dice,
            );
            write_keyed_table(
                &mut out,
                "Bids per round by hand-size gap",
                "Gap",
                "Mean bids",
                &report.bids_by_dice_gap,
            );
            write_keyed_table(
                &mut out,
                "Rounds won by the player with more dice",
                "Gap",
                "Win share",
                &report.advantage_wins,
            );
        }

        out
    }
}

fn write_keyed_table(
    out: &mut String,
    title: &str,
    key_label: &str,
    value_label: &str,
    rows: &[(usize, SampleStats)],
) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n### {title}\n");
    let _ = writeln!(out, "| {key_label} | Rounds | {value_label} |");
    out.push_str("|---|---|---|\n");
    for (key, stats) in rows {
        let _ = writeln!(out, "| {key} | {} | {:.3} |", stats.count, stats.mean);
    }
}

fn keyed_stats(values: &BTreeMap<usize, Vec<f64>>) -> Vec<(usize, SampleStats)> {
    values
        .iter()
        .map(|(key, samples)| (*key, SampleStats::from_values(samples)))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_variance(values: &[f64]) -> f64 {
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0)
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let std_error = (sample_variance(points) / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

/// Two-sided normal-approximation test for a difference in means.
fn mean_difference_p_value(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 1.0;
    }
    let std_error = (sample_variance(a) / a.len() as f64 + sample_variance(b) / b.len() as f64).sqrt();
    if std_error <= 0.0 || !std_error.is_finite() {
        return 1.0;
    }
    let z = (mean(a) - mean(b)).abs() / std_error;
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return 1.0;
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}

/// Exact two-sided binomial test of `wins` out of `games` against p = 0.5.
fn binomial_test(wins: u64, games: u64) -> f64 {
    if games == 0 {
        return 1.0;
    }
    let Ok(binomial) = Binomial::new(0.5, games) else {
        return 1.0;
    };
    let observed = binomial.pmf(wins);
    let p: f64 = (0..=games)
        .map(|k| binomial.pmf(k))
        .filter(|pk| *pk <= observed * (1.0 + 1e-7))
        .sum();
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liars_core::model::hand::DiceHand;

    fn players() -> Vec<PlayerConfig> {
        vec![
            PlayerConfig {
                name: "Me".into(),
                estimator: Estimator::Conditional,
            },
            PlayerConfig {
                name: "Subject".into(),
                estimator: Estimator::Truthful,
            },
        ]
    }

    fn view(name: &str, faces: &[u8], opponent: usize) -> HandView {
        HandView::new(name, DiceHand::from_faces(faces).unwrap(), opponent).unwrap()
    }

    fn played_game() -> GameState {
        let mut state = GameState::with_seed(
            view("Me", &[1, 3, 3, 5], 5),
            view("Subject", &[2, 2, 3, 4, 6], 4),
            3,
        )
        .unwrap();
        let opening = liars_core::model::bid::Bid::new(2, 2).unwrap();
        state.declare_bid("Me", opening).unwrap();
        let raise = liars_core::model::bid::Bid::new(3, 3).unwrap();
        state.declare_bid("Subject", raise).unwrap();
        state.challenge_bid(&raise, "Me").unwrap();
        state
    }

    #[test]
    fn binomial_test_matches_known_values() {
        assert!((binomial_test(5, 10) - 1.0).abs() < 1e-9);
        // P(X <= 1) + P(X >= 9) for n = 10.
        let expected = 22.0 / 1024.0;
        assert!((binomial_test(9, 10) - expected).abs() < 1e-9);
        assert_eq!(binomial_test(0, 0), 1.0);
    }

    #[test]
    fn confidence_interval_brackets_mean() {
        let (lo, hi) = confidence_interval(&[1.0, 0.0, 1.0, 1.0]);
        assert!(lo < 0.75 && hi > 0.75);
        assert_eq!(confidence_interval(&[0.4]), (0.4, 0.4));
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }

    #[test]
    fn identical_samples_do_not_separate() {
        let a = [0.2, 0.4, 0.6, 0.8];
        assert!((mean_difference_p_value(&a, &a) - 1.0).abs() < 1e-9);
        let low = [0.05, 0.1, 0.08, 0.12, 0.07];
        let high = [0.9, 0.95, 0.85, 0.92, 0.88];
        assert!(mean_difference_p_value(&low, &high) < 0.001);
    }

    #[test]
    fn records_round_statistics() {
        let catalog = HandCatalog::new();
        let mut collector = AnalyticsCollector::new(&players());
        collector
            .record_game(GameSource::Recorded, &played_game(), &catalog)
            .unwrap();
        let summary = collector.finalize();
        let report = summary.source(GameSource::Recorded).unwrap();

        assert_eq!(report.games, 1);
        assert_eq!(report.unfinished, 1);
        assert_eq!(report.rounds, 1);
        assert_eq!(report.challenged.count, 1);
        assert_eq!(report.unchallenged.count, 1);
        assert_eq!(report.bids_by_total_dice, vec![(9, SampleStats::from_values(&[2.0]))]);
        assert_eq!(report.bids_by_dice_gap[0].0, 1);

        // Subject bid three 3s holding one: aggressiveness (3 - 1) / 9.
        assert!((report.challenged_aggressiveness.mean - 2.0 / 9.0).abs() < 1e-12);
        // Me opened with two 2s holding none.
        assert!((report.unchallenged_aggressiveness.mean - 2.0 / 9.0).abs() < 1e-12);

        // The bid held, so Subject (five dice) beat Me (four dice).
        assert_eq!(report.advantage_wins, vec![(1, SampleStats::from_values(&[1.0]))]);
        assert!(summary.players.iter().all(|p| p.games == 0));
    }

    #[test]
    fn counts_wins_for_finished_games() {
        let catalog = HandCatalog::new();
        let mut collector = AnalyticsCollector::new(&players());
        let mut state = GameState::with_seed(view("Me", &[6], 1), view("Subject", &[2], 1), 5)
            .unwrap();
        let bid = liars_core::model::bid::Bid::new(2, 6).unwrap();
        state.declare_bid("Me", bid).unwrap();
        state.challenge_bid(&bid, "Subject").unwrap();
        collector
            .record_game(GameSource::Simulated, &state, &catalog)
            .unwrap();

        let summary = collector.finalize();
        let subject = summary.players.iter().find(|p| p.name == "Subject").unwrap();
        assert_eq!(subject.wins, 1);
        assert_eq!(subject.games, 1);
        assert_eq!(summary.source(GameSource::Simulated).unwrap().unfinished, 0);
    }

    #[test]
    fn rejects_actions_by_unseated_players() {
        let catalog = HandCatalog::new();
        let state = played_game();
        let mut round = state.history()[0].clone();
        round.actions[1].actor = "Stranger".into();

        let mut acc = SourceAccumulator::default();
        let err = acc
            .record_round(&round, state.players(), &catalog)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownPlayer(name) if name == "Stranger"));
    }

    #[test]
    fn markdown_lists_players_and_sources() {
        let catalog = HandCatalog::new();
        let mut collector = AnalyticsCollector::new(&players());
        collector
            .record_game(GameSource::Recorded, &played_game(), &catalog)
            .unwrap();
        let markdown = collector.finalize().render_markdown();
        assert!(markdown.starts_with("# Liar's Dice Summary"));
        assert!(markdown.contains("| Me | conditional |"));
        assert!(markdown.contains("## recorded games"));
        assert!(markdown.contains("Bids per round by total dice"));
    }
}
