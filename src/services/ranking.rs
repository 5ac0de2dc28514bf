use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::models::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseOrder {
    #[default]
    Descending,
    Ascending,
    Random,
}

impl BaseOrder {
    const CYCLE: [BaseOrder; 3] = [BaseOrder::Descending, BaseOrder::Ascending, BaseOrder::Random];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Descending,
    Ascending,
    Random,
    Auto,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Descending,
        SortMode::Ascending,
        SortMode::Random,
        SortMode::Auto,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Descending => "Highest First",
            SortMode::Ascending => "Lowest First",
            SortMode::Random => "Random Shuffle",
            SortMode::Auto => "Auto Cycle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReshuffleToken(u64);

impl ReshuffleToken {
    pub fn fresh() -> Self {
        Self(rand::random())
    }

    #[cfg(test)]
    pub fn from_seed(seed: u64) -> Self {
        Self(seed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankedEntry<'a> {
    pub record: &'a Record,
    pub leader: bool,
}

#[derive(Debug, Clone)]
pub struct RankingView<'a> {
    pub order: BaseOrder,
    pub entries: Vec<RankedEntry<'a>>,
}

impl RankingView<'_> {
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.record.id().to_string())
            .collect()
    }
}

/// Filters out empty or nameless records and orders the rest. The random
/// order is a pure function of the token, so redrawing never reshuffles.
pub fn compute_view(records: &[Record], order: BaseOrder, token: ReshuffleToken) -> RankingView<'_> {
    let mut visible: Vec<&Record> = records.iter().filter(|r| r.is_displayable()).collect();

    match order {
        BaseOrder::Descending => visible.sort_by(|a, b| b.total().total_cmp(&a.total())),
        BaseOrder::Ascending => visible.sort_by(|a, b| a.total().total_cmp(&b.total())),
        BaseOrder::Random => {
            let mut rng = StdRng::seed_from_u64(token.0);
            visible.shuffle(&mut rng);
        }
    }

    let entries = visible
        .into_iter()
        .enumerate()
        .map(|(index, record)| RankedEntry {
            record,
            leader: index == 0 && order == BaseOrder::Descending && record.total() > 0.0,
        })
        .collect();

    RankingView { order, entries }
}

/// Phases are derived from elapsed time; dropping the handle stops the cycle.
#[derive(Debug, Clone, Copy)]
pub struct AutoCycle {
    started_at: f64,
    period_seconds: f64,
}

impl AutoCycle {
    pub fn start(now: f64, period_seconds: f64) -> Self {
        Self {
            started_at: now,
            period_seconds: period_seconds.max(0.1),
        }
    }

    fn step_at(&self, now: f64) -> u64 {
        let elapsed = (now - self.started_at).max(0.0);
        (elapsed / self.period_seconds).floor() as u64
    }

    pub fn phase_at(&self, now: f64) -> BaseOrder {
        BaseOrder::CYCLE[(self.step_at(now) % 3) as usize]
    }

    pub fn seconds_until_next_phase(&self, now: f64) -> f64 {
        let next_boundary = self.started_at + (self.step_at(now) + 1) as f64 * self.period_seconds;
        (next_boundary - now).max(0.0)
    }
}

#[derive(Debug)]
pub struct RankingEngine {
    mode: SortMode,
    auto: Option<AutoCycle>,
    auto_phase: BaseOrder,
    token: ReshuffleToken,
    cycle_period_seconds: f64,
}

impl RankingEngine {
    pub fn new(cycle_period_seconds: f64) -> Self {
        Self {
            mode: SortMode::default(),
            auto: None,
            auto_phase: BaseOrder::Descending,
            token: ReshuffleToken::fresh(),
            cycle_period_seconds,
        }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    #[cfg(test)]
    pub fn token(&self) -> ReshuffleToken {
        self.token
    }

    pub fn is_cycling(&self) -> bool {
        self.auto.is_some()
    }

    pub fn select(&mut self, mode: SortMode, now: f64) {
        debug!("Sort mode {:?} -> {:?}", self.mode, mode);
        match mode {
            SortMode::Auto => {
                if self.auto.is_none() {
                    self.auto = Some(AutoCycle::start(now, self.cycle_period_seconds));
                    self.auto_phase = BaseOrder::Descending;
                }
            }
            SortMode::Random => {
                self.stop();
                self.token = ReshuffleToken::fresh();
            }
            SortMode::Descending | SortMode::Ascending => self.stop(),
        }
        self.mode = mode;
    }

    pub fn reshuffle(&mut self) {
        self.token = ReshuffleToken::fresh();
        debug!("Reshuffled random order");
    }

    /// Advances the auto cycle. Returns true when the phase changed.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(cycle) = self.auto else {
            return false;
        };
        let phase = cycle.phase_at(now);
        if phase == self.auto_phase {
            return false;
        }
        debug!("Auto cycle phase {:?} -> {:?}", self.auto_phase, phase);
        if phase == BaseOrder::Random {
            self.token = ReshuffleToken::fresh();
        }
        self.auto_phase = phase;
        true
    }

    pub fn stop(&mut self) {
        if self.auto.take().is_some() {
            debug!("Auto cycle stopped");
        }
    }

    pub fn effective_order(&self) -> BaseOrder {
        match self.mode {
            SortMode::Descending => BaseOrder::Descending,
            SortMode::Ascending => BaseOrder::Ascending,
            SortMode::Random => BaseOrder::Random,
            SortMode::Auto => self.auto_phase,
        }
    }

    pub fn seconds_until_next_phase(&self, now: f64) -> Option<f64> {
        self.auto.map(|cycle| cycle.seconds_until_next_phase(now))
    }

    pub fn view<'a>(&self, records: &'a [Record]) -> RankingView<'a> {
        compute_view(records, self.effective_order(), self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, total: f64) -> Record {
        Record::new(id.to_string(), name.to_string(), [total], 500.0)
    }

    fn totals(view: &RankingView<'_>) -> Vec<f64> {
        view.entries.iter().map(|entry| entry.record.total()).collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            record("a", "Ann", 10.0),
            record("b", "Ben", 50.0),
            record("c", "Cat", 0.0),
            record("d", "  ", 30.0),
            record("e", "Eli", 30.0),
        ]
    }

    #[test]
    fn descending_filters_and_marks_leader() {
        let records = sample();
        let view = compute_view(&records, BaseOrder::Descending, ReshuffleToken::from_seed(1));
        assert_eq!(totals(&view), vec![50.0, 30.0, 10.0]);
        assert!(view.entries[0].leader);
        assert_eq!(view.entries[0].record.id(), "b");
        assert!(view.entries.iter().skip(1).all(|entry| !entry.leader));
    }

    #[test]
    fn ascending_is_stable_and_has_no_leader() {
        let records = vec![
            record("x", "Xan", 20.0),
            record("y", "Yas", 20.0),
            record("z", "Zed", 5.0),
        ];
        let view = compute_view(&records, BaseOrder::Ascending, ReshuffleToken::from_seed(1));
        assert_eq!(view.ids(), vec!["z", "x", "y"]);
        assert!(view.entries.iter().all(|entry| !entry.leader));

        let view = compute_view(&records, BaseOrder::Descending, ReshuffleToken::from_seed(1));
        assert_eq!(view.ids(), vec!["x", "y", "z"]);
    }

    #[test]
    fn random_order_only_changes_with_the_token() {
        let records: Vec<Record> = (1..=30)
            .map(|i| record(&i.to_string(), &format!("P{i}"), i as f64))
            .collect();

        let token = ReshuffleToken::from_seed(42);
        let first = compute_view(&records, BaseOrder::Random, token).ids();
        let again = compute_view(&records, BaseOrder::Random, token).ids();
        assert_eq!(first, again);
        assert!(compute_view(&records, BaseOrder::Random, token)
            .entries
            .iter()
            .all(|entry| !entry.leader));

        let changed = (43..53)
            .map(|seed| compute_view(&records, BaseOrder::Random, ReshuffleToken::from_seed(seed)).ids())
            .any(|ids| ids != first);
        assert!(changed);

        let mut sorted = first.clone();
        sorted.sort();
        let mut expected: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn auto_cycle_walks_the_phases() {
        let mut engine = RankingEngine::new(40.0);
        engine.select(SortMode::Auto, 100.0);
        assert_eq!(engine.effective_order(), BaseOrder::Descending);

        assert!(!engine.tick(139.9));
        assert!(engine.tick(140.0));
        assert_eq!(engine.effective_order(), BaseOrder::Ascending);

        let before_random = engine.token();
        assert!(engine.tick(180.0));
        assert_eq!(engine.effective_order(), BaseOrder::Random);
        assert_ne!(engine.token(), before_random);

        let during_random = engine.token();
        assert!(!engine.tick(200.0));
        assert_eq!(engine.token(), during_random);

        assert!(engine.tick(220.0));
        assert_eq!(engine.effective_order(), BaseOrder::Descending);
    }

    #[test]
    fn leaving_auto_cancels_the_cycle() {
        let mut engine = RankingEngine::new(40.0);
        engine.select(SortMode::Auto, 0.0);
        assert!(engine.is_cycling());
        assert_eq!(engine.seconds_until_next_phase(10.0), Some(30.0));

        engine.select(SortMode::Ascending, 10.0);
        assert!(!engine.is_cycling());
        assert!(!engine.tick(45.0));
        assert_eq!(engine.effective_order(), BaseOrder::Ascending);
        assert_eq!(engine.seconds_until_next_phase(45.0), None);

        // Re-entering starts over at descending.
        engine.select(SortMode::Auto, 1000.0);
        engine.tick(1000.0);
        assert_eq!(engine.effective_order(), BaseOrder::Descending);
    }

    #[test]
    fn leader_only_in_descending_phase_of_auto() {
        let records = sample();
        let mut engine = RankingEngine::new(40.0);
        engine.select(SortMode::Auto, 0.0);
        assert!(engine.view(&records).entries[0].leader);

        engine.tick(40.0);
        let view = engine.view(&records);
        assert_eq!(view.order, BaseOrder::Ascending);
        assert!(view.entries.iter().all(|entry| !entry.leader));
    }

    #[test]
    fn manual_random_deals_a_new_token_each_time() {
        let mut engine = RankingEngine::new(40.0);
        engine.select(SortMode::Random, 0.0);
        let first = engine.token();
        engine.select(SortMode::Random, 1.0);
        assert_ne!(engine.token(), first);
        assert_eq!(engine.effective_order(), BaseOrder::Random);

        let second = engine.token();
        engine.reshuffle();
        assert_ne!(engine.token(), second);
        assert_eq!(engine.mode(), SortMode::Random);
    }
}
