//! The simulation engine: resolves actions against one world.
//!
//! PIPELINE (fixed for every action):
//!   1. Check preconditions (pure, no RNG).
//!   2. Advance one tick per `step` call.
//!   3. Commit the action's effects (fixed-cost actions on their final
//!      tick, travel hop by hop, discovery on the attempt that hits).
//!   4. Settle contracts after any success.
//!   5. Build the result record, log it, append it to the store.
//!
//! RULES:
//!   - A rejected action changes nothing and consumes no ticks.
//!   - The one exception to "failed = no effect": a lost fight still
//!     consumes its ticks. So does a discovery run that outlives the
//!     session.
//!   - All randomness flows through the world's cursor, checked out
//!     into an `ActionRun`'s audit for the duration of a commit.
//!   - Stopping between steps is cancellation: consumed ticks stay
//!     consumed, uncommitted effects never happen.

use crate::{
    action::{Action, GatherMode},
    activities::{is_upgrade, settle_contracts, weapon_bonus, win_probability},
    checker::{check_action, CheckResult},
    config::SimConfig,
    discovery::{
        apply_discovery, explore_candidates, promote_area, roll_explore, roll_survey, ExploreTarget,
        SurveyRoll,
    },
    error::{SimError, SimResult},
    extraction::{self, Extraction},
    inventory::ItemStack,
    naming::{AreaNamer, WordListNamer},
    outcome::{
        ActionDetail, ActionLogEntry, ActionResult, DiscoveryDetail, DiscoveryMethod, FailureKind,
        ProgressEvent, ProgressNote, StateDelta, StepOutcome,
    },
    pathing::{find_route, Route},
    rng::{ActionRng, RngRoll},
    skills::{grant_xp, LevelUp, Skill, SkillGain, SkillState},
    snapshot::SaveDocument,
    store::SimStore,
    types::{RunId, Tick},
    world::{LocationKind, Position, WorldState},
};

/// How a run spends its ticks.
#[derive(Debug, Clone)]
enum Plan {
    Rejected(FailureKind),
    Fixed {
        cost: Tick,
    },
    Route {
        route:   Route,
        reached: usize,
    },
    Discovery {
        method:   DiscoveryMethod,
        interval: Tick,
        chance:   f64,
        attempts: u32,
        wasted:   u32,
    },
}

/// An action in flight. Created by `SimEngine::begin`, driven by
/// `SimEngine::step` until it yields `StepOutcome::Done`.
#[derive(Debug, Clone)]
pub struct ActionRun {
    action:      Action,
    check:       CheckResult,
    tick_before: Tick,
    last_tick:   Tick,
    /// Engine's resolved-action count when the run began.
    resolved_at: u64,
    elapsed:     Tick,
    plan:        Plan,
    audit:       Vec<RngRoll>,
    finished:    bool,
    position_before: Position,
}

impl ActionRun {
    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn check(&self) -> &CheckResult {
        &self.check
    }

    pub fn elapsed(&self) -> Tick {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total ticks, when known up front.
    pub fn planned_ticks(&self) -> Option<Tick> {
        match &self.plan {
            Plan::Rejected(_) => Some(0),
            Plan::Fixed { cost } => Some(*cost),
            Plan::Route { route, .. } => Some(route.total_ticks),
            Plan::Discovery { .. } => None,
        }
    }
}

enum Attempt {
    Found(ExploreTarget),
    Missed,
    Wasted,
}

/// What a commit produced, before contracts and bookkeeping.
struct Committed {
    success:      bool,
    failure_kind: Option<FailureKind>,
    skill_gained: Option<SkillGain>,
    level_ups:    Vec<LevelUp>,
    delta:        StateDelta,
    detail:       Option<ActionDetail>,
    summary:      String,
}

impl Committed {
    fn success(summary: String) -> Self {
        Self {
            success:      true,
            failure_kind: None,
            skill_gained: None,
            level_ups:    Vec::new(),
            delta:        StateDelta::default(),
            detail:       None,
            summary,
        }
    }

    fn failure(kind: FailureKind, summary: String) -> Self {
        Self {
            success:      false,
            failure_kind: Some(kind),
            ..Self::success(summary)
        }
    }
}

pub struct SimEngine {
    pub world:  WorldState,
    pub config: SimConfig,
    namer:      Box<dyn AreaNamer>,
    store:      Option<SimStore>,
    run_id:     Option<RunId>,
    action_seq: u64,
    /// Bumped by every finished action, including zero-tick ones.
    resolved:   u64,
}

impl SimEngine {
    /// Fresh world for `seed`, named with the word-list namer.
    pub fn new(seed: &str, config: SimConfig) -> Self {
        Self::with_namer(seed, config, Box::new(WordListNamer))
    }

    pub fn with_namer(seed: &str, config: SimConfig, namer: Box<dyn AreaNamer>) -> Self {
        let world = WorldState::new(seed, &config);
        Self::from_world(world, config, namer)
    }

    /// Resume an existing world (tests, loaded saves).
    pub fn from_world(world: WorldState, config: SimConfig, namer: Box<dyn AreaNamer>) -> Self {
        Self {
            world,
            config,
            namer,
            store: None,
            run_id: None,
            action_seq: 0,
            resolved: 0,
        }
    }

    pub fn from_save(doc: SaveDocument, config: SimConfig) -> Self {
        Self::from_world(doc.world, config, Box::new(WordListNamer))
    }

    /// Log every resolved action to `store` under `run_id`.
    pub fn attach_store(&mut self, store: SimStore, run_id: RunId) -> SimResult<()> {
        self.action_seq = store.action_count(&run_id)?;
        self.store = Some(store);
        self.run_id = Some(run_id);
        Ok(())
    }

    pub fn store(&self) -> Option<&SimStore> {
        self.store.as_ref()
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn seed(&self) -> &str {
        &self.world.rng.seed
    }

    pub fn save_document(&self) -> SaveDocument {
        SaveDocument::new(self.world.clone())
    }

    /// Preview an action without side effects.
    pub fn check(&self, action: &Action) -> SimResult<CheckResult> {
        check_action(&self.world, &self.config, action)
    }

    /// Start an action. Nothing changes until the first `step`.
    pub fn begin(&self, action: Action) -> SimResult<ActionRun> {
        let check = self.check(&action)?;
        let plan = match check.failure_kind {
            Some(kind) => Plan::Rejected(kind),
            None => self.plan_for(&action, &check)?,
        };
        Ok(ActionRun {
            action,
            check,
            tick_before: self.world.clock.current_tick,
            last_tick: self.world.clock.current_tick,
            resolved_at: self.resolved,
            elapsed: 0,
            plan,
            audit: Vec::new(),
            finished: false,
            position_before: self.world.player.position.clone(),
        })
    }

    fn plan_for(&self, action: &Action, check: &CheckResult) -> SimResult<Plan> {
        let base = self.config.session.base_travel_ticks;
        let here = &self.world.player.position.area_id;
        Ok(match action {
            Action::Move { to_area } | Action::FarTravel { to_area } => {
                let route = find_route(&self.world.exploration, here, to_area, base).ok_or_else(|| {
                    SimError::InvariantViolation(format!("checked route {here} -> {to_area} vanished"))
                })?;
                // Move is the one-hop case of the same plan.
                Plan::Route { route, reached: 0 }
            }
            Action::Survey | Action::Explore => Plan::Discovery {
                method: if matches!(action, Action::Survey) { DiscoveryMethod::Survey } else { DiscoveryMethod::Explore },
                interval: check.time_cost,
                chance: check.success_probability,
                attempts: 0,
                wasted: 0,
            },
            _ => Plan::Fixed { cost: check.time_cost },
        })
    }

    /// Run an action to completion.
    pub fn execute(&mut self, action: Action) -> SimResult<ActionResult> {
        self.execute_with(action, |_| {})
    }

    /// Run an action to completion, observing every intermediate tick.
    pub fn execute_with(
        &mut self,
        action: Action,
        mut on_progress: impl FnMut(&ProgressEvent),
    ) -> SimResult<ActionResult> {
        let mut run = self.begin(action)?;
        loop {
            match self.step(&mut run)? {
                StepOutcome::Progress(event) => on_progress(&event),
                StepOutcome::Done(result) => return Ok(result),
            }
        }
    }

    /// Advance `run` by at most one tick.
    pub fn step(&mut self, run: &mut ActionRun) -> SimResult<StepOutcome> {
        if run.finished {
            return Err(SimError::RunFinished);
        }
        // Another action resolved since `begin`; the run's check no longer holds.
        if run.resolved_at != self.resolved {
            return Err(SimError::StaleRun { began_after: run.resolved_at, resolved: self.resolved });
        }
        let actual = self.world.clock.current_tick;
        if actual != run.last_tick {
            return Err(SimError::TickMismatch { expected: run.last_tick, actual });
        }

        match run.plan.clone() {
            Plan::Rejected(kind) => {
                let summary = format!("{} rejected: {kind}", run.action.type_name());
                let result = self.finish(run, Committed::failure(kind, summary))?;
                Ok(StepOutcome::Done(result))
            }
            Plan::Fixed { cost } => {
                if cost > 0 {
                    self.advance(run);
                }
                if run.elapsed < cost {
                    return Ok(StepOutcome::Progress(self.progress(run, ProgressNote::Working)));
                }
                let committed = self.commit_fixed(run)?;
                Ok(StepOutcome::Done(self.finish(run, committed)?))
            }
            Plan::Route { route, mut reached } => {
                self.advance(run);
                let hops = &route.hops;
                let mut note = ProgressNote::Working;
                let mut boundary: Tick = hops[..reached].iter().map(|h| h.ticks).sum();
                while reached < hops.len() && boundary + hops[reached].ticks <= run.elapsed {
                    boundary += hops[reached].ticks;
                    let area_id = hops[reached].area_id.clone();
                    self.arrive(run, &area_id)?;
                    note = ProgressNote::HopCompleted { area_id };
                    reached += 1;
                }
                if reached < hops.len() {
                    run.plan = Plan::Route { route, reached };
                    return Ok(StepOutcome::Progress(self.progress(run, note)));
                }
                let path = route.path();
                let mut committed = Committed::success(format!(
                    "Travelled to {} in {} ticks",
                    self.area_label(&self.world.player.position.area_id),
                    run.elapsed
                ));
                committed.detail = Some(ActionDetail::Travel { path });
                Ok(StepOutcome::Done(self.finish(run, committed)?))
            }
            Plan::Discovery { method, interval, chance, mut attempts, mut wasted } => {
                if run.elapsed % interval == 0 && !self.world.clock.can_afford(interval) {
                    let mut committed = Committed::failure(
                        FailureKind::SessionEnded,
                        format!("Session ended after {attempts} attempts"),
                    );
                    committed.detail = Some(ActionDetail::Discovery(DiscoveryDetail {
                        method,
                        chance,
                        roll_interval: interval,
                        attempts,
                        wasted_hits: wasted,
                        found: None,
                    }));
                    return Ok(StepOutcome::Done(self.finish(run, committed)?));
                }
                self.advance(run);
                if run.elapsed % interval != 0 {
                    return Ok(StepOutcome::Progress(self.progress(run, ProgressNote::Working)));
                }

                attempts += 1;
                let target = match self.roll_attempt(run, method, chance)? {
                    Attempt::Found(target) => target,
                    Attempt::Missed => {
                        run.plan = Plan::Discovery { method, interval, chance, attempts, wasted };
                        let note = ProgressNote::RollMissed { attempt: attempts };
                        return Ok(StepOutcome::Progress(self.progress(run, note)));
                    }
                    Attempt::Wasted => {
                        wasted += 1;
                        run.plan = Plan::Discovery { method, interval, chance, attempts, wasted };
                        let note = ProgressNote::RollWasted { attempt: attempts };
                        return Ok(StepOutcome::Progress(self.progress(run, note)));
                    }
                };

                let found = self.with_rng(run, |world, config, namer, rng| {
                    apply_discovery(world, &target, config, namer, rng)
                })?;
                let (skill_gained, level_ups) = self.grant(Skill::Exploration, run.elapsed);
                let mut committed = Committed::success(format!(
                    "{} found {} after {attempts} attempts",
                    run.action.type_name(),
                    describe_discovery(&found)
                ));
                committed.skill_gained = skill_gained;
                committed.level_ups = level_ups;
                committed.delta.discoveries.push(found.clone());
                committed.detail = Some(ActionDetail::Discovery(DiscoveryDetail {
                    method,
                    chance,
                    roll_interval: interval,
                    attempts,
                    wasted_hits: wasted,
                    found: Some(found),
                }));
                Ok(StepOutcome::Done(self.finish(run, committed)?))
            }
        }
    }

    // ── Step helpers ───────────────────────────────────────────

    fn advance(&mut self, run: &mut ActionRun) {
        let tick = self.world.clock.advance();
        run.elapsed += 1;
        run.last_tick = tick;
    }

    fn progress(&self, run: &ActionRun, note: ProgressNote) -> ProgressEvent {
        ProgressEvent {
            tick:    self.world.clock.current_tick,
            elapsed: run.elapsed,
            planned: run.planned_ticks(),
            note,
        }
    }

    /// Check the cursor out of the world for `f`, recording draws into the
    /// run's audit. The cursor goes back even when `f` fails.
    fn with_rng<T>(
        &mut self,
        run: &mut ActionRun,
        f: impl FnOnce(&mut WorldState, &SimConfig, &dyn AreaNamer, &mut ActionRng) -> SimResult<T>,
    ) -> SimResult<T> {
        let cursor = std::mem::take(&mut self.world.rng);
        let mut rng = ActionRng::new(cursor, &mut run.audit);
        let out = f(&mut self.world, &self.config, self.namer.as_ref(), &mut rng);
        self.world.rng = rng.finish();
        out
    }

    fn arrive(&mut self, run: &mut ActionRun, area_id: &str) -> SimResult<()> {
        self.world.player.position = Position::hub(area_id);
        self.with_rng(run, |world, config, namer, rng| promote_area(world, area_id, config, namer, rng))?;
        log::debug!("tick={} travel: reached {area_id}", self.world.clock.current_tick);
        Ok(())
    }

    /// One survey/explore attempt.
    fn roll_attempt(&mut self, run: &mut ActionRun, method: DiscoveryMethod, chance: f64) -> SimResult<Attempt> {
        self.with_rng(run, |world, config, _namer, rng| match method {
            DiscoveryMethod::Survey => Ok(match roll_survey(world, chance, rng) {
                SurveyRoll::Hit(id) => Attempt::Found(ExploreTarget::Connection(id)),
                SurveyRoll::Wasted(_) => Attempt::Wasted,
                SurveyRoll::Miss => Attempt::Missed,
            }),
            DiscoveryMethod::Explore => {
                let candidates = explore_candidates(world, chance, &config.discovery)?;
                Ok(roll_explore(&candidates, rng).map_or(Attempt::Missed, Attempt::Found))
            }
        })
    }

    fn grant(&mut self, skill: Skill, amount: u64) -> (Option<SkillGain>, Vec<LevelUp>) {
        let state = self.world.player.skills.entry(skill).or_default();
        if !state.is_enrolled() || amount == 0 {
            return (None, Vec::new());
        }
        let ups = grant_xp(state, skill, amount, &self.config.skills);
        (Some(SkillGain { skill, amount }), ups)
    }

    fn area_label(&self, area_id: &str) -> String {
        self.world
            .exploration
            .areas
            .get(area_id)
            .map(|a| a.display_name())
            .unwrap_or_else(|| area_id.to_string())
    }

    // ── Commits ────────────────────────────────────────────────

    fn commit_fixed(&mut self, run: &mut ActionRun) -> SimResult<Committed> {
        let ticks = run.elapsed;
        match run.action.clone() {
            Action::Gather { node_id, mode, focus_material } => {
                self.commit_gather(run, &node_id, mode, focus_material.as_deref(), ticks)
            }
            Action::Fight => self.commit_fight(run, ticks),
            Action::Craft { recipe_id } => self.commit_craft(&recipe_id, ticks),
            Action::Store { item_id, quantity } => {
                self.world.player.inventory.remove(&item_id, quantity)?;
                *self.world.player.storage.entry(item_id.clone()).or_insert(0) += quantity;
                self.world.player.reconcile_equipment();
                let mut c = Committed::success(format!("Stored {quantity} {item_id}"));
                c.delta.items_removed.push(ItemStack::new(item_id, quantity));
                Ok(c)
            }
            Action::Drop { item_id, quantity } => {
                self.world.player.inventory.remove(&item_id, quantity)?;
                self.world.player.reconcile_equipment();
                let mut c = Committed::success(format!("Dropped {quantity} {item_id}"));
                c.delta.items_removed.push(ItemStack::new(item_id, quantity));
                Ok(c)
            }
            Action::Enrol { skill } => {
                self.world.player.skills.insert(skill, SkillState::enrolled());
                Ok(Committed::success(format!("Enrolled in the {} guild", skill.name())))
            }
            Action::AcceptContract { contract_id } => {
                self.world.player.active_contracts.insert(contract_id.clone());
                Ok(Committed::success(format!("Accepted contract {contract_id}")))
            }
            Action::TravelToLocation { location_id } => {
                let label = self
                    .world
                    .content
                    .locations
                    .get(&location_id)
                    .map(|l| l.kind.label())
                    .unwrap_or_else(|| location_id.clone());
                self.world.player.position.location_id = Some(location_id);
                Ok(Committed::success(format!("Walked to the {label}")))
            }
            Action::Leave => {
                self.world.player.position.location_id = None;
                Ok(Committed::success("Returned to the area hub".to_string()))
            }
            other => Err(SimError::InvariantViolation(format!(
                "{} has no fixed-cost commit",
                other.type_name()
            ))),
        }
    }

    fn commit_gather(
        &mut self,
        run: &mut ActionRun,
        node_id: &str,
        mode: GatherMode,
        focus_material: Option<&str>,
        ticks: Tick,
    ) -> SimResult<Committed> {
        let node = self
            .world
            .content
            .nodes
            .get(node_id)
            .ok_or_else(|| SimError::InvariantViolation(format!("node {node_id} vanished mid-action")))?;
        let skill = node.node_type.skill();
        let level = self.world.player.level(skill);
        let distance = self.world.exploration.area(&node.area_id)?.distance;
        let tick = self.world.clock.current_tick;

        let extraction = self.with_rng(run, |world, config, _namer, rng| {
            let node = world
                .content
                .nodes
                .get_mut(node_id)
                .ok_or_else(|| SimError::InvariantViolation(format!("node {node_id} vanished mid-action")))?;
            let g = &config.gather;
            match mode {
                GatherMode::Appraise => Ok(Extraction {
                    detail:    extraction::appraise(node, level, g),
                    extracted: Vec::new(),
                    xp:        0,
                }),
                GatherMode::Focus => {
                    let material = focus_material.ok_or_else(|| {
                        SimError::InvariantViolation("focus gather without a material".to_string())
                    })?;
                    extraction::focus(node, material, level, distance, ticks, g, rng)
                }
                GatherMode::CarefulAll => extraction::careful_all(node, level, ticks, g),
            }
        })?;

        let capacity = self.world.player.capacity;
        for stack in &extraction.extracted {
            self.world.player.inventory.add(&stack.item_id, stack.quantity, capacity)?;
        }
        if self.world.content.nodes.get(node_id).map(|n| n.depleted).unwrap_or(false) {
            log::info!("tick={tick} extraction: {node_id} depleted");
        }

        let (skill_gained, level_ups) = self.grant(skill, extraction.xp);
        let taken: u64 = extraction.extracted.iter().map(|s| s.quantity).sum();
        let mut c = Committed::success(match mode {
            GatherMode::Appraise => format!("Appraised {node_id}"),
            _ => format!("{} gathered {taken} units from {node_id}", mode.name()),
        });
        c.skill_gained = skill_gained;
        c.level_ups = level_ups;
        c.delta.items_added = extraction.extracted;
        c.detail = Some(ActionDetail::Extraction(extraction.detail));
        Ok(c)
    }

    fn commit_fight(&mut self, run: &mut ActionRun, ticks: Tick) -> SimResult<Committed> {
        let enemy_id = match self.world.current_location().map(|l| &l.kind) {
            Some(LocationKind::MobCamp { enemy_id }) => enemy_id.clone(),
            _ => return Err(SimError::InvariantViolation("fight committed away from a camp".to_string())),
        };
        let enemy = self
            .world
            .content
            .enemies
            .get(&enemy_id)
            .cloned()
            .ok_or_else(|| SimError::InvariantViolation(format!("enemy {enemy_id} vanished")))?;
        let bonus = weapon_bonus(self.world.player.equipped_weapon.as_deref(), &self.config.content);
        let p = win_probability(self.world.player.level(Skill::Combat), enemy.level, bonus, &self.config.combat);
        let won = self.with_rng(run, |_, _, _, rng| Ok(rng.chance(p, "fight.win")))?;

        let detail = ActionDetail::Combat { enemy_id: enemy_id.clone(), win_probability: p, won };
        if !won {
            let mut c = Committed::failure(FailureKind::CombatLost, format!("Lost to the {enemy_id}"));
            c.detail = Some(detail);
            return Ok(c);
        }

        let capacity = self.world.player.capacity;
        for loot in &enemy.loot {
            self.world.player.inventory.add(&loot.item_id, loot.quantity, capacity)?;
        }
        let (skill_gained, level_ups) = self.grant(Skill::Combat, ticks * enemy.level as u64);
        let mut c = Committed::success(format!("Defeated the {enemy_id}"));
        c.skill_gained = skill_gained;
        c.level_ups = level_ups;
        c.delta.items_added = enemy.loot;
        c.detail = Some(detail);
        Ok(c)
    }

    fn commit_craft(&mut self, recipe_id: &str, ticks: Tick) -> SimResult<Committed> {
        let recipe = self
            .world
            .content
            .recipes
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| SimError::InvariantViolation(format!("recipe {recipe_id} vanished")))?;
        let player = &mut self.world.player;
        if !player.inventory.contains_all(&recipe.inputs) {
            return Err(SimError::InvariantViolation(format!("inputs for {recipe_id} vanished mid-action")));
        }
        for input in &recipe.inputs {
            player.inventory.remove(&input.item_id, input.quantity)?;
        }
        player.inventory.add(&recipe.output.item_id, recipe.output.quantity, player.capacity)?;
        player.reconcile_equipment();

        let equipped = is_upgrade(player.equipped_weapon.as_deref(), &recipe.output.item_id, &self.config.content);
        if equipped {
            player.equipped_weapon = Some(recipe.output.item_id.clone());
        }

        let (skill_gained, level_ups) = self.grant(recipe.skill, ticks * recipe.tier as u64);
        let mut c = Committed::success(format!(
            "Crafted {} {}{}",
            recipe.output.quantity,
            recipe.output.item_id,
            if equipped { " (equipped)" } else { "" }
        ));
        c.skill_gained = skill_gained;
        c.level_ups = level_ups;
        c.delta.items_removed = recipe.inputs.clone();
        c.delta.items_added = vec![recipe.output.clone()];
        c.detail = Some(ActionDetail::Craft { recipe_id: recipe.recipe_id, output: recipe.output, equipped });
        Ok(c)
    }

    // ── Finish ─────────────────────────────────────────────────

    fn finish(&mut self, run: &mut ActionRun, mut committed: Committed) -> SimResult<ActionResult> {
        let tick = self.world.clock.current_tick;
        let mut contracts_completed = Vec::new();
        if committed.success {
            let (done, ups, handed_in) = settle_contracts(&mut self.world, &self.config.skills)?;
            contracts_completed = done;
            committed.level_ups.extend(ups);
            committed.delta.items_removed.extend(handed_in);
        }
        if self.world.player.position != run.position_before {
            committed.delta.position = Some(self.world.player.position.clone());
        }
        committed.delta.session_remaining_ticks = self.world.clock.session_remaining_ticks;

        run.finished = true;
        self.resolved += 1;
        let result = ActionResult {
            tick_before:         run.tick_before,
            action_type:         run.action.type_name().to_string(),
            parameters:          run.action.clone(),
            success:             committed.success,
            failure_kind:        committed.failure_kind,
            time_consumed:       run.elapsed,
            skill_gained:        committed.skill_gained,
            level_ups:           committed.level_ups,
            contracts_completed,
            rng_roll_audit:      std::mem::take(&mut run.audit),
            state_delta:         committed.delta,
            summary:             committed.summary,
            detail:              committed.detail,
        };

        if result.success {
            log::info!("tick={tick} engine: {} ({} ticks)", result.summary, result.time_consumed);
        } else {
            log::warn!(
                "tick={tick} engine: {} failed with {} after {} ticks",
                result.action_type,
                result.failure_kind.map(|k| k.code()).unwrap_or("UNKNOWN"),
                result.time_consumed
            );
        }
        for up in &result.level_ups {
            log::info!("tick={tick} skills: {} reached level {}", up.skill.name(), up.new_level);
        }

        self.world.check_invariants()?;
        self.log_result(&result)?;
        Ok(result)
    }

    fn log_result(&mut self, result: &ActionResult) -> SimResult<()> {
        let (Some(store), Some(run_id)) = (&self.store, &self.run_id) else {
            return Ok(());
        };
        let entry = ActionLogEntry {
            id:          None,
            run_id:      run_id.clone(),
            seq:         self.action_seq,
            tick_before: result.tick_before,
            action_type: result.action_type.clone(),
            success:     result.success,
            payload:     serde_json::to_string(result)?,
        };
        store.append_action(&entry)?;
        self.action_seq += 1;
        Ok(())
    }
}

fn describe_discovery(found: &crate::outcome::Discovery) -> String {
    match found {
        crate::outcome::Discovery::Location { kind, .. } => kind.label(),
        crate::outcome::Discovery::Connection { to_area, new_area, .. } => {
            if *new_area {
                format!("a route to new area {to_area}")
            } else {
                format!("a route to {to_area}")
            }
        }
    }
}
