//! sim-runner: headless runner for the expedition simulation.
//!
//! Usage:
//!   sim-runner --seed s1 --script demos/first_session.json --db run.db --save out.json
//!   sim-runner --seed s1 --load out.json --script more.json
//!   sim-runner --seed s1 --ipc-mode

use anyhow::{Context, Result};
use expedition_core::{
    action::Action,
    config::SimConfig,
    engine::SimEngine,
    inventory::ItemStack,
    outcome::ActionResult,
    skills::{Skill, SkillState},
    snapshot::SaveDocument,
    store::SimStore,
    types::Tick,
    world::Position,
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Action { action: Action },
    GetState,
    Save { path: Option<String> },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:                    Tick,
    session_remaining_ticks: Tick,
    position:                Position,
    area_name:               String,
    inventory:               Vec<ItemStack>,
    storage:                 BTreeMap<String, u64>,
    skills:                  BTreeMap<Skill, SkillState>,
    equipped_weapon:         Option<String>,
    active_contracts:        Vec<String>,
    known_areas:             usize,
    known_connections:       usize,
    rng_counter:             u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = arg_value(&args, "--seed").unwrap_or("s1");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let script = arg_value(&args, "--script");
    let save_path = arg_value(&args, "--save");
    let load_path = arg_value(&args, "--load");
    let session: Option<Tick> = arg_value(&args, "--session").and_then(|s| s.parse().ok());

    let mut config = SimConfig::load(data_dir)?;
    if let Some(ticks) = session {
        config.session.session_ticks = ticks;
    }

    if !ipc_mode {
        println!("Expedition sim-runner");
        println!("  seed:      {seed}");
        println!("  session:   {}", config.session.session_ticks);
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        if let Some(s) = script {
            println!("  script:    {s}");
        }
        println!();
    }

    // Named shared-memory URI so a reopened connection sees the same rows.
    let db_effective: String = if db == ":memory:" {
        format!("file:simrun_{}?mode=memory&cache=shared", uuid::Uuid::new_v4().simple())
    } else {
        db.to_string()
    };
    let store = SimStore::open(&db_effective)?;
    store.migrate()?;

    let mut engine = match load_path {
        Some(path) => {
            let doc = SaveDocument::load_from_file(Path::new(path))
                .with_context(|| format!("Cannot load save {path}"))?;
            log::info!("tick={} runner: resumed from {path}", doc.world.clock.current_tick);
            SimEngine::from_save(doc, config)
        }
        None => SimEngine::new(seed, config),
    };

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    store.insert_run(
        &run_id,
        engine.seed(),
        env!("CARGO_PKG_VERSION"),
        &chrono::Utc::now().to_rfc3339(),
    )?;
    engine.attach_store(store, run_id.clone())?;

    if ipc_mode {
        return run_ipc_loop(&mut engine);
    }

    let actions = match script {
        Some(path) => read_script(path)?,
        None => Vec::new(),
    };
    let mut results = Vec::with_capacity(actions.len());
    for action in actions {
        let result = engine.execute(action)?;
        print_result(&result);
        results.push(result);
    }

    if let Some(path) = save_path {
        let doc = engine.save_document();
        doc.save_to_file(Path::new(path))?;
        if let Some(store) = engine.store() {
            store.insert_save(&run_id, &doc)?;
        }
        println!("  saved:     {path}");
    }

    print_summary(&engine, &run_id, &results)?;
    Ok(())
}

fn read_script(path: &str) -> Result<Vec<Action>> {
    let text = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let actions: Vec<Action> =
        serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid JSON in {path}: {e}"))?;
    Ok(actions)
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Action { action } => {
                let result = engine.execute(action)?;
                let reply = serde_json::json!({ "result": result, "state": build_ui_state(engine) });
                writeln!(stdout, "{}", reply)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Save { path } => {
                let doc = engine.save_document();
                if let Some(p) = &path {
                    doc.save_to_file(Path::new(p))?;
                }
                if let (Some(store), Some(run_id)) = (engine.store(), engine.run_id()) {
                    store.insert_save(run_id, &doc)?;
                }
                let reply = serde_json::json!({ "saved": true, "tick": doc.world.clock.current_tick, "path": path });
                writeln!(stdout, "{}", reply)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let world = &engine.world;
    let area_name = world
        .current_area()
        .map(|a| a.display_name())
        .unwrap_or_else(|_| world.player.position.area_id.clone());
    UiState {
        tick:                    world.clock.current_tick,
        session_remaining_ticks: world.clock.session_remaining_ticks,
        position:                world.player.position.clone(),
        area_name,
        inventory:               world.player.inventory.slots.clone(),
        storage:                 world.player.storage.clone(),
        skills:                  world.player.skills.clone(),
        equipped_weapon:         world.player.equipped_weapon.clone(),
        active_contracts:        world.player.active_contracts.iter().cloned().collect(),
        known_areas:             world.exploration.known_areas.len(),
        known_connections:       world.exploration.known_connections.len(),
        rng_counter:             world.rng.counter,
    }
}

fn print_result(result: &ActionResult) {
    let status = match result.failure_kind {
        None => "ok".to_string(),
        Some(kind) => kind.code().to_string(),
    };
    println!(
        "  [t={:>5}] {:<18} {:<24} +{:>3} ticks  {}",
        result.tick_before, result.action_type, status, result.time_consumed, result.summary
    );
    for up in &result.level_ups {
        println!("              {} -> level {}", up.skill.name(), up.new_level);
    }
    for done in &result.contracts_completed {
        println!("              contract {} complete (+{} xp)", done.contract_id, done.reward_xp);
    }
}

fn print_summary(engine: &SimEngine, run_id: &str, results: &[ActionResult]) -> Result<()> {
    let world = &engine.world;
    let succeeded = results.iter().filter(|r| r.success).count();
    let logged = match engine.store() {
        Some(store) => store.action_count(run_id)?,
        None => 0,
    };

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  seed:           {}", engine.seed());
    println!("  actions:        {} ({succeeded} succeeded)", results.len());
    println!("  actions logged: {logged}");
    println!("  final tick:     {}", world.clock.current_tick);
    println!("  ticks left:     {}", world.clock.session_remaining_ticks);
    println!("  rng counter:    {}", world.rng.counter);
    println!(
        "  position:       {} / {}",
        world.player.position.area_id,
        world.player.position.location_id.as_deref().unwrap_or("hub")
    );
    println!(
        "  known:          {} areas, {} connections, {} locations",
        world.exploration.known_areas.len(),
        world.exploration.known_connections.len(),
        world.exploration.known_locations.len()
    );

    println!();
    println!("=== SKILLS ===");
    for (skill, state) in &world.player.skills {
        if state.is_enrolled() {
            println!("  {:<14} level {:>2}  ({} xp)", skill.name(), state.level, state.xp);
        }
    }

    println!();
    println!("=== INVENTORY ({}/{}) ===", world.player.inventory.distinct_count(), world.player.capacity);
    if world.player.inventory.is_empty() {
        println!("  (empty)");
    }
    for stack in &world.player.inventory.slots {
        let marker = if world.player.equipped_weapon.as_deref() == Some(stack.item_id.as_str()) {
            " (equipped)"
        } else {
            ""
        };
        println!("  {:<16} x{}{marker}", stack.item_id, stack.quantity);
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
