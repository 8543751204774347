use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use ral_simulation::{
    Arena, AsciiCanvas, GridConfig, GridWorld, SimEventKind, TickReport, World, WorldConfig,
};

use super::WorldKind;

pub struct RunOptions<'a> {
    pub world: WorldKind,
    pub ticks: u64,
    pub seed: Option<u64>,
    pub config: Option<&'a Path>,
    pub episode: Option<&'a Path>,
    pub render: bool,
    pub report_every: u64,
    pub verbose: bool,
}

pub fn run(opts: &RunOptions<'_>) -> Result<(), String> {
    let (mut arena, seed, canvas_size) = build_arena(opts)?;
    if opts.episode.is_some() {
        arena.enable_episode();
    }

    println!(
        "  {} {} world {}",
        "Running".bold(),
        opts.world,
        format!("({} ticks, seed={seed})", opts.ticks).dimmed()
    );
    println!();

    let mut rows: Vec<TickReport> = Vec::new();
    let mut extinct = false;
    for _ in 0..opts.ticks {
        let alive = arena
            .step()
            .map_err(|e| format!("simulation error at tick {}: {e}", arena.tick()))?;
        let report = arena.last_report();
        let last = !alive || report.tick == opts.ticks;
        if last || (opts.report_every > 0 && report.tick % opts.report_every == 0) {
            rows.push(report);
        }
        if !alive {
            extinct = true;
            break;
        }
    }

    if opts.verbose {
        print_event_log(arena.as_ref());
    }

    if !rows.is_empty() {
        println!("{}", report_table(&rows));
        println!();
    }
    println!("  {}", arena.info());
    if extinct {
        println!(
            "  {} every creature is gone after {} ticks",
            "EXTINCT".red().bold(),
            arena.tick()
        );
    }

    if opts.render {
        let (cols, rows) = canvas_size;
        let mut canvas = AsciiCanvas::new(cols, rows, arena.extent());
        arena.draw(&mut canvas);
        println!();
        println!("{}", canvas.render());
    }

    if let Some(path) = opts.episode {
        let episode = arena
            .episode()
            .ok_or_else(|| "episode recording was not enabled".to_string())?;
        episode
            .save(path)
            .map_err(|e| format!("cannot write episode {}: {e}", path.display()))?;
        println!(
            "  Episode written to {} ({} frames)",
            path.display(),
            episode.frames().len()
        );
    }

    Ok(())
}

type Built = (Box<dyn Arena>, u64, (usize, usize));

fn build_arena(opts: &RunOptions<'_>) -> Result<Built, String> {
    let load_error = |path: &Path, e: ral_simulation::SimError| {
        format!("cannot load config {}: {e}", path.display())
    };
    match opts.world {
        WorldKind::Ball => {
            let mut config = match opts.config {
                Some(path) => WorldConfig::load(path).map_err(|e| load_error(path, e))?,
                None => WorldConfig::default(),
            };
            if let Some(seed) = opts.seed {
                config = config.with_seed(seed);
            }
            let seed = config.seed;
            let world = World::new(config).map_err(|e| format!("cannot create world: {e}"))?;
            Ok((Box::new(world), seed, (60, 30)))
        }
        WorldKind::Grid => {
            let mut config = match opts.config {
                Some(path) => GridConfig::load(path).map_err(|e| load_error(path, e))?,
                None => GridConfig::default(),
            };
            if let Some(seed) = opts.seed {
                config = config.with_seed(seed);
            }
            let (seed, size) = (config.seed, config.size);
            let world = GridWorld::new(config).map_err(|e| format!("cannot create world: {e}"))?;
            Ok((Box::new(world), seed, (size, size)))
        }
    }
}

fn report_table(rows: &[TickReport]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Tick",
        "Creatures",
        "Grass",
        "Born",
        "Starved",
        "Eaten",
        "Grass eaten",
    ]);
    for r in rows {
        table.add_row(vec![
            r.tick.to_string(),
            r.creatures.to_string(),
            r.grass.to_string(),
            r.born.to_string(),
            r.starved.to_string(),
            r.eaten.to_string(),
            r.grass_eaten.to_string(),
        ]);
    }
    table
}

fn print_event_log(arena: &dyn Arena) {
    println!("  {}", "Event Log".bold().underline());
    println!();
    for event in arena.events().events() {
        let tick_label = format!("[tick {:>4}]", event.tick).dimmed();
        let desc = colorize_event(&event.kind, &event.description);
        println!("  {tick_label} {desc}");
    }
    if arena.events().is_empty() {
        println!("  {}", "(no events)".dimmed());
    }
    println!();
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::Died { .. } => description.red().bold(),
        SimEventKind::Born { .. } => description.yellow(),
        SimEventKind::AteGrass { .. } => description.green(),
        SimEventKind::AteCreature { .. } => description.red(),
        SimEventKind::PlacementSkipped { .. } => description.dimmed(),
    }
}
