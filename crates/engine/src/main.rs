//! Questkeeper - terminal driver.
//!
//! A line-based presentation layer over the engine, for manual play.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questkeeper_domain::{
    AdventureDetails, AdventureDifficulty, CharacterSheet, Die, DmModel, EntityId, RollMode,
    Sender,
};
use questkeeper_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    gemini::GeminiNarrationClient,
    imagen::GeminiImageClient,
    settings::EngineConfig,
};
use questkeeper_engine::use_cases::turn::PlayerInput;
use questkeeper_engine::App;

const HELP: &str = "Commands:
  /roll <die>             roll a die (d4, d6, d8, d10, d12, d20, d100)
  /check <name> <mod>     ability, skill or saving throw check
  /mode <mode>            normal, advantage or disadvantage for the next d20
  /model <id>             switch the Dungeon Master model (flash, pro, or a model id)
  /save                   write a save file
  /load <path>            load a save file
  /portrait <entity-id>   generate a portrait for a map entity
  /map                    list map entities
  /quests                 list quests
  /quit                   leave
Anything else is sent to the Dungeon Master.";

#[derive(Debug, Default)]
struct Args {
    sheet: Option<PathBuf>,
    import: Option<PathBuf>,
    load: Option<PathBuf>,
    world: Option<String>,
    premise: Option<String>,
    difficulty: AdventureDifficulty,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = Args::default();
        while let Some(flag) = raw.next() {
            let mut value = || {
                raw.next()
                    .with_context(|| format!("{} expects a value", flag))
            };
            match flag.as_str() {
                "--sheet" => args.sheet = Some(value()?.into()),
                "--import" => args.import = Some(value()?.into()),
                "--load" => args.load = Some(value()?.into()),
                "--world" => args.world = Some(value()?),
                "--premise" => args.premise = Some(value()?),
                "--difficulty" => args.difficulty = value()?.parse()?,
                other => bail!("Unknown argument '{}'", other),
            }
        }
        Ok(args)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root.
    load_dotenv_from_repo_root();

    // Logs go to stderr so they do not interleave with the story.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questkeeper_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = EngineConfig::from_env()?;
    tracing::info!(model = %config.dm_model, "Starting Questkeeper");

    let app = App::new(
        Arc::new(GeminiNarrationClient::from_config(&config)),
        Arc::new(GeminiImageClient::from_config(&config)),
        Arc::new(SystemClock::new()),
        Arc::new(SystemRandom::new()),
        config,
    );

    if let Some(path) = &args.load {
        app.use_cases.save.restore.load_from(path).await?;
    } else {
        let sheet = load_sheet(&app, &args).await?;
        let details = match &args.world {
            Some(world) => AdventureDetails::new(
                args.difficulty,
                world.as_str(),
                args.premise.clone().unwrap_or_default(),
            ),
            None => {
                app.use_cases
                    .character_sheet
                    .suggest_adventure
                    .execute(args.difficulty, &sheet)
                    .await?
            }
        };
        println!("Adventure in {}: {}", details.world_name, details.additional_info);
        app.use_cases.game.start.execute(sheet, details).await?;
    }

    repl(&app).await
}

async fn load_sheet(app: &App, args: &Args) -> anyhow::Result<CharacterSheet> {
    match (&args.sheet, &args.import) {
        (Some(path), _) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(serde_json::from_str(&json)?)
        }
        (None, Some(path)) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(app.use_cases.character_sheet.import.execute(&text).await?)
        }
        (None, None) => bail!("Provide --sheet <sheet.json>, --import <sheet.txt> or --load <save.json>"),
    }
}

async fn repl(app: &App) -> anyhow::Result<()> {
    let mut printed = print_new_messages(app, 0);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match run_command(app, line).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Reprint) => printed = print_new_messages(app, 0),
            Ok(Flow::Continue) => printed = print_new_messages(app, printed),
            Err(e) => {
                printed = print_new_messages(app, printed);
                println!("! {}", e);
            }
        }
    }
    Ok(())
}

enum Flow {
    Continue,
    Reprint,
    Quit,
}

async fn run_command(app: &App, line: &str) -> anyhow::Result<Flow> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let actions = &app.use_cases.player_action;

    match command {
        "/quit" | "/exit" => return Ok(Flow::Quit),
        "/help" => println!("{}", HELP),
        "/roll" => {
            let die: Die = rest.parse()?;
            actions.roll_dice.execute(die).await?;
        }
        "/check" => {
            let (name, modifier) = rest
                .rsplit_once(' ')
                .context("usage: /check <name> <modifier>")?;
            let modifier: i32 = modifier.trim_start_matches('+').parse()?;
            actions.stat_check.execute(name.trim(), modifier).await?;
        }
        "/mode" => {
            let mode: RollMode = rest.parse()?;
            actions.roll_mode.execute(mode);
            println!("Roll mode: {}", mode);
        }
        "/model" => {
            if rest.is_empty() {
                bail!("usage: /model <id>");
            }
            if !app.use_cases.game.switch_model.execute(DmModel::from(rest)).await? {
                println!("Model unchanged.");
            }
        }
        "/save" => {
            let path = app.use_cases.save.serialize.save_to(&app.config.save_dir).await?;
            println!("Saved to {}", path.display());
        }
        "/load" => {
            if rest.is_empty() {
                bail!("usage: /load <path>");
            }
            app.use_cases
                .save
                .restore
                .load_from(std::path::Path::new(rest))
                .await?;
            return Ok(Flow::Reprint);
        }
        "/portrait" => {
            let entity_id: EntityId = rest.parse()?;
            let portrait = app.use_cases.portrait.clone();
            tokio::spawn(async move {
                match portrait.execute(entity_id).await {
                    Ok(p) => println!("Portrait of {} is ready.", p.label),
                    Err(e) => tracing::warn!(error = %e, "Portrait generation failed"),
                }
            });
        }
        "/map" => app.store.read(|s| match &s.map_state {
            Some(map) => {
                println!("Map {}x{}", map.width, map.height);
                for e in &map.entities {
                    println!("  {} {} at ({}, {})", e.id, e.label(), e.x, e.y);
                }
            }
            None => println!("No map yet."),
        }),
        "/quests" => app.store.read(|s| {
            for quest in &s.quests {
                println!("  [{}] {}: {}", quest.status, quest.title, quest.description);
            }
        }),
        _ if command.starts_with('/') => bail!("Unknown command {}", command),
        _ => {
            actions.act.execute(PlayerInput::text(line)).await?;
        }
    }
    Ok(Flow::Continue)
}

/// Print log entries from `from` on. Returns the new log length.
fn print_new_messages(app: &App, from: usize) -> usize {
    app.store.read(|s| {
        for message in s.game_log.iter().skip(from) {
            match message.sender {
                Sender::Player => println!("> {}", message.text),
                Sender::Dm => println!("\n{}\n", message.text),
                Sender::System => println!("  * {}", message.text),
            }
        }
        if let Some(error) = &s.error {
            println!("! {}", error);
        }
        s.game_log.len()
    })
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
