use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dealer::{play_game, HumanInput, LogUi, Recorder, Ui};
use setgame::Config;
use tracing::{debug, info};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Path to a config JSON file. Missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How many games to play
    #[arg(short, long, default_value_t = 1)]
    num_games: usize,

    /// RNG seed, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Number of human players, overrides the config. They are fed from stdin
    /// with lines of the form "<player> <slot>"
    #[arg(long)]
    human_players: Option<usize>,

    /// Number of computer players, overrides the config
    #[arg(long)]
    computer_players: Option<usize>,

    /// Milliseconds until the table is dealt anew, overrides the config
    #[arg(long)]
    turn_timeout_millis: Option<u64>,

    /// Record what was shown during each game as JSON files into this directory
    #[arg(short, long)]
    record_games_to_directory: Option<PathBuf>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(human_players) = self.human_players {
            config.human_players = human_players;
        }
        if let Some(computer_players) = self.computer_players {
            config.computer_players = computer_players;
        }
        if let Some(turn_timeout_millis) = self.turn_timeout_millis {
            config.turn_timeout_millis = turn_timeout_millis;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let mut config = args.load_config()?;
    debug!(?config);

    let names: Vec<String> = (0..config.num_players())
        .map(|idx| config.player_name(idx))
        .collect();
    let log_ui: Arc<dyn Ui> = Arc::new(LogUi::new(names.clone()));
    let recorder = match args.record_games_to_directory {
        Some(dir_path) => Some(Arc::new(
            Recorder::with_directory(dir_path)?.forwarding_to(log_ui.clone()),
        )),
        None => None,
    };
    let ui: Arc<dyn Ui> = match &recorder {
        Some(recorder) => recorder.clone() as Arc<dyn Ui>,
        None => log_ui,
    };

    let input = Arc::new(HumanInput::new());
    if config.human_players > 0 {
        let input = input.clone();
        // Not joined, stdin may never close
        std::thread::Builder::new()
            .name(String::from("keyboard"))
            .spawn(move || input.run(std::io::stdin().lock()))?;
    }

    // Each game gets its own seed, derived from the first one
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut wins = vec![0usize; config.num_players()];
    let mut ties = 0;
    for game_idx in 0..args.num_games {
        config.seed = Some(seed.wrapping_add(game_idx as u64));
        let result = play_game(&config, ui.clone(), &input)?;
        if let Some(recorder) = &recorder {
            if let Some(path) = recorder.write_game_recording()? {
                debug!(game_idx, path = %path.display(), "Recorded game");
            }
        }
        if let [winner] = result.winners[..] {
            info!(winner = %names[winner], game_idx, scores = ?result.scores);
            wins[winner] += 1;
        } else {
            info!(game_idx, winners = ?result.winners, scores = ?result.scores, "Tie");
            ties += 1;
        }
    }

    eprintln!("End result:");
    for (name, wins) in names.iter().zip(&wins) {
        eprintln!("- {} wins by {}", wins, name);
    }
    eprintln!("- {} ties", ties);

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .with_thread_names(true)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
