use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use jam_players::clients::{FileClient, IClient, SampleClient};
use jam_rs::algorithm::SessionStats;
use jam_rs::config::JamConfig;
use jam_rs::game::{find_game, GAMES};
use jam_rs::session::TickOutcome;
use jam_scheduler::{describe_band, describe_roster, parse_members, JamSession};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Band rotation for open jam sessions
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// ex. --config jam.toml
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Directory holding the saved session
    #[arg(short = 's', long = "state", default_value = ".jam")]
    state: PathBuf,

    /// Organizer PIN, required by commands that change the session
    #[arg(long = "pin", env = "JAM_ADMIN_PIN")]
    pin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register musicians from a roster csv or from --member entries
    Import {
        /// ex. roster.csv (the bundled sample when omitted)
        path: Option<PathBuf>,

        /// ex. --member name/DRUMS/VOICE
        #[arg(short = 'm', long = "member")]
        members: Vec<String>,
    },

    /// Pause or resume a musician
    Toggle { username: String },

    /// Remove a musician from the roster
    Remove { username: String },

    /// Generate bands and append them to the queue
    Generate {
        #[arg(short = 'n', long = "count", default_value_t = 1)]
        count: usize,

        /// 0 picks a random size
        #[arg(long = "size", default_value_t = 0)]
        size: usize,

        #[arg(long = "seed")]
        seed: Option<u64>,
    },

    /// Append an empty band to fill by hand
    Manual {
        #[arg(long = "seed")]
        seed: Option<u64>,
    },

    /// Add a musician to a queued band
    Join {
        /// Position in the queue, 0 is on stage
        index: usize,
        username: String,
        role: String,
    },

    /// Finish the band on stage and bring up the next one
    Advance {
        /// ex. --game game-hand
        #[arg(short = 'g', long = "game")]
        games: Vec<String>,
    },

    /// Move a queued band to another position
    Move { from: usize, to: usize },

    /// Drop a band from the queue
    Drop { index: usize },

    /// Change the slot length of a queued band
    Duration { index: usize, minutes: u32 },

    /// Run the countdown for the band on stage
    Run {
        /// Start from this remaining time, ex. --time 4:30 or --time 2.5
        #[arg(short = 't', long = "time")]
        time: Option<String>,
    },

    /// Restore the latest backup into an empty session
    Restore,

    /// Print the queue and the roster
    Show {
        /// Only list musicians playing one of these, ex. --instrument KEYS
        #[arg(short = 'i', long = "instrument")]
        instruments: Vec<String>,
    },

    /// Print statistics of the bands played so far
    Stats,

    /// List the mini games
    Games,
}

impl Command {
    fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Command::Run { .. } | Command::Show { .. } | Command::Stats | Command::Games
        )
    }
}

fn random_source(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<JamConfig> {
    let Some(path) = path else {
        return Ok(JamConfig::default());
    };
    JamConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn print_queue(session: &JamSession) {
    if session.store.queue().is_empty() {
        println!("(no band on stage)");
        return;
    }

    for (index, band) in session.store.queue().iter().enumerate() {
        let marker = if index == 0 { ">" } else { " " };
        println!("{marker} {index:2} {}", describe_band(band));
    }
    println!("timer {}", session.store.timer().format());
}

async fn run_command(session: &mut JamSession, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Import { path, members } => {
            let mut users = parse_members(&members);
            if members.is_empty() {
                let data = match path {
                    Some(path) => FileClient::new(path).fetch(),
                    None => SampleClient.fetch(),
                }
                .map_err(|error| anyhow::anyhow!("failed to read roster: {error}"))?;
                users.extend(jam_players::deserialize(&data)?);
            }
            let count = session.roster.import(users);
            println!("registered {count} musicians");
        }
        Command::Toggle { username } => {
            let Some(id) = session.roster.find_by_username(&username).map(|x| x.id) else {
                bail!("no musician named {username}");
            };
            let status = session.roster.toggle_status(id)?;
            println!("{username} is now {status:?}");
        }
        Command::Remove { username } => {
            let Some(id) = session.roster.find_by_username(&username).map(|x| x.id) else {
                bail!("no musician named {username}");
            };
            let user = session.roster.remove(id)?;
            println!("removed {}", user.name);
        }
        Command::Generate { count, size, seed } => {
            let mut random = random_source(seed);
            for _ in 0..count {
                if session.is_queue_large() {
                    tracing::warn!(
                        "the queue already holds {} bands",
                        session.store.queue().len()
                    );
                }
                let users = session.roster.users().to_vec();
                let id = session.store.generate_band(&users, size, &mut random)?;
                if let Some(band) = session.store.queue().get(id) {
                    println!("{}", describe_band(band));
                }
            }
        }
        Command::Manual { seed } => {
            let mut random = random_source(seed);
            let id = session.store.add_manual_band(&mut random);
            if let Some(band) = session.store.queue().get(id) {
                println!("{}", describe_band(band));
            }
        }
        Command::Join {
            index,
            username,
            role,
        } => {
            let Some(band_id) = session.store.queue().iter().nth(index).map(|x| x.id) else {
                bail!("no band at position {index}");
            };
            let Some(user) = session.roster.find_by_username(&username).cloned() else {
                bail!("no musician named {username}");
            };
            let Some(role) = jam_rs::Instrument::from_label(&role) else {
                bail!("unknown instrument {role}");
            };
            if !session.store.add_member(band_id, &user, role)? {
                println!("{} is already in the band", user.name);
            }
        }
        Command::Advance { games } => {
            for game in &games {
                let title = find_game(game).map_or(game.as_str(), |x| x.title);
                session.store.record_game(title);
            }
            match session.store.complete_current_band() {
                Some(_) => print_queue(session),
                None => println!("(no band on stage)"),
            }
        }
        Command::Move { from, to } => session.store.move_band(from, to)?,
        Command::Drop { index } => {
            let band = session.store.remove_band(index)?;
            println!("dropped {}", band.name);
        }
        Command::Duration { index, minutes } => {
            let Some(band_id) = session.store.queue().iter().nth(index).map(|x| x.id) else {
                bail!("no band at position {index}");
            };
            session.store.set_duration(band_id, minutes)?;
        }
        Command::Restore => {
            if !session.restore_backup() {
                bail!("no backup to restore, or the session is not empty");
            }
            println!("restored {} musicians", session.roster.len());
        }
        Command::Show { instruments } => {
            let mut filter = Vec::with_capacity(instruments.len());
            for label in &instruments {
                let Some(instrument) = jam_rs::Instrument::from_label(label) else {
                    bail!("unknown instrument {label}");
                };
                filter.push(instrument);
            }

            print_queue(session);
            for line in describe_roster(session.roster.users(), &filter) {
                println!("{line}");
            }
        }
        Command::Stats => {
            let stats = SessionStats::from_bands(session.store.history());
            println!("{} bands played", stats.band_count());
            for (id, user_stats) in stats.top_users(5) {
                let name = session.roster.get(id).map_or("?", |x| x.name.as_str());
                println!(
                    "{name}: {} bands, {} min",
                    user_stats.appearances, user_stats.minutes_played
                );
            }
            if let Some(id) = stats.most_minutes() {
                let name = session.roster.get(id).map_or("?", |x| x.name.as_str());
                println!("longest on stage: {name}");
            }
            for (instrument, count) in stats.instrument_totals() {
                println!("{instrument}: {count}");
            }
        }
        Command::Games => {
            for game in GAMES.iter() {
                println!("{} {}: {}", game.id, game.title, game.description);
            }
        }
        Command::Run { time } => {
            if let Some(time) = time {
                session.set_timer_input(&time)?;
            }
            let outcome = tokio::select! {
                outcome = session.run_countdown(Duration::from_secs(1)) => outcome,
                _ = tokio::signal::ctrl_c() => TickOutcome::Idle,
            };
            session.store.pause_timer();
            if outcome == TickOutcome::Expired {
                println!("time is up, run `advance` for the next band");
            }
            session.backup();
        }
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    if args.command.is_mutating() && !config.check_pin(args.pin.as_deref().unwrap_or_default()) {
        bail!("a valid organizer PIN is required (--pin or JAM_ADMIN_PIN)");
    }

    let is_mutating = args.command.is_mutating();
    let mut session = JamSession::open(&args.state, config)?;
    run_command(&mut session, args.command).await?;
    if is_mutating {
        session.save();
    }
    Ok(())
}

// ex. jam_scheduler --pin admin123 import --member alice/DRUMS --member bruno/BASS
//     jam_scheduler --pin admin123 generate --count 3
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    run().await
}
