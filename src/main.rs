//! Binary entrypoint for the hunterlog CLI.
//!
//! Commands:
//! - `init` - create a starter `hunterlog.toml` and an empty record store
//! - `register` / `login` / `logout` - manage the session
//! - `status` / `profile` - show or edit the hunter profile
//! - `habit add|done|list`, `quest add|done|list`, `badges` - track progress
//! - `shop list|buy`, `army add|remove|list` - spend gold and manage friends
//! - `daily`, `reset-streaks`, `watch` - day rollover helpers
//!
//! See the library crate docs for module-level details: `hunterlog::tracker`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use hunterlog::config::Config;
use hunterlog::tracker::{
    self, AccountStore, CharacterClass, Credentials, Gender, HabitToggle, LogNotifier,
    ProfileUpdate, ProgressStore, SystemClock, TrackerStoreBuilder,
};

#[derive(Parser)]
#[command(name = "hunterlog")]
#[command(about = "Level up by keeping your habits and finishing quests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "hunterlog.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the record store
    Init,
    /// Create an account and log in
    Register {
        username: String,
        email: String,
        /// Rookie Hunter, Mage Hunter, Assassin Hunter or Shadow Monarch
        #[arg(long, default_value = "Rookie Hunter")]
        class: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in with email and password
    Login {
        /// Email (defaults to the remembered one)
        email: Option<String>,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Remember this email for next time
        #[arg(long)]
        remember: bool,
    },
    /// End the current session
    Logout,
    /// Show level, rank, XP and gold
    Status,
    /// Update profile fields
    Profile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Profile image reference
        #[arg(long)]
        image: Option<String>,
        /// male, female or other
        #[arg(long)]
        gender: Option<String>,
    },
    /// Manage habits
    #[command(subcommand)]
    Habit(HabitCommand),
    /// Manage quests
    #[command(subcommand)]
    Quest(QuestCommand),
    /// List earned badges
    Badges,
    /// Spend gold in the hunter store
    #[command(subcommand)]
    Shop(ShopCommand),
    /// Manage your shadow army of friends
    #[command(subcommand)]
    Army(ArmyCommand),
    /// Start today's daily quest
    Daily,
    /// Break streaks whose habit was missed yesterday
    ResetStreaks,
    /// Stay running and reset streaks at every local midnight
    Watch,
}

#[derive(Subcommand)]
enum HabitCommand {
    Add {
        name: String,
        #[arg(long, default_value = "target")]
        icon: String,
        #[arg(long, default_value_t = 30)]
        xp: u32,
    },
    /// Toggle completion for today, or for --date YYYY-MM-DD
    Done {
        id: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    List,
}

#[derive(Subcommand)]
enum QuestCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 100)]
        xp: u32,
    },
    Done {
        id: u64,
    },
    List,
}

#[derive(Subcommand)]
enum ShopCommand {
    List,
    Buy { item: String },
}

#[derive(Subcommand)]
enum ArmyCommand {
    Add { name: String, email: String },
    Remove { id: u64 },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        let config = Config::load(&cli.config).await?;
        tokio::fs::create_dir_all(&config.storage.data_dir).await?;
        TrackerStoreBuilder::new(config.db_path())
            .open()
            .map_err(|e| anyhow!("Failed to create record store: {}", e))?;
        println!("Initialized record store at {}", config.db_path().display());
        return Ok(());
    }

    let loaded = Config::load(&cli.config).await.ok();
    init_logging(&loaded, cli.verbose);
    let config = loaded.unwrap_or_default();
    let mut accounts = open_accounts(&config)?;

    match cli.command {
        Commands::Init => {}
        Commands::Register {
            username,
            email,
            class,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => {
                    let first = rpassword::prompt_password("Password: ")?;
                    let second = rpassword::prompt_password("Confirm password: ")?;
                    if first != second {
                        return Err(anyhow!("passwords do not match"));
                    }
                    first
                }
            };
            let class = CharacterClass::parse(&class);
            let account = accounts.register(&username, &email, &password, class)?;
            println!(
                "Welcome, {} the {}. Gold: {}",
                account.username, account.character_class, account.gold
            );
        }
        Commands::Login {
            email,
            password,
            remember,
        } => {
            let email = match email {
                Some(e) => e,
                None => accounts
                    .remembered_email()?
                    .ok_or_else(|| anyhow!("no email given and none remembered"))?,
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            let account = accounts.authenticate(&email, &password)?;
            if remember {
                accounts.remember_email(&account.email)?;
            } else {
                accounts.forget_email()?;
            }
            ProgressStore::load(&accounts)?;
            println!("Logged in as {}", account.username);
        }
        Commands::Logout => accounts.logout()?,
        Commands::Status => {
            require_session(&accounts)?;
            let progress = ProgressStore::load(&accounts)?;
            print_status(&accounts, &progress)?;
        }
        Commands::Profile {
            username,
            email,
            image,
            gender,
        } => {
            let current = require_session(&accounts)?.clone();
            let gender = match gender {
                Some(g) => Some(
                    Gender::parse(&g).ok_or_else(|| anyhow!("unknown gender: {}", g))?,
                ),
                None => None,
            };
            accounts.update_profile(ProfileUpdate {
                username: username.unwrap_or(current.username),
                email: email.unwrap_or(current.email),
                profile_image: image,
                gender,
            })?;
        }
        Commands::Habit(cmd) => {
            require_session(&accounts)?;
            let mut progress = ProgressStore::load(&accounts)?;
            match cmd {
                HabitCommand::Add { name, icon, xp } => {
                    if let Some(habit) = progress.add_habit(&accounts, &name, &icon, xp)? {
                        println!("#{} {} ({} XP)", habit.id, habit.name, habit.xp_reward);
                    }
                }
                HabitCommand::Done { id, date } => {
                    let day = date.unwrap_or_else(|| accounts.clock().today());
                    match progress.complete_habit(&mut accounts, id, day)? {
                        Some(HabitToggle::Completed {
                            streak,
                            xp_awarded,
                            gold_awarded,
                            ..
                        }) => println!(
                            "Done for {}: +{} XP, +{} gold, streak {}",
                            day, xp_awarded, gold_awarded, streak
                        ),
                        Some(HabitToggle::Uncompleted { streak }) => {
                            println!("Unmarked {}; streak {}", day, streak)
                        }
                        None => {}
                    }
                }
                HabitCommand::List => {
                    let today = accounts.clock().today();
                    for habit in progress.habits() {
                        let mark = if habit.is_completed_on(today) { "x" } else { " " };
                        println!(
                            "[{}] #{} {} ({}) {} XP, streak {}",
                            mark, habit.id, habit.name, habit.icon, habit.xp_reward, habit.streak
                        );
                    }
                }
            }
        }
        Commands::Quest(cmd) => {
            require_session(&accounts)?;
            let mut progress = ProgressStore::load(&accounts)?;
            match cmd {
                QuestCommand::Add {
                    name,
                    description,
                    xp,
                } => {
                    let description = if description.trim().is_empty() {
                        name.clone()
                    } else {
                        description
                    };
                    if let Some(quest) = progress.add_quest(&accounts, &name, &description, xp)? {
                        println!("#{} {} ({} XP)", quest.id, quest.name, quest.xp_reward);
                    }
                }
                QuestCommand::Done { id } => {
                    match progress.complete_quest(&mut accounts, id)? {
                        Some(done) => println!(
                            "Quest complete: +{} XP, +{} gold, badge \"{}\"",
                            done.xp_awarded, done.gold_awarded, done.badge.name
                        ),
                        None => println!("Quest #{} is not open", id),
                    }
                }
                QuestCommand::List => {
                    for quest in progress.quests() {
                        let mark = if quest.completed { "x" } else { " " };
                        println!(
                            "[{}] #{} {} ({} XP) - {}",
                            mark, quest.id, quest.name, quest.xp_reward, quest.description
                        );
                    }
                }
            }
        }
        Commands::Badges => {
            require_session(&accounts)?;
            let progress = ProgressStore::load(&accounts)?;
            if progress.badges().is_empty() {
                println!("No badges yet.");
            }
            for badge in progress.badges() {
                println!(
                    "{} [{}] {} - {}",
                    badge.earned_at.format("%Y-%m-%d"),
                    tracker::badges::kind_label(&badge.kind),
                    badge.name,
                    badge.description
                );
            }
        }
        Commands::Shop(cmd) => match cmd {
            ShopCommand::List => {
                for item in tracker::CATALOG.iter() {
                    println!(
                        "{} {:<20} {:>5} gold  {}",
                        item.id, item.name, item.price, item.description
                    );
                }
            }
            ShopCommand::Buy { item } => {
                require_session(&accounts)?;
                if let Some(purchase) = tracker::purchase(&mut accounts, &item)? {
                    println!("Gold remaining: {}", purchase.remaining_gold);
                }
            }
        },
        Commands::Army(cmd) => {
            require_session(&accounts)?;
            match cmd {
                ArmyCommand::Add { name, email } => {
                    tracker::add_friend(&mut accounts, &name, &email)?;
                }
                ArmyCommand::Remove { id } => {
                    if tracker::remove_friend(&mut accounts, id)?.is_none() {
                        println!("No friend #{}", id);
                    }
                }
                ArmyCommand::List => {
                    for friend in tracker::list_friends(&accounts)? {
                        println!(
                            "#{} {} <{}> Lv.{} {} STR {} INT {} DEX {} {}",
                            friend.id,
                            friend.name,
                            friend.email,
                            friend.level,
                            friend.character_class,
                            friend.strength,
                            friend.intelligence,
                            friend.dexterity,
                            if friend.online { "online" } else { "offline" }
                        );
                    }
                }
            }
        }
        Commands::Daily => {
            require_session(&accounts)?;
            let progress = ProgressStore::load(&accounts)?;
            if !progress.start_daily_quest(&accounts)? {
                println!("Today's daily quest is already underway.");
            }
        }
        Commands::ResetStreaks => {
            require_session(&accounts)?;
            let mut progress = ProgressStore::load(&accounts)?;
            let reset = progress.reset_streak_if_needed(&accounts)?;
            println!("{} streak(s) reset", reset.len());
        }
        Commands::Watch => {
            require_session(&accounts)?;
            if !config.tracker.daily_reset {
                println!("Daily reset is disabled in {}", cli.config);
                return Ok(());
            }
            // Session-start check, then release the store until each rollover.
            ProgressStore::load(&accounts)?;
            drop(accounts);
            info!("Watching for day rollover; press Ctrl-C to stop");
            let report = tracker::scheduler::run_until_ctrl_c(|| open_accounts(&config)).await?;
            println!(
                "Processed {} rollover(s), {} streak(s) reset",
                report.rollovers,
                report.reset_habits.len()
            );
        }
    }

    Ok(())
}

fn open_accounts(config: &Config) -> Result<AccountStore> {
    let store = TrackerStoreBuilder::new(config.db_path())
        .open()
        .map_err(|e| anyhow!("Failed to open record store {}: {}", config.db_path().display(), e))?;
    let accounts = AccountStore::open(
        Arc::new(store),
        Arc::new(LogNotifier::new(true)),
        Arc::new(SystemClock),
        Credentials::new(config.argon2_params()),
    )?;
    Ok(accounts)
}

fn require_session(accounts: &AccountStore) -> Result<&tracker::Account> {
    accounts
        .current()
        .ok_or_else(|| anyhow!("Not logged in. Run `hunterlog login` first."))
}

fn print_status(accounts: &AccountStore, progress: &ProgressStore) -> Result<()> {
    let account = require_session(accounts)?;
    let stats = &account.stats;
    println!("{} ({})", account.username, account.character_class);
    println!(
        "Level {} {}  XP {}/{}  Gold {}",
        stats.level, stats.rank, stats.current_xp, stats.max_xp, account.gold
    );
    println!(
        "STR {}  INT {}  DEX {}",
        stats.strength, stats.intelligence, stats.dexterity
    );
    let today = accounts.clock().today();
    let done = progress
        .habits()
        .iter()
        .filter(|h| h.is_completed_on(today))
        .count();
    println!(
        "Habits done today: {}/{}  Open quests: {}  Badges: {}",
        done,
        progress.habits().len(),
        progress.quests().iter().filter(|q| !q.completed).count(),
        progress.badges().len()
    );
    if progress.daily_quest_started_today(accounts)? {
        println!("Daily quest: in progress");
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });
    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Only echo to the console when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty && record.target() != "notify" {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
