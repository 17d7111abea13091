//! `giftring` command-line front end.
//!
//! Every command prints the response envelope as JSON on stdout and exits
//! with a code from `exit_codes`.

mod exit_codes;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use giftring_api::{
    parse_draw_strategy, ApiConfig, ApiResponse, GiftringApi, GREEDY_ATTEMPTS_ENV,
};
use giftring_core::{default_log_level, init_logging, AssignmentStrategy};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "giftring", version, about = "Gift-exchange groups and draws")]
struct Cli {
    /// SQLite database file (overrides GIFTRING_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Draw strategy: cycle|greedy (overrides GIFTRING_DRAW_STRATEGY).
    #[arg(long, global = true)]
    strategy: Option<String>,
    /// Retry bound for the greedy strategy.
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, global = true, env = "GIFTRING_LOG_DIR")]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage groups.
    #[command(subcommand)]
    Group(GroupCommand),
    /// Manage participants of a group.
    #[command(subcommand)]
    Participant(ParticipantCommand),
    /// Draw recipients for every participant of a group.
    Draw { group_id: String },
    /// Show the recipient drawn by one participant.
    Recipient {
        group_id: String,
        participant_id: String,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// List groups (participants omitted).
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one group with its participants.
    Show { group_id: String },
    Update {
        group_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a group together with its participants.
    Delete { group_id: String },
}

#[derive(Subcommand)]
enum ParticipantCommand {
    Add {
        group_id: String,
        #[command(flatten)]
        fields: ParticipantFields,
    },
    Update {
        group_id: String,
        participant_id: String,
        #[command(flatten)]
        fields: ParticipantUpdateFields,
    },
    Remove {
        group_id: String,
        participant_id: String,
    },
}

#[derive(Args)]
struct ParticipantFields {
    #[arg(long)]
    name: String,
    /// Wish note shown to whoever draws this participant.
    #[arg(long, default_value = "")]
    wish: String,
}

#[derive(Args)]
struct ParticipantUpdateFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    wish: Option<String>,
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(|err| anyhow!(err))?;
    }

    let config = resolve_config(&cli, |key| std::env::var(key).ok())?;
    let api = GiftringApi::open(&config)
        .with_context(|| format!("open database `{}`", config.db_path.display()))?;

    let code = match cli.command {
        Command::Group(command) => run_group(&api, command)?,
        Command::Participant(command) => run_participant(&api, command)?,
        Command::Draw { group_id } => print(api.run_draw(&group_id))?,
        Command::Recipient {
            group_id,
            participant_id,
        } => print(api.get_recipient(&group_id, &participant_id))?,
    };
    Ok(code)
}

fn resolve_config(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Result<ApiConfig> {
    let mut config = ApiConfig::from_lookup(&lookup).map_err(|err| anyhow!(err))?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(name) = cli.strategy.as_deref() {
        let attempts = cli
            .max_attempts
            .map(|attempts| attempts.to_string())
            .or_else(|| lookup(GREEDY_ATTEMPTS_ENV).filter(|raw| !raw.trim().is_empty()));
        config.strategy =
            parse_draw_strategy(name, attempts.as_deref()).map_err(|err| anyhow!(err))?;
    } else if let (Some(max_attempts), AssignmentStrategy::GreedyWithRetry { .. }) =
        (cli.max_attempts, config.strategy)
    {
        config.strategy = AssignmentStrategy::GreedyWithRetry { max_attempts };
    }
    Ok(config)
}

fn run_group(api: &GiftringApi, command: GroupCommand) -> Result<i32> {
    match command {
        GroupCommand::List => print(api.list_groups()),
        GroupCommand::Create { name, description } => {
            print(api.create_group(&name, description.as_deref()))
        }
        GroupCommand::Show { group_id } => print(api.get_group(&group_id)),
        GroupCommand::Update {
            group_id,
            name,
            description,
        } => print(api.update_group(&group_id, name.as_deref(), description.as_deref())),
        GroupCommand::Delete { group_id } => print(api.delete_group(&group_id)),
    }
}

fn run_participant(api: &GiftringApi, command: ParticipantCommand) -> Result<i32> {
    match command {
        ParticipantCommand::Add { group_id, fields } => {
            print(api.add_participant(&group_id, &fields.name, &fields.wish))
        }
        ParticipantCommand::Update {
            group_id,
            participant_id,
            fields,
        } => print(api.update_participant(
            &group_id,
            &participant_id,
            fields.name.as_deref(),
            fields.wish.as_deref(),
        )),
        ParticipantCommand::Remove {
            group_id,
            participant_id,
        } => print(api.remove_participant(&group_id, &participant_id)),
    }
}

fn print<T: Serialize>(response: ApiResponse<T>) -> Result<i32> {
    let rendered = serde_json::to_string_pretty(&response).context("serialize response")?;
    println!("{rendered}");
    Ok(exit_codes::for_status(response.status))
}

#[cfg(test)]
mod tests {
    use super::{resolve_config, Cli};
    use clap::{CommandFactory, Parser};
    use giftring_api::{DRAW_STRATEGY_ENV, GREEDY_ATTEMPTS_ENV};
    use giftring_core::AssignmentStrategy;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn strategy_flags_override_config() {
        let cli = parse(&[
            "giftring",
            "--db",
            "/tmp/flags.sqlite3",
            "--strategy",
            "greedy",
            "--max-attempts",
            "9",
            "draw",
            "some-group",
        ]);
        let config = resolve_config(&cli, env(&[(GREEDY_ATTEMPTS_ENV, "20")])).unwrap();
        assert_eq!(config.db_path.to_str(), Some("/tmp/flags.sqlite3"));
        assert_eq!(
            config.strategy,
            AssignmentStrategy::GreedyWithRetry { max_attempts: 9 }
        );
    }

    #[test]
    fn greedy_flag_without_bound_uses_environment_bound() {
        let cli = parse(&["giftring", "--strategy", "greedy", "group", "list"]);

        let config = resolve_config(&cli, env(&[(GREEDY_ATTEMPTS_ENV, "12")])).unwrap();
        assert_eq!(
            config.strategy,
            AssignmentStrategy::GreedyWithRetry { max_attempts: 12 }
        );

        let config = resolve_config(&cli, env(&[])).unwrap();
        assert_eq!(config.strategy, AssignmentStrategy::greedy());

        assert!(resolve_config(&cli, env(&[(GREEDY_ATTEMPTS_ENV, "lots")])).is_err());
    }

    #[test]
    fn bound_flag_adjusts_greedy_strategy_from_environment() {
        let cli = parse(&["giftring", "--max-attempts", "5", "group", "list"]);

        let config = resolve_config(&cli, env(&[(DRAW_STRATEGY_ENV, "greedy")])).unwrap();
        assert_eq!(
            config.strategy,
            AssignmentStrategy::GreedyWithRetry { max_attempts: 5 }
        );

        let config = resolve_config(&cli, env(&[])).unwrap();
        assert_eq!(config.strategy, AssignmentStrategy::RandomCycle);
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let cli = parse(&["giftring", "--strategy", "hat", "group", "list"]);
        assert!(resolve_config(&cli, env(&[])).is_err());
    }
}
