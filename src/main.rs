//! Terminal front end: voters identify themselves and cast a ballot, the
//! administrator views the results.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, LevelFilter};
use thiserror::Error;

use ballot_box::{
    api::{voting::VoteError, AdminGate, Rejected, TallyEngine},
    logging,
    model::{
        candidate::CandidateList,
        db::{BallotLedger, CandidateRegistry, IdentityStore, Stores},
        tally::TallyResult,
        voter::VoterClaim,
    },
    Config,
};

const PROGRAM_NAME: &str = "ballot-box";

const ABOUT_TEXT: &str = "Electronic ballot box for a single polling station.

EXIT CODES:
     0: Success.
   255: Refused (identity not verified, already voted, or wrong admin secret).
 Other: Error.";

const CONFIG: &str = "CONFIG";
const QUIET: &str = "QUIET";
const VERBOSE: &str = "VERBOSE";
const JSON: &str = "JSON";

const VOTE: &str = "vote";
const CANDIDATES: &str = "candidates";
const RESULTS: &str = "results";

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_REFUSED: u8 = 255;

/// How many times a voter may get their details wrong before the session ends.
const MAX_IDENTITY_ATTEMPTS: usize = 3;

/// Widest bar in the results chart.
const CHART_WIDTH: u64 = 40;

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .arg(
            Arg::new(CONFIG)
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Config file to read instead of Ballot.toml")
                .action(ArgAction::Set)
                .global(true),
        )
        .arg(
            Arg::new(QUIET)
                .long("quiet")
                .short('q')
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new(VERBOSE)
                .long("verbose")
                .short('v')
                .help("Log debugging detail")
                .action(ArgAction::SetTrue)
                .conflicts_with(QUIET)
                .global(true),
        )
        .subcommand(Command::new(VOTE).about("Identify a voter and record their ballot"))
        .subcommand(Command::new(CANDIDATES).about("List the candidates in ballot order"))
        .subcommand(
            Command::new(RESULTS)
                .about("Show the tally; asks for the admin secret")
                .arg(
                    Arg::new(JSON)
                        .long("json")
                        .help("Print the tally as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Core(#[from] ballot_box::Error),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Input closed before the session finished")]
    InputClosed,
}

/// Prompts on one stream and reads answers from another.
struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, label: &str) -> Result<String, Error> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::InputClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn say(&mut self, message: impl Display) -> Result<(), Error> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }
}

/// The settings in use, from `--config` or the default file.
fn load_config(args: &ArgMatches) -> Result<Config, Error> {
    let path = args.get_one::<String>(CONFIG).map(Path::new);
    Ok(Config::load(path)?)
}

/// Map a voter's answer to a candidate id: a 1-based menu number or the id
/// itself. An empty answer stays empty. `None` if it matches nothing.
fn resolve_choice(candidates: &CandidateList, answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(String::new());
    }
    if let Ok(number) = answer.parse::<usize>() {
        if let Some(candidate) = number.checked_sub(1).and_then(|i| candidates.iter().nth(i)) {
            return Some(candidate.id.clone());
        }
    }
    candidates.get(answer).map(|c| c.id.clone())
}

fn show_ballot<R: BufRead, W: Write>(
    candidates: &CandidateList,
    term: &mut Terminal<R, W>,
) -> Result<(), Error> {
    term.say("Choose a candidate:")?;
    for (i, candidate) in candidates.iter().enumerate() {
        let label = candidate.ballot_label().replace('\n', "\n      ");
        term.say(format!("  [{}] {label}", i + 1))?;
    }
    Ok(())
}

/// Run one voter through identification and ballot selection.
fn vote<I, C, L, R, W>(stores: &mut Stores<I, C, L>, term: &mut Terminal<R, W>) -> Result<u8, Error>
where
    I: IdentityStore,
    C: CandidateRegistry,
    L: BallotLedger,
    R: BufRead,
    W: Write,
{
    let mut session = stores.session();
    let mut attempts = 0;
    let verified = loop {
        attempts += 1;
        let claim = VoterClaim::new(
            term.prompt("Voter ID")?.trim(),
            term.prompt("Last name")?.trim(),
            term.prompt("First name")?.trim(),
            term.prompt("National ID")?.trim(),
        );
        match session.submit(&claim) {
            Ok(verified) => break verified,
            Err(Rejected {
                error: VoteError::AlreadyVoted { .. },
                ..
            }) => {
                term.say("You have already voted.")?;
                return Ok(EXIT_REFUSED);
            }
            Err(Rejected {
                error: VoteError::InvalidIdentity,
                retry: Some(retry),
            }) => {
                term.say("Incorrect details.")?;
                if attempts >= MAX_IDENTITY_ATTEMPTS {
                    term.say("Too many failed attempts.")?;
                    return Ok(EXIT_REFUSED);
                }
                session = retry;
            }
            Err(rejected) => return Err(rejected.error.into()),
        }
    };

    let mut ballot = verified.present_candidates().map_err(|r| r.error)?;
    show_ballot(ballot.candidates(), term)?;
    loop {
        let answer = term.prompt("Your choice")?;
        let Some(candidate_id) = resolve_choice(ballot.candidates(), &answer) else {
            term.say("No such candidate.")?;
            continue;
        };
        match ballot.select(&candidate_id) {
            Ok(_) => {
                term.say("Your vote has been recorded.")?;
                return Ok(EXIT_OK);
            }
            Err(Rejected {
                error: VoteError::NoSelection,
                retry: Some(retry),
            }) => {
                term.say("Please select a candidate.")?;
                ballot = retry;
            }
            Err(rejected) => return Err(rejected.error.into()),
        }
    }
}

fn list_candidates<C, R, W>(registry: &C, term: &mut Terminal<R, W>) -> Result<u8, Error>
where
    C: CandidateRegistry,
    R: BufRead,
    W: Write,
{
    for candidate in registry.list_candidates()?.iter() {
        term.say(format!(
            "{}: {} - {}",
            candidate.id,
            candidate.display_name(),
            candidate.class_label
        ))?;
    }
    Ok(EXIT_OK)
}

/// Render the tally as a horizontal bar chart, biggest first.
fn chart_lines(tally: &TallyResult) -> Vec<String> {
    if tally.is_empty() {
        return vec!["No votes recorded.".to_string()];
    }
    let rows = tally.ranked();
    let label_width = rows
        .iter()
        .map(|row| row.label.to_string().chars().count())
        .max()
        .unwrap_or_default();
    let most = rows.iter().map(|row| row.votes).max().unwrap_or(1).max(1);

    let mut lines = vec![format!(
        "Results as of {}",
        tally.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];
    for row in rows {
        let bar = "#".repeat(((row.votes * CHART_WIDTH + most - 1) / most) as usize);
        lines.push(format!(
            "{:<width$} | {bar} {}",
            row.label.to_string(),
            row.votes,
            width = label_width
        ));
    }
    lines.push(format!("Total: {}", tally.total()));
    lines
}

fn show_results<C, L, R, W>(
    gate: &AdminGate,
    engine: &TallyEngine<'_, C, L>,
    json: bool,
    term: &mut Terminal<R, W>,
) -> Result<u8, Error>
where
    C: CandidateRegistry,
    L: BallotLedger,
    R: BufRead,
    W: Write,
{
    let attempt = term.prompt("Admin secret")?;
    let tally = match gate.results(&attempt, engine) {
        Ok(tally) => tally,
        Err(ballot_box::Error::Unauthorized(_)) => {
            term.say("Incorrect password.")?;
            return Ok(EXIT_REFUSED);
        }
        Err(err) => return Err(err.into()),
    };
    if json {
        let json = serde_json::to_string_pretty(&tally).map_err(ballot_box::Error::from)?;
        term.say(json)?;
    } else {
        for line in chart_lines(&tally) {
            term.say(line)?;
        }
    }
    Ok(EXIT_OK)
}

fn dispatch<R: BufRead, W: Write>(
    args: &ArgMatches,
    config: &Config,
    term: &mut Terminal<R, W>,
) -> Result<u8, Error> {
    let mut stores = config.stores();
    match args.subcommand() {
        Some((VOTE, _)) => vote(&mut stores, term),
        Some((CANDIDATES, _)) => list_candidates(&stores.candidates, term),
        Some((RESULTS, sub_args)) => {
            let gate = config.admin_gate()?;
            let engine = TallyEngine::for_stores(&stores);
            show_results(&gate, &engine, sub_args.get_flag(JSON), term)
        }
        _ => unreachable!("subcommand is required"),
    }
}

/// Run the chosen subcommand, report any error, and return the exit code.
fn run<R: BufRead, W: Write>(args: &ArgMatches, config: &Config, input: R, output: W) -> u8 {
    let mut term = Terminal::new(input, output);
    match dispatch(args, config, &mut term) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            let _ = term.say(format!("Error: {err}"));
            EXIT_ERROR
        }
    }
}

/// Global flags are propagated to the subcommand, so read them from there.
fn subcommand_args(args: &ArgMatches) -> &ArgMatches {
    args.subcommand().map(|(_, sub)| sub).unwrap_or(args)
}

fn main() {
    let args = cli().get_matches();
    let sub_args = subcommand_args(&args);

    let config = match load_config(sub_args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(EXIT_ERROR.into())
        }
    };

    // Set up logging.
    if let Err(err) = logging::init(config.log_config()) {
        eprintln!("Failed to initialise logging: {err}");
    }
    if sub_args.get_flag(QUIET) {
        logging::set_verbosity(LevelFilter::Warn);
    } else if sub_args.get_flag(VERBOSE) {
        logging::set_verbosity(LevelFilter::Debug);
    }

    let stdin = io::stdin();
    let exit_code = run(&args, &config, stdin.lock(), io::stdout());
    std::process::exit(exit_code.into())
}
