extern crate env_logger;
extern crate nano_hd_cli;
#[macro_use]
extern crate log;

#[macro_use]
extern crate clap;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use std::{env, io, path::Path};

use self::nano_hd_cli::commands::{self, BlockArgs};
use self::nano_hd_cli::config::Config;
use self::nano_hd_cli::error::Result;

fn main() {
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(global_verbose_definition())
        .arg(global_config_definition())
        .subcommand(seed_commands_definition())
        .subcommand(key_commands_definition())
        .subcommand(address_command_definition())
        .subcommand(block_command_definition())
        .get_matches();

    configure_logger(&matches);

    if let Err(err) = run(&matches) {
        error!("{}", err);
        eprintln!("error: {}", err);
        ::std::process::exit(1)
    }
}

fn run<'a>(matches: &ArgMatches<'a>) -> Result<()> {
    let cfg = Config::load(matches.value_of(CONFIG_ARG).map(Path::new))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        (SEED_COMMAND, Some(matches)) => subcommand_seed(&mut out, matches),
        (KEY_COMMAND, Some(matches)) => subcommand_key(&mut out, &cfg, matches),
        (ADDRESS_COMMAND, Some(matches)) => {
            commands::address(&mut out, &cfg, required(matches, PUBLIC_KEY_ARG))
        }
        (BLOCK_COMMAND, Some(matches)) => {
            let args = BlockArgs {
                seed: required(matches, SEED_ARG),
                path: matches.value_of(PATH_ARG),
                kind: required(matches, KIND_ARG),
                amount: required(matches, AMOUNT_ARG),
                balance: matches.value_of(BALANCE_ARG),
                previous: matches.value_of(PREVIOUS_ARG),
                representative: matches.value_of(REPRESENTATIVE_ARG),
                link: required(matches, LINK_ARG),
                work: matches.value_of(WORK_ARG),
            };
            commands::block(&mut out, &cfg, &args)
        }
        _ => {
            // SubcommandRequiredElseHelp prints the usage before we get here
            unreachable!()
        }
    }
}

/// value of an argument declared `required(true)`, clap already checked it is present
fn required<'a>(matches: &'a ArgMatches<'a>, name: &str) -> &'a str {
    match matches.value_of(name) {
        Some(v) => v,
        None => unreachable!(),
    }
}

/* ------------------------------------------------------------------------- *
 *            Global options and helpers                                     *
 * ------------------------------------------------------------------------- */

const VERBOSE_ARG: &str = "VERBOSE";
const CONFIG_ARG: &str = "CONFIG";

fn global_verbose_definition<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(VERBOSE_ARG)
        .short("v")
        .long("verbose")
        .multiple(true)
        .global(true)
        .help("more logs on the standard error, repeat for even more (RUST_LOG takes precedence)")
}
fn configure_logger<'a>(matches: &ArgMatches<'a>) {
    let level = match matches.occurrences_of(VERBOSE_ARG) {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse(&filters);
    }
    builder.init();
}

fn global_config_definition<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(CONFIG_ARG)
        .short("c")
        .long("config")
        .value_name("FILE")
        .takes_value(true)
        .global(true)
        .help("configuration file, defaults to NANO_HD_CONFIG or <data dir>/nano-hd/config.yml")
}

/* ------------------------------------------------------------------------- *
 *            Shared arguments                                               *
 * ------------------------------------------------------------------------- */

const SEED_ARG: &str = "SEED";
const PATH_ARG: &str = "PATH";
const PUBLIC_KEY_ARG: &str = "PUBLIC_KEY";
const CHAIN_CODE_ARG: &str = "CHAIN_CODE";
const INDEX_ARG: &str = "INDEX";

fn seed_argument_definition<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(SEED_ARG)
        .long("seed")
        .value_name("HEX")
        .takes_value(true)
        .required(true)
        .help("the 32 bytes master secret, in hexadecimal")
}
fn path_argument_definition<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(PATH_ARG)
        .long("path")
        .value_name("PATH")
        .takes_value(true)
        .help("derivation path like 44'/165'/0, defaults to the configured one")
}
fn public_key_argument_definition<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name(PUBLIC_KEY_ARG)
        .long("public-key")
        .value_name("HEX")
        .takes_value(true)
        .required(true)
        .help("the 32 bytes public key, in hexadecimal")
}

/* ------------------------------------------------------------------------- *
 *            Seed Sub Commands                                              *
 * ------------------------------------------------------------------------- */

const SEED_COMMAND: &str = "seed";

fn seed_commands_definition<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name(SEED_COMMAND)
        .about("master secret operations")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("generate")
                .about("generate a random master secret that has a root key"),
        )
}
fn subcommand_seed<'a, W: io::Write>(out: &mut W, matches: &ArgMatches<'a>) -> Result<()> {
    match matches.subcommand() {
        ("generate", _) => commands::seed_generate(out),
        _ => unreachable!(),
    }
}

/* ------------------------------------------------------------------------- *
 *            Key Sub Commands                                               *
 * ------------------------------------------------------------------------- */

const KEY_COMMAND: &str = "key";

fn key_commands_definition<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name(KEY_COMMAND)
        .about("key derivation")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("derive")
                .about("derive the private key, public key and address at the given path")
                .arg(seed_argument_definition())
                .arg(path_argument_definition()),
        )
        .subcommand(
            SubCommand::with_name("public")
                .about("derive a non-hardened public child, without any private key")
                .arg(public_key_argument_definition())
                .arg(
                    Arg::with_name(CHAIN_CODE_ARG)
                        .long("chain-code")
                        .value_name("HEX")
                        .takes_value(true)
                        .required(true)
                        .help("the 32 bytes chain code of the parent, in hexadecimal"),
                )
                .arg(
                    Arg::with_name(INDEX_ARG)
                        .long("index")
                        .value_name("INDEX")
                        .takes_value(true)
                        .required(true)
                        .help("index of the child, below 2^31"),
                ),
        )
}
fn subcommand_key<'a, W: io::Write>(out: &mut W, cfg: &Config, matches: &ArgMatches<'a>) -> Result<()> {
    match matches.subcommand() {
        ("derive", Some(matches)) => {
            commands::key_derive(out, cfg, required(matches, SEED_ARG), matches.value_of(PATH_ARG))
        }
        ("public", Some(matches)) => commands::key_public(
            out,
            cfg,
            required(matches, PUBLIC_KEY_ARG),
            required(matches, CHAIN_CODE_ARG),
            required(matches, INDEX_ARG),
        ),
        _ => unreachable!(),
    }
}

/* ------------------------------------------------------------------------- *
 *            Address Sub Command                                            *
 * ------------------------------------------------------------------------- */

const ADDRESS_COMMAND: &str = "address";

fn address_command_definition<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name(ADDRESS_COMMAND)
        .about("Nano address of a public key, with the configured prefix")
        .arg(public_key_argument_definition())
}

/* ------------------------------------------------------------------------- *
 *            Block Sub Command                                              *
 * ------------------------------------------------------------------------- */

const BLOCK_COMMAND: &str = "block";
const KIND_ARG: &str = "KIND";
const AMOUNT_ARG: &str = "AMOUNT";
const BALANCE_ARG: &str = "BALANCE";
const PREVIOUS_ARG: &str = "PREVIOUS";
const REPRESENTATIVE_ARG: &str = "REPRESENTATIVE";
const LINK_ARG: &str = "LINK";
const WORK_ARG: &str = "WORK";

fn block_command_definition<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name(BLOCK_COMMAND)
        .about("sign a state block with the key at the given path, printed as node RPC JSON")
        .arg(seed_argument_definition())
        .arg(path_argument_definition())
        .arg(
            Arg::with_name(KIND_ARG)
                .long("kind")
                .takes_value(true)
                .required(true)
                .possible_values(&["open", "send", "receive"])
                .help("what the block does to the balance"),
        )
        .arg(
            Arg::with_name(AMOUNT_ARG)
                .long("amount")
                .value_name("NANO")
                .takes_value(true)
                .required(true)
                .help("amount opened with, sent or received, in Nano"),
        )
        .arg(
            Arg::with_name(BALANCE_ARG)
                .long("balance")
                .value_name("NANO")
                .takes_value(true)
                .help("balance of the account before this block, in Nano (default 0)"),
        )
        .arg(
            Arg::with_name(PREVIOUS_ARG)
                .long("previous")
                .value_name("HASH")
                .takes_value(true)
                .help("hash of the previous block of the account, required to send or receive"),
        )
        .arg(
            Arg::with_name(REPRESENTATIVE_ARG)
                .long("representative")
                .value_name("ADDRESS")
                .takes_value(true)
                .help("representative of the account, defaults to the configured one"),
        )
        .arg(
            Arg::with_name(LINK_ARG)
                .long("link")
                .value_name("LINK")
                .takes_value(true)
                .required(true)
                .help("hash of the pending send block (open, receive) or destination address (send)"),
        )
        .arg(
            Arg::with_name(WORK_ARG)
                .long("work")
                .value_name("HEX")
                .takes_value(true)
                .help("proof of work of the block, 16 hexadecimal characters"),
        )
}
