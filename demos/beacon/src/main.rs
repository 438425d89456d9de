//! Simulate group formation, admission, and selection for a random beacon.
//!
//! Stakers with random stake compete for seats in each forming group by submitting their lowest
//! tickets. Once a round has enough tickets, the group is admitted into the pool kept by an
//! [Engine]. The simulated chain then advances while random seeds select groups, retiring expired
//! groups oldest first (never below the configured floor).
//!
//! # Usage
//!
//! ```sh
//! cargo run --release --bin commonware-beacon -- --stakers 30 --groups 8 --rounds 40
//! ```

use bytes::Bytes;
use clap::{value_parser, Arg, Command};
use commonware_runtime::{deterministic, Metrics, Runner};
use commonware_sortition::{
    engine::{self, Engine, Mailbox},
    formation::{Formation, Phase},
    mocks, ticket, Config, Ledger, U256,
};
use rand::Rng;
use tracing::{info, warn};

/// Stakers to simulate when not provided.
const DEFAULT_STAKERS: u64 = 30;

fn main() {
    // Parse arguments
    let matches = Command::new("commonware-beacon")
        .about("form groups from stake-weighted tickets and select them for beacon requests")
        .arg(
            Arg::new("stakers")
                .long("stakers")
                .required(false)
                .value_parser(value_parser!(u64))
                .help("Number of stakers competing for seats"),
        )
        .arg(
            Arg::new("groups")
                .long("groups")
                .required(false)
                .default_value("8")
                .value_parser(value_parser!(u32))
                .help("Number of groups to form"),
        )
        .arg(
            Arg::new("rounds")
                .long("rounds")
                .required(false)
                .default_value("40")
                .value_parser(value_parser!(u32))
                .help("Number of selections to perform"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .required(false)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Seed of the deterministic runtime"),
        )
        .arg(
            Arg::new("expiration")
                .long("expiration")
                .required(false)
                .default_value("10")
                .value_parser(value_parser!(u64))
                .help("Blocks a group remains active"),
        )
        .arg(
            Arg::new("floor")
                .long("floor")
                .required(false)
                .default_value("2")
                .value_parser(value_parser!(u32))
                .help("Minimum number of groups kept after expiration"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .required(false)
                .num_args(0)
                .help("Log every ticket and sweep"),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag("verbose") {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Configure simulation
    let stakers = matches
        .get_one::<u64>("stakers")
        .copied()
        .unwrap_or(DEFAULT_STAKERS);
    let groups = *matches.get_one::<u32>("groups").expect("default provided");
    let rounds = *matches.get_one::<u32>("rounds").expect("default provided");
    let seed = *matches.get_one::<u64>("seed").expect("default provided");
    let protocol = Config {
        minimum_stake: 200_000,
        group_threshold: 15,
        group_size: 20,
        timeout_initial: 20,
        timeout_submission: 50,
        timeout_challenge: 60,
        group_expiration_timeout: *matches.get_one::<u64>("expiration").expect("default provided"),
        active_groups_threshold: *matches.get_one::<u32>("floor").expect("default provided"),
        max_public_key_size: 1024,
    };
    if let Err(err) = protocol.validate() {
        panic!("invalid configuration: {err}");
    }
    info!(stakers, groups, rounds, seed, "starting simulation");

    // Run simulation
    let executor = deterministic::Runner::seeded(seed);
    executor.start(|mut context| async move {
        let ledger = mocks::Ledger::new(1);
        let (engine, mut mailbox) = Engine::new(
            context.with_label("engine"),
            engine::Config {
                ledger: ledger.clone(),
                protocol: protocol.clone(),
                mailbox_size: 1024,
            },
        )
        .expect("failed to create engine");
        engine.start();

        // Assign stake (up to five virtual stakers each)
        let stakes: Vec<(U256, u64)> = (1..=stakers)
            .map(|staker| {
                let stake = context.gen_range(protocol.minimum_stake..=5 * protocol.minimum_stake);
                (U256::from(staker), stake)
            })
            .collect();

        // Form groups
        for _ in 0..groups {
            let entropy = U256::new(context.gen());
            form(&protocol, &ledger, &mut mailbox, entropy, &stakes).await;
        }

        // Serve beacon requests
        for round in 0..rounds {
            ledger.advance(context.gen_range(1..=protocol.group_expiration_timeout));
            let seed = U256::new(context.gen());
            match mailbox.select(seed).await {
                Ok(selection) => info!(
                    round,
                    group = selection.group.index(),
                    retired = selection.retired.len(),
                    height = ledger.height(),
                    "selected group"
                ),
                Err(err) => warn!(round, ?err, "selection failed"),
            }
            let remaining = mailbox
                .number_of_groups()
                .await
                .expect("engine stopped");
            info!(round, remaining, "pool size");
        }

        info!(metrics = context.encode(), "simulation complete");
    });
}

/// Runs one formation round and admits the resulting group.
async fn form(
    protocol: &Config,
    ledger: &mocks::Ledger,
    mailbox: &mut Mailbox,
    entropy: U256,
    stakes: &[(U256, u64)],
) {
    let start = ledger.height();
    let mut formation = Formation::new(protocol, entropy, start);

    // Every staker submits its most competitive tickets during the initial phase
    let mut retained = 0;
    for (staker, stake) in stakes {
        let weight = ticket::weight(*stake, protocol.minimum_stake);
        let tickets = ticket::generate(&entropy, staker, weight);
        for ticket in ticket::lowest(tickets, protocol.group_size as usize) {
            match formation.submit(*staker, weight, ticket, ledger.height()) {
                Ok(true) => retained += 1,
                Ok(false) => {}
                Err(err) => warn!(?staker, index = ticket.index, ?err, "ticket rejected"),
            }
        }
    }

    // Challenge every retained ticket
    ledger.advance(protocol.timeout_submission);
    assert_eq!(formation.phase(ledger.height()), Phase::Challenge);
    for member in formation.members() {
        let index = member.ticket.index;
        match formation.challenge(member.staker, index, ledger.height()) {
            Ok(true) => warn!(staker = ?member.staker, index, "dropped invalid ticket"),
            Ok(false) => {}
            Err(err) => warn!(staker = ?member.staker, index, ?err, "challenge rejected"),
        }
    }
    ledger.advance(protocol.timeout_challenge - protocol.timeout_submission);
    if !formation.is_ready() {
        warn!(?entropy, retained, "not enough tickets to form a group");
        return;
    }

    // The group key stands in for the output of key generation among the members
    let members = formation.members();
    let mut public_key = Vec::with_capacity(members.len() * 8);
    for member in &members {
        public_key.extend_from_slice(&member.ticket.value.as_bytes()[..8]);
    }
    let group = mailbox
        .submit(Bytes::from(public_key), members.len() as u64)
        .await
        .expect("engine stopped");
    info!(
        index = group.index(),
        members = members.len(),
        height = group.height(),
        "admitted group"
    );
}
