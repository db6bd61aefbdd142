// This file is part of swiss-pairing.
//
// swiss-pairing is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// swiss-pairing is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use swiss_pairing::{
    DraftId, Error, PlayerId,
    config::PairingConfig,
    draft::Draft,
    player::Player,
    round::Round,
    service,
    store::{MemoryStore, PlayerRepository},
    utils::{self, create_data_folder, data_file},
};

use crate::command_line::{Args, Command};

const STORE_FILE: &str = "store.ron";

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let Some(command) = args.command else {
        return Err(anyhow::Error::msg("no command given, see --help"));
    };

    let data = if let Some(data) = args.data {
        data
    } else {
        create_data_folder()?;
        data_file(STORE_FILE)
    };

    let config = match &args.config {
        Some(path) => PairingConfig::load(path)?,
        None => PairingConfig::default(),
    };
    debug!("{config:?}");

    let mut store = MemoryStore::load(&data)?;
    let mut rng = config.rng();

    run(&mut store, &command, &config, &mut rng)?;

    store.save(&data)?;
    debug!("saved {}", data.display());

    Ok(())
}

fn run(
    store: &mut MemoryStore,
    command: &Command,
    config: &PairingConfig,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    match *command {
        Command::Draft {
            id,
            tournament,
            players,
            rounds,
            first_table,
            last_table,
        } => {
            let mut draft = Draft::new(id, tournament, first_table);
            if let Some(last_table) = last_table {
                draft.table_last = last_table;
            }
            create_draft(store, draft, players, rounds);
        }
        Command::Seat { draft } => {
            for player in service::make_seatings(store, draft, rng)? {
                if let Some(seat) = player.seat {
                    println!("seat {seat}: {}", player.id);
                }
            }
        }
        Command::Pair { draft } => {
            let paired = service::pair_next_round(store, draft, config, rng)?;

            println!("round {}", paired.round.index + 1);
            for game in &paired.matches {
                println!("{} (match {})", game, game.id);
            }
            for player in &paired.byes {
                println!("bye: {player}");
            }
        }
        Command::Report {
            r#match,
            user,
            admin,
            wins1,
            wins2,
            version,
        } => {
            let actor = service::actor_for(&*store, r#match, user, admin)?;
            let game = service::report_result(store, r#match, &actor, wins1, wins2, version)?;
            println!("{game} [{}, version {}]", game.state(), game.version);
        }
        Command::Confirm {
            r#match,
            user,
            admin,
            version,
        } => {
            let actor = service::actor_for(&*store, r#match, user, admin)?;
            let game = service::confirm_result(store, r#match, &actor, version)?;
            println!("{game} [{}, version {}]", game.state(), game.version);
        }
        Command::Finish { round } => {
            let round = service::finish_round(store, round)?;
            println!(
                "round {} of draft {}: {}",
                round.index + 1,
                round.draft_id,
                round.status
            );
        }
        Command::Drop { player } => {
            let player = store
                .players
                .get_mut(&player)
                .ok_or(Error::UnknownPlayer(player))?;

            player.dropped = true;
            info!("{player} dropped");
        }
        Command::Ongoing { draft, player } => show_ongoing(store, draft, player)?,
        Command::Standings { tournament } => {
            let standings = service::compute_standings(&*store, tournament, config)?;
            for (rank, card) in (1..).zip(&standings) {
                println!("{rank:>3}. {card}");
            }
        }
    }

    Ok(())
}

fn create_draft(store: &mut MemoryStore, draft: Draft, players: u64, rounds: u32) {
    let id = draft.id;
    store.add_draft(draft);

    let first_player = store.players.keys().max().map_or(1, |id| id + 1);
    for player in first_player..first_player + players {
        store.add_player(Player::new(player, id));
    }

    let first_round = store.rounds.keys().max().map_or(1, |id| id + 1);
    for (round, index) in (first_round..).zip(0..rounds) {
        store.add_round(Round::new(round, id, index));
    }

    info!("draft {id}: created {players} players and {rounds} rounds");
}

fn show_ongoing(
    store: &MemoryStore,
    draft: DraftId,
    player: Option<PlayerId>,
) -> anyhow::Result<()> {
    let Some(player) = player else {
        for game in service::ongoing_matches(store, draft)? {
            println!("{} (match {}) [{}]", game, game.id, game.state());
        }
        return Ok(());
    };

    if let Some(current) = service::current_match(store, draft, player)? {
        println!(
            "{} (match {}), opponent {}",
            current.game, current.game.id, current.opponent
        );
    } else {
        let bye = store
            .players(draft)
            .iter()
            .any(|entry| entry.id == player && entry.bye);
        println!("{player} has {}", if bye { "a bye" } else { "no match" });
    }

    Ok(())
}
