// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use dealdesk::commands::{self, Context};
use dealdesk::{cli, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    logging::init(matches.get_count("verbose"));

    let mut conn = db::open_or_init()?;
    let ctx = Context::from_matches(&matches);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("doctor", sub)) => commands::doctor::handle(&conn, ctx.now, sub.get_flag("purge-carts"))?,
        Some(("config", sub)) => commands::config::handle(&conn, &ctx, sub)?,
        Some(("user", sub)) => commands::users::handle(&conn, &ctx, sub)?,
        Some(("asset", sub)) => commands::assets::handle(&conn, &ctx, sub)?,
        Some(("deal", sub)) => commands::deals::handle(&conn, &ctx, sub)?,
        Some(("valuation", sub)) => commands::valuations::handle(&conn, &ctx, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, &ctx, sub)?,
        Some(("category", sub)) => commands::catalog::handle_category(&conn, &ctx, sub)?,
        Some(("item", sub)) => commands::catalog::handle_item(&conn, &ctx, sub)?,
        Some(("variant", sub)) => commands::catalog::handle_variant(&conn, &ctx, sub)?,
        Some(("pos", sub)) => commands::pos::handle(&mut conn, &ctx, sub)?,
        Some(("holding", sub)) => commands::holdings::handle(&mut conn, &ctx, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &ctx, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, &ctx, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
