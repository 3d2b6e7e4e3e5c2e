/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use actix_web::{App, HttpServer};
use dotenv::dotenv;
use log::info;

mod admin;
mod db;
mod migrate;
mod migrations;
mod settings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = settings::Settings::new().unwrap();

    info!("Starting vaultsetup server on {}...", settings.listen);

    let listen = settings.listen.clone();
    HttpServer::new(move || {
        App::new()
            .data(settings.clone())
            .configure(admin::config)
    })
    .bind(&listen)?
    .run()
    .await
}
