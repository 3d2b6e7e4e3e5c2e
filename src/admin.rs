/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Admin setup API

use actix_web::{error, get, web, HttpResponse};

use crate::{
    db,
    migrate::{self, UnitReport},
    migrations,
    settings::Settings,
};

#[derive(serde::Serialize)]
struct SetInfo {
    name: &'static str,
    database: &'static str,
    units: usize,
}

#[derive(serde::Serialize)]
struct SetupResponse {
    success: bool,
    results: Vec<UnitReport>,
}

#[get("/admin/setup")]
async fn list_sets() -> HttpResponse {
    let sets: Vec<SetInfo> = migrations::SETS
        .iter()
        .map(|set| SetInfo {
            name: set.name,
            database: set.database,
            units: set.units.len(),
        })
        .collect();
    HttpResponse::Ok().json(sets)
}

#[get("/admin/setup/{name}")]
async fn run_set(
    web::Path(name): web::Path<String>,
    settings: web::Data<Settings>,
) -> actix_web::Result<HttpResponse> {
    let set = migrations::find(&name)
        .ok_or_else(|| error::ErrorNotFound("unknown migration set"))?;
    let results = match db::open(&settings.data_dir, set.database).await {
        Ok(pool) => {
            let results = migrate::apply(&pool, set.units).await;
            pool.close().await;
            results
        }
        Err(err) => migrate::store_unavailable(set.units, &err),
    };
    let success = results.iter().all(|r| !r.outcome.is_failed());
    Ok(HttpResponse::Ok().json(SetupResponse { success, results }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_sets).service(run_set);
}
