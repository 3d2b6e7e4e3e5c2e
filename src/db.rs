/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Database handles for the per-concern SQLite stores

use sqlx::SqlitePool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error: {0}")]
    SqlxError(#[from] sqlx::error::Error),
    #[error("IO error: {0}")]
    IoError(#[from] async_std::io::Error),
}

/// Opens one logical store under the data directory, creating the directory
/// and database file on first use. The pool is scoped to a single invocation;
/// callers close it when the invocation's report is complete.
pub async fn open(data_dir: &str, name: &str) -> Result<SqlitePool, DbError> {
    async_std::fs::create_dir_all(std::path::Path::new(data_dir)).await?;
    let path = format!("{}/{}.db", data_dir, name);
    async_std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(std::path::Path::new(&path))
        .await?;
    Ok(SqlitePool::connect(&format!("sqlite:{}", path)).await?)
}
