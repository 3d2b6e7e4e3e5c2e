/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Server settings

use config::{Config, ConfigError, Environment};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub listen: String,
    pub data_dir: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut s = Config::default();
        s.set_default("listen", "127.0.0.1:5000")?;
        s.set_default("data_dir", "data")?;
        s.merge(Environment::with_prefix("VAULTSETUP"))?;
        s.try_into()
    }
}
