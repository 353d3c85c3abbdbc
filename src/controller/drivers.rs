// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, path::Path, sync::Arc};

use tracing::error;

use super::Driver;
use crate::config::controller::Controller;

/// Creates a controller driver from the config. Script paths are resolved relative to base_path.
pub fn driver(config: &Controller, base_path: &Path) -> Result<Arc<dyn Driver>, Box<dyn Error>> {
    match config {
        Controller::Keyboard => Ok(Arc::new(super::keyboard::Driver::new())),
        Controller::Script(script) => Ok(Arc::new(super::script::Driver::new(
            base_path.join(script.path()),
            script.interval()?,
        ))),
        Controller::Multi(controllers) => {
            let mut sub_drivers = Vec::with_capacity(controllers.len());
            for (name, controller) in controllers {
                if let Controller::Multi(_) = controller {
                    error!(name, "Recursive multi controllers are not supported");
                    continue;
                }
                sub_drivers.push(driver(controller, base_path)?);
            }
            Ok(Arc::new(super::multi::Driver::new(sub_drivers)))
        }
    }
}
