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
use std::{io, sync::Arc};

use futures_util::future::join_all;
use tokio::{sync::mpsc::Sender, task::JoinHandle};

use super::Event;

/// A driver that runs several other drivers at once. It finishes when all of them have.
pub struct Driver {
    sub_drivers: Vec<Arc<dyn super::Driver>>,
}

impl Driver {
    pub fn new(sub_drivers: Vec<Arc<dyn super::Driver>>) -> Driver {
        Driver { sub_drivers }
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let join_handles = self
            .sub_drivers
            .iter()
            .map(|driver| driver.monitor_events(events_tx.clone()))
            .collect::<Vec<_>>();
        drop(events_tx);

        tokio::spawn(async move {
            for result in join_all(join_handles).await {
                result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
            }
            Ok(())
        })
    }
}
