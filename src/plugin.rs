//! Bevy integration: the dig service as a resource on a fixed tick.
//!
//! Inbound client messages arrive as `DigRequest` events and are handled in
//! `Update`, between ticks. Both tick phases run chained in `FixedUpdate`.
//! Every system reads the same clock (`Time<Virtual>` elapsed seconds).

use bevy::prelude::*;
use tracing::debug;

use crate::collab::Collaborators;
use crate::config::DigConfig;
use crate::player::{PlayerId, Tool};
use crate::service::{DigOutcome, DigService};

pub struct DigPlugin {
    config: DigConfig,
    collaborators: Collaborators,
}

impl DigPlugin {
    pub fn new(config: DigConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }
}

impl Plugin for DigPlugin {
    fn build(&self, app: &mut App) {
        let service = DigService::new(self.config.clone(), self.collaborators.clone());

        app.insert_resource(DigServer(service))
            .insert_resource(Time::<Fixed>::from_hz(self.config.tick_rate.max(1) as f64))
            .add_event::<DigRequest>()
            .add_event::<DigResponse>()
            .add_systems(Update, handle_dig_requests)
            .add_systems(FixedUpdate, (roll_tick_system, dig_tick_system).chain());
    }
}

#[derive(Resource)]
pub struct DigServer(pub DigService);

/// Inbound message from a client (or the connection layer)
#[derive(Event, Debug, Clone, PartialEq)]
pub enum DigRequest {
    Connect(PlayerId),
    Disconnect(PlayerId),
    Equip(PlayerId, Tool),
    BeginRoll(PlayerId),
    EndRoll(PlayerId),
    Dig(PlayerId),
    ZoneChanged(PlayerId, String),
}

/// Result of a `DigRequest::Dig`
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DigResponse {
    pub player: PlayerId,
    pub outcome: DigOutcome,
}

fn handle_dig_requests(
    time: Res<Time<Virtual>>,
    mut requests: EventReader<DigRequest>,
    mut responses: EventWriter<DigResponse>,
    mut server: ResMut<DigServer>,
) {
    let now = time.elapsed_secs_f64();
    let service = &mut server.0;

    for request in requests.read() {
        match request {
            DigRequest::Connect(player) => service.connect(*player),
            DigRequest::Disconnect(player) => service.disconnect(*player, now),
            DigRequest::Equip(player, tool) => {
                if !service.equip(*player, *tool) {
                    debug!(%player, ?tool, "equip refused");
                }
            }
            DigRequest::BeginRoll(player) => {
                service.begin_roll(*player, now);
            }
            DigRequest::EndRoll(player) => {
                service.end_roll(*player, now);
            }
            DigRequest::Dig(player) => {
                let outcome = service.dig(*player, now);
                responses.send(DigResponse {
                    player: *player,
                    outcome,
                });
            }
            DigRequest::ZoneChanged(player, map) => service.zone_changed(*player, map, now),
        }
    }
}

fn roll_tick_system(time: Res<Time<Virtual>>, mut server: ResMut<DigServer>) {
    server.0.tick_rolls(time.elapsed_secs_f64());
}

fn dig_tick_system(
    clock: Res<Time<Virtual>>,
    fixed: Res<Time<Fixed>>,
    mut server: ResMut<DigServer>,
) {
    server
        .0
        .tick(clock.elapsed_secs_f64(), fixed.delta_secs_f64());
}
