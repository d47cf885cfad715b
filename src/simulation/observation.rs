//! Fixed-length observation vector handed to the decision-maker.
//!
//! Layout, stable across steps of a run:
//!
//! ```text
//! client 0      [x, y, vx, vy, connected, signal_to_attached, dwell_to_attached]
//! ...
//! client C-1    [...]
//! ap 0          [x, y, load_ratio, signal_to_agent]
//! ...
//! ap A-1        [...]
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{AccessPoint, Client};

/// Values per client.
pub const CLIENT_FIELDS: usize = 7;

/// Values per access point.
pub const ACCESS_POINT_FIELDS: usize = 4;

const CLIENT_FIELD_NAMES: [&str; CLIENT_FIELDS] = [
    "x",
    "y",
    "vx",
    "vy",
    "connected",
    "signal_to_attached",
    "dwell_to_attached",
];

const ACCESS_POINT_FIELD_NAMES: [&str; ACCESS_POINT_FIELDS] =
    ["x", "y", "load_ratio", "signal_to_agent"];

/// Observable link quality of a client toward its attached access point.
///
/// Both values are 0 for a disconnected client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientReading {
    pub signal_to_attached: f64,
    pub dwell_to_attached: f64,
}

/// Shape of the observation vector for a given population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationLayout {
    pub num_clients: usize,
    pub num_access_points: usize,
}

impl ObservationLayout {
    pub fn new(num_clients: usize, num_access_points: usize) -> Self {
        Self {
            num_clients,
            num_access_points,
        }
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        CLIENT_FIELDS * self.num_clients + ACCESS_POINT_FIELDS * self.num_access_points
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn client_offset(&self, index: usize) -> usize {
        index * CLIENT_FIELDS
    }

    pub fn access_point_offset(&self, index: usize) -> usize {
        CLIENT_FIELDS * self.num_clients + index * ACCESS_POINT_FIELDS
    }

    /// Dotted name of every value, in vector order (`client0.vx`, `ap3.load_ratio`).
    pub fn field_names(&self) -> Vec<String> {
        let clients = (0..self.num_clients).flat_map(|i| {
            CLIENT_FIELD_NAMES
                .iter()
                .map(move |field| format!("client{i}.{field}"))
        });
        let access_points = (0..self.num_access_points).flat_map(|j| {
            ACCESS_POINT_FIELD_NAMES
                .iter()
                .map(move |field| format!("ap{j}.{field}"))
        });
        clients.chain(access_points).collect()
    }

    /// Assemble an observation.
    ///
    /// `readings` is indexed like `clients`, `agent_signals` like
    /// `access_points`. Missing entries are written as 0.
    pub fn build(
        &self,
        clients: &[Client],
        readings: &[ClientReading],
        access_points: &[AccessPoint],
        agent_signals: &[f64],
    ) -> Observation {
        let mut values = Vec::with_capacity(self.len());

        for (i, client) in clients.iter().enumerate().take(self.num_clients) {
            let reading = readings.get(i).copied().unwrap_or_default();
            let (position, velocity) = (client.position(), client.velocity());
            values.extend_from_slice(&[
                position.x,
                position.y,
                velocity.x,
                velocity.y,
                if client.is_connected() { 1.0 } else { 0.0 },
                reading.signal_to_attached,
                reading.dwell_to_attached,
            ]);
        }

        for (j, ap) in access_points.iter().enumerate().take(self.num_access_points) {
            let position = ap.position();
            values.extend_from_slice(&[
                position.x,
                position.y,
                ap.load_ratio(),
                agent_signals.get(j).copied().unwrap_or(0.0),
            ]);
        }

        values.resize(self.len(), 0.0);

        Observation {
            layout: *self,
            values,
        }
    }
}

/// One observation vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    layout: ObservationLayout,
    values: Vec<f64>,
}

impl Observation {
    pub fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The block of one client, or `None` past the population.
    pub fn client(&self, index: usize) -> Option<&[f64]> {
        if index >= self.layout.num_clients {
            return None;
        }
        let start = self.layout.client_offset(index);
        self.values.get(start..start + CLIENT_FIELDS)
    }

    /// The block of one access point, or `None` past the population.
    pub fn access_point(&self, index: usize) -> Option<&[f64]> {
        if index >= self.layout.num_access_points {
            return None;
        }
        let start = self.layout.access_point_offset(index);
        self.values.get(start..start + ACCESS_POINT_FIELDS)
    }
}

impl AsRef<[f64]> for Observation {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessPointId, ClientId, Vec2};

    #[test]
    fn test_layout_length() {
        let layout = ObservationLayout::new(15, 9);
        assert_eq!(layout.len(), 7 * 15 + 4 * 9);
        assert_eq!(layout.field_names().len(), layout.len());
        assert_eq!(layout.access_point_offset(0), 105);
    }

    #[test]
    fn test_field_names_order() {
        let names = ObservationLayout::new(1, 1).field_names();
        assert_eq!(names[0], "client0.x");
        assert_eq!(names[4], "client0.connected");
        assert_eq!(names[7], "ap0.x");
        assert_eq!(names[10], "ap0.signal_to_agent");
    }

    #[test]
    fn test_build_places_values() {
        let layout = ObservationLayout::new(2, 1);
        let clients = vec![
            Client::new(ClientId(0), Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)),
            Client::new(ClientId(1), Vec2::new(5.0, 6.0), Vec2::ZERO),
        ];
        let readings = vec![
            ClientReading::default(),
            ClientReading {
                signal_to_attached: 42.0,
                dwell_to_attached: 9.0,
            },
        ];
        let aps =
            vec![AccessPoint::with_occupancy(AccessPointId(0), Vec2::new(10.0, 20.0), 10, 250.0, 5).unwrap()];

        let obs = layout.build(&clients, &readings, &aps, &[77.0]);

        assert_eq!(obs.len(), layout.len());
        assert_eq!(obs.client(0).unwrap(), &[1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0]);
        assert_eq!(obs.client(1).unwrap()[5], 42.0);
        assert_eq!(obs.access_point(0).unwrap(), &[10.0, 20.0, 0.5, 77.0]);
        assert!(obs.client(2).is_none());
        assert!(obs.access_point(1).is_none());
    }

    #[test]
    fn test_build_pads_missing_entries() {
        let layout = ObservationLayout::new(2, 2);
        let obs = layout.build(&[], &[], &[], &[]);
        assert_eq!(obs.len(), layout.len());
        assert!(obs.as_slice().iter().all(|v| *v == 0.0));
    }
}
