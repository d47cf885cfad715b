//! Core types used throughout the handover core.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A point or displacement on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        (other - self).norm()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Identifier of a mobile client. Doubles as its index in the client set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub usize);

impl ClientId {
    /// The client whose handovers are chosen by the external policy.
    pub const AGENT: Self = Self(0);

    pub fn index(self) -> usize {
        self.0
    }

    pub fn is_agent(self) -> bool {
        self == Self::AGENT
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Identifier of an access point. Doubles as its index in the access point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessPointId(pub usize);

impl AccessPointId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AccessPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ap-{}", self.0)
    }
}

/// Attachment of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not attached to any access point. A valid state, not an error.
    #[default]
    Disconnected,
    /// Attached to exactly one access point.
    ConnectedTo(AccessPointId),
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::ConnectedTo(_))
    }

    pub fn access_point(self) -> Option<AccessPointId> {
        match self {
            Self::Disconnected => None,
            Self::ConnectedTo(id) => Some(id),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::ConnectedTo(id) => write!(f, "connected to {id}"),
        }
    }
}

/// Action supplied by the external policy for the agent client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Attempt a handover to the given access point.
    Handover(AccessPointId),
    /// Do not attempt a handover this step.
    NoHandover,
}

impl Action {
    /// Decode an action index from a discrete action space of size
    /// `num_access_points + 1`, where the last index is the no-op sentinel.
    pub fn from_index(index: usize, num_access_points: usize) -> Result<Self> {
        match index.cmp(&num_access_points) {
            std::cmp::Ordering::Less => Ok(Self::Handover(AccessPointId(index))),
            std::cmp::Ordering::Equal => Ok(Self::NoHandover),
            std::cmp::Ordering::Greater => Err(Error::InvalidAction {
                action: index,
                num_access_points,
            }),
        }
    }

    /// Encode back to an action index (inverse of [`Action::from_index`]).
    pub fn to_index(self, num_access_points: usize) -> usize {
        match self {
            Self::Handover(id) => id.index(),
            Self::NoHandover => num_access_points,
        }
    }

    /// Number of discrete actions for a given access point count.
    pub fn space_size(num_access_points: usize) -> usize {
        num_access_points + 1
    }
}

/// A mobile client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    position: Vec2,
    velocity: Vec2,
    connection: ConnectionState,
    last_handover_at: Option<f64>,
}

impl Client {
    /// Create a disconnected client that has never handed over.
    pub fn new(id: ClientId, position: Vec2, velocity: Vec2) -> Self {
        Self {
            id,
            position,
            velocity,
            connection: ConnectionState::Disconnected,
            last_handover_at: None,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Simulation time (seconds) of the last accepted handover.
    pub fn last_handover_at(&self) -> Option<f64> {
        self.last_handover_at
    }

    /// Seconds since the last accepted handover, if any.
    pub fn elapsed_since_handover(&self, now: f64) -> Option<f64> {
        self.last_handover_at.map(|at| (now - at).max(0.0))
    }

    pub(crate) fn set_kinematics(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
    }

    pub(crate) fn record_handover(&mut self, now: f64) {
        self.last_handover_at = Some(now);
    }
}

/// A fixed access point with bounded capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPoint {
    id: AccessPointId,
    position: Vec2,
    capacity: u32,
    occupancy: u32,
    coverage_radius: f64,
}

impl AccessPoint {
    /// Create an empty access point.
    pub fn new(id: AccessPointId, position: Vec2, capacity: u32, coverage_radius: f64) -> Result<Self> {
        Self::with_occupancy(id, position, capacity, coverage_radius, 0)
    }

    /// Create an access point with pre-existing occupancy.
    pub fn with_occupancy(
        id: AccessPointId,
        position: Vec2,
        capacity: u32,
        coverage_radius: f64,
        occupancy: u32,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig(format!("{id}: capacity must be positive")));
        }
        if !(coverage_radius.is_finite() && coverage_radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "{id}: coverage radius must be positive, got {coverage_radius}"
            )));
        }
        if !position.is_finite() {
            return Err(Error::InvalidConfig(format!("{id}: position must be finite")));
        }
        if occupancy > capacity {
            return Err(Error::InvalidConfig(format!(
                "{id}: occupancy {occupancy} exceeds capacity {capacity}"
            )));
        }
        Ok(Self {
            id,
            position,
            capacity,
            occupancy,
            coverage_radius,
        })
    }

    pub fn id(&self) -> AccessPointId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    pub fn coverage_radius(&self) -> f64 {
        self.coverage_radius
    }

    /// Occupancy as a fraction of capacity (0.0 - 1.0).
    pub fn load_ratio(&self) -> f64 {
        f64::from(self.occupancy) / f64::from(self.capacity)
    }

    pub fn has_capacity(&self) -> bool {
        self.occupancy < self.capacity
    }

    pub fn is_full(&self) -> bool {
        !self.has_capacity()
    }

    /// Admit one client. Returns false (and changes nothing) when full.
    pub(crate) fn admit(&mut self) -> bool {
        if self.has_capacity() {
            self.occupancy += 1;
            true
        } else {
            false
        }
    }

    /// Release one client; occupancy never goes below zero.
    pub(crate) fn release(&mut self) {
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    pub(crate) fn clear(&mut self) {
        self.occupancy = 0;
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} ({}/{})",
            self.id, self.position, self.occupancy, self.capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_math() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.norm(), 5.0);
        assert_eq!(Vec2::ZERO.distance(a), 5.0);
        assert_eq!(a.dot(Vec2::new(1.0, 0.0)), 3.0);
        assert_eq!(a - a, Vec2::ZERO);
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(-a, Vec2::new(-3.0, -4.0));
    }

    #[test]
    fn test_action_index_round_trip() {
        assert_eq!(
            Action::from_index(0, 9).unwrap(),
            Action::Handover(AccessPointId(0))
        );
        assert_eq!(Action::from_index(9, 9).unwrap(), Action::NoHandover);
        assert_eq!(Action::NoHandover.to_index(9), 9);
        assert_eq!(Action::space_size(9), 10);
    }

    #[test]
    fn test_action_out_of_range_is_error() {
        let err = Action::from_index(10, 9).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidAction {
                action: 10,
                num_access_points: 9
            }
        ));
    }

    #[test]
    fn test_access_point_admission() {
        let mut ap = AccessPoint::new(AccessPointId(0), Vec2::ZERO, 2, 250.0).unwrap();
        assert!(ap.admit());
        assert!(ap.admit());
        assert!(!ap.admit(), "full access point must refuse");
        assert_eq!(ap.occupancy(), 2);
        assert!(ap.is_full());

        ap.release();
        ap.release();
        ap.release();
        assert_eq!(ap.occupancy(), 0, "occupancy never negative");
    }

    #[test]
    fn test_access_point_rejects_bad_geometry() {
        assert!(AccessPoint::new(AccessPointId(0), Vec2::ZERO, 0, 250.0).is_err());
        assert!(AccessPoint::new(AccessPointId(0), Vec2::ZERO, 10, 0.0).is_err());
        assert!(AccessPoint::with_occupancy(AccessPointId(0), Vec2::ZERO, 10, 250.0, 11).is_err());
    }

    #[test]
    fn test_client_elapsed_since_handover() {
        let mut client = Client::new(ClientId(1), Vec2::ZERO, Vec2::ZERO);
        assert_eq!(client.elapsed_since_handover(10.0), None);
        client.record_handover(4.0);
        assert_eq!(client.elapsed_since_handover(10.0), Some(6.0));
    }
}
