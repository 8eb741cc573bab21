use anyhow::{anyhow, bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Validate;
use crate::simulation::{Entry, Vehicle, VehicleId};

/// Random rosters use the letters `a..=z` as labels.
pub const MAX_RANDOM_VEHICLES: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct VehicleSpec {
    pub label: char,
    pub origin: Entry,
    pub destination: Entry,
}

impl VehicleSpec {
    pub fn new(label: char, origin: Entry, destination: Entry) -> Self {
        Self { label, origin, destination }
    }
}

/// Where the roster comes from. Exactly one of the three must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VehiclesConfig {
    /// Compact form, e.g. `"aAC:bBD:cCA"`: label, origin, destination.
    #[serde(default)]
    pub roster: Option<String>,
    #[serde(default)]
    pub list: Vec<VehicleSpec>,
    /// Generate this many vehicles with random routes.
    #[serde(default)]
    pub count: Option<usize>,
}

impl VehiclesConfig {
    pub fn from_roster(roster: impl Into<String>) -> Self {
        Self {
            roster: Some(roster.into()),
            ..Self::default()
        }
    }

    pub fn random(count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::default()
        }
    }

    fn sources(&self) -> usize {
        usize::from(self.roster.is_some())
            + usize::from(!self.list.is_empty())
            + usize::from(self.count.is_some())
    }

    /// Resolve to a concrete roster; `seed` only matters for random rosters.
    pub fn resolve(&self, seed: Option<u64>) -> Result<Vec<VehicleSpec>> {
        if let Some(roster) = &self.roster {
            parse_roster(roster)
        } else if let Some(count) = self.count {
            Ok(random_roster(count, seed))
        } else {
            Ok(self.list.clone())
        }
    }
}

impl Validate for VehiclesConfig {
    fn validate(&self) -> Result<()> {
        match self.sources() {
            0 => bail!("No vehicles configured: set one of roster, list or count"),
            1 => {}
            _ => bail!("Vehicles must come from exactly one of roster, list or count"),
        }
        if let Some(count) = self.count {
            if count == 0 || count > MAX_RANDOM_VEHICLES {
                bail!("Random vehicle count must be in 1..={MAX_RANDOM_VEHICLES}, got {count}");
            }
        }
        if let Some(roster) = &self.roster {
            parse_roster(roster)?;
        }
        if !self.list.is_empty() {
            check_specs(&self.list)?;
        }
        Ok(())
    }
}

/// Parse the compact `<label><origin><destination>` form, colon separated.
pub fn parse_roster(roster: &str) -> Result<Vec<VehicleSpec>> {
    let specs = roster
        .split(':')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_token)
        .collect::<Result<Vec<_>>>()?;
    check_specs(&specs)?;
    Ok(specs)
}

fn parse_token(token: &str) -> Result<VehicleSpec> {
    let chars: Vec<char> = token.chars().collect();
    let &[label, origin, destination] = chars.as_slice() else {
        bail!("Roster entry '{token}' must be exactly three characters: label, origin, destination");
    };
    let origin = Entry::from_letter(origin)
        .ok_or_else(|| anyhow!("Roster entry '{token}': origin '{origin}' is not one of A-D"))?;
    let destination = Entry::from_letter(destination).ok_or_else(|| {
        anyhow!("Roster entry '{token}': destination '{destination}' is not one of A-D")
    })?;
    Ok(VehicleSpec::new(label, origin, destination))
}

fn check_specs(specs: &[VehicleSpec]) -> Result<()> {
    if specs.is_empty() {
        bail!("Vehicle roster is empty");
    }
    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !spec.label.is_ascii_alphanumeric() {
            bail!("Vehicle label '{}' must be an ASCII letter or digit", spec.label);
        }
        if !seen.insert(spec.label) {
            bail!("Vehicle label '{}' is used more than once", spec.label);
        }
    }
    Ok(())
}

/// Labels `a`, `b`, ... with uniformly drawn origin and destination.
pub fn random_roster(count: usize, seed: Option<u64>) -> Vec<VehicleSpec> {
    let mut rng = if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_entropy()
    };

    (0..count.min(MAX_RANDOM_VEHICLES))
        .map(|i| {
            let origin = Entry::ALL[rng.gen_range(0..Entry::ALL.len())];
            let destination = Entry::ALL[rng.gen_range(0..Entry::ALL.len())];
            VehicleSpec::new((b'a' + i as u8) as char, origin, destination)
        })
        .collect()
}

/// Turn specs into vehicles whose ids match their roster position.
pub fn build_vehicles(specs: &[VehicleSpec]) -> Vec<Vehicle> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| Vehicle::new(VehicleId(index), spec.label, spec.origin, spec.destination))
        .collect()
}

/// Back to the compact roster form.
pub fn format_roster(specs: &[VehicleSpec]) -> String {
    specs
        .iter()
        .map(|spec| format!("{}{}{}", spec.label, spec.origin, spec.destination))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_compact_roster() {
        let specs = parse_roster("aAC:bbd: cCA").unwrap();
        assert_eq!(
            specs,
            vec![
                VehicleSpec::new('a', Entry::A, Entry::C),
                VehicleSpec::new('b', Entry::B, Entry::D),
                VehicleSpec::new('c', Entry::C, Entry::A),
            ]
        );
        assert_eq!(format_roster(&specs), "aAC:bBD:cCA");
    }

    #[test]
    fn rejects_bad_rosters() {
        assert!(parse_roster("").is_err());
        assert!(parse_roster("aAE").is_err());
        assert!(parse_roster("aA").is_err());
        assert!(parse_roster("aAB:aCD").is_err());
        assert!(parse_roster("-AB").is_err());
    }

    #[test]
    fn seeded_random_roster_is_reproducible() {
        let first = random_roster(10, Some(7));
        let second = random_roster(10, Some(7));
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert_eq!(first[9].label, 'j');
    }

    #[test]
    fn exactly_one_source_is_required() {
        assert!(VehiclesConfig::default().validate().is_err());
        let mut both = VehiclesConfig::from_roster("aAB");
        both.count = Some(3);
        assert!(both.validate().is_err());
        assert!(VehiclesConfig::random(0).validate().is_err());
        assert!(VehiclesConfig::random(27).validate().is_err());
        assert!(VehiclesConfig::random(26).validate().is_ok());
    }

    #[test]
    fn vehicles_take_their_roster_index_as_id() {
        let vehicles = build_vehicles(&parse_roster("xAB:yDC").unwrap());
        assert_eq!(vehicles[1].id(), VehicleId(1));
        assert_eq!(vehicles[1].label(), 'y');
        assert_eq!(vehicles[1].origin(), Entry::D);
    }
}
