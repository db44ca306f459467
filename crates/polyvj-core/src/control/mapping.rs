//! Controller-number to parameter mapping.

use std::collections::BTreeMap;

use super::Param;

/// Mapping from control-change numbers (0-127) to parameters.
///
/// Keyed by controller number, so a number can drive at most one parameter;
/// rebinding a number replaces whatever it pointed at before.
#[derive(Clone, Debug, PartialEq)]
pub struct CcMap {
    slots: [Option<Param>; 128],
}

impl Default for CcMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl CcMap {
    /// The default assignment: controller `n` drives parameter `cc<n>` for
    /// n in 1..=16.
    pub fn identity() -> Self {
        let mut slots = [None; 128];
        for param in Param::ALL {
            slots[param.number() as usize] = Some(param);
        }
        Self { slots }
    }

    pub fn bind(&mut self, cc: u8, param: Param) {
        self.slots[cc as usize] = Some(param);
    }

    pub fn lookup(&self, cc: u8) -> Option<Param> {
        self.slots[cc as usize]
    }

    /// First controller number currently bound to `param`, for HUD display.
    pub fn cc_for(&self, param: Param) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| *slot == Some(param))
            .map(|cc| cc as u8)
    }

    /// Persisted form: controller number (as string key) to parameter name.
    pub fn to_table(&self) -> BTreeMap<String, String> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(cc, slot)| slot.map(|p| (cc.to_string(), p.name().to_string())))
            .collect()
    }

    /// Rebuild from a persisted table. Unknown parameter names and
    /// out-of-range controller numbers are dropped; an empty or garbage
    /// table falls back to the identity assignment.
    pub fn from_table(table: &BTreeMap<String, String>) -> Self {
        let mut map = Self {
            slots: [None; 128],
        };
        let mut bound = 0;
        for (key, name) in table {
            let cc = match key.parse::<u8>() {
                Ok(n) if n < 128 => n,
                _ => continue,
            };
            if let Some(param) = Param::from_name(name) {
                map.slots[cc as usize] = Some(param);
                bound += 1;
            }
        }
        if bound == 0 {
            return Self::identity();
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mapping() {
        let map = CcMap::identity();
        for param in Param::ALL {
            assert_eq!(map.lookup(param.number()), Some(param));
            assert_eq!(map.cc_for(param), Some(param.number()));
        }
        assert_eq!(map.lookup(0), None);
        assert_eq!(map.lookup(17), None);
    }

    #[test]
    fn test_rebind_replaces_previous_target() {
        let mut map = CcMap::identity();
        map.bind(1, Param::Zoom);
        assert_eq!(map.lookup(1), Some(Param::Zoom));
        // cc1 no longer drives Intensity anywhere.
        assert_eq!(map.cc_for(Param::Intensity), None);
    }

    #[test]
    fn test_table_round_trip() {
        let mut map = CcMap::identity();
        map.bind(74, Param::NoiseScale);
        map.bind(7, Param::Intensity);

        let restored = CcMap::from_table(&map.to_table());
        assert_eq!(restored, map);
    }

    #[test]
    fn test_from_table_drops_garbage_entries() {
        let mut table = BTreeMap::new();
        table.insert("7".to_string(), "cc3".to_string());
        table.insert("200".to_string(), "cc1".to_string());
        table.insert("banana".to_string(), "cc2".to_string());
        table.insert("9".to_string(), "not-a-param".to_string());

        let map = CcMap::from_table(&table);
        assert_eq!(map.lookup(7), Some(Param::Speed));
        assert_eq!(map.lookup(9), None);
        assert_eq!(map.cc_for(Param::Intensity), None);
    }

    #[test]
    fn test_from_empty_table_falls_back_to_identity() {
        let map = CcMap::from_table(&BTreeMap::new());
        assert_eq!(map, CcMap::identity());
    }
}
