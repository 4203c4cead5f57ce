use std::collections::BTreeMap;

use crate::venue::MapPoint;

/// Group key for a coordinate pair: both components rounded to 6 decimals.
/// Venues whose coordinates round to the same key share one marker.
pub fn coordinate_key(lat: f64, lng: f64) -> String {
    format!("{lat:.6},{lng:.6}")
}

/// Points bucketed by rounded coordinate. Rebuilt wholesale after every
/// fetch; iteration order is the key order, so equal inputs always produce
/// equal groupings regardless of input order.
#[derive(Debug)]
pub struct CoordinateGroups<T> {
    by_key: BTreeMap<String, Vec<T>>,
}

impl<T: MapPoint> CoordinateGroups<T> {
    pub fn new() -> Self {
        CoordinateGroups {
            by_key: BTreeMap::new(),
        }
    }

    /// Single pass over the input. Points missing either coordinate are
    /// excluded entirely; within a group, encounter order is kept.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.by_key.clear();
        for point in points {
            let Some((lat, lng)) = point.point_coords() else {
                continue;
            };
            if !(lat.is_finite() && lng.is_finite()) {
                continue;
            }
            self.by_key
                .entry(coordinate_key(lat, lng))
                .or_default()
                .push(point);
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    pub fn members(&self, key: &str) -> Option<&[T]> {
        self.by_key.get(key).map(Vec::as_slice)
    }

    pub fn size_of(&self, key: &str) -> usize {
        self.by_key.get(key).map(Vec::len).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.by_key
            .iter()
            .map(|(key, members)| (key.as_str(), members.as_slice()))
    }

    /// Members of one marker for the pick list, sorted by name
    /// case-insensitively.
    pub fn members_by_name(&self, key: &str) -> Vec<&T> {
        let mut members: Vec<&T> = self
            .by_key
            .get(key)
            .map(|group| group.iter().collect())
            .unwrap_or_default();
        members.sort_by(|a, b| {
            a.point_name()
                .to_lowercase()
                .cmp(&b.point_name().to_lowercase())
        });
        members
    }
}

impl<T: MapPoint> Default for CoordinateGroups<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::{Venue, VenueId};

    fn venue(id: VenueId, name: &str, coords: Option<(f64, f64)>) -> Venue {
        let mut venue: Venue =
            serde_json::from_str(&format!(r#"{{"id_sala": {id}, "nombre": "{name}"}}"#)).unwrap();
        if let Some((lat, lng)) = coords {
            venue.lat = Some(lat);
            venue.lng = Some(lng);
        }
        venue
    }

    /// Four venues at the same address whose raw coordinates differ only
    /// past the sixth decimal collapse into a single marker.
    #[test]
    fn same_rounded_coordinates_form_one_group() {
        let points = vec![
            venue(1, "A", Some((40.4168, -3.7038))),
            venue(2, "B", Some((40.41680001, -3.70379999))),
            venue(3, "C", Some((40.416800004, -3.703800002))),
            venue(4, "D", Some((40.4168, -3.7038))),
        ];
        let mut groups = CoordinateGroups::new();
        groups.rebuild(points);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.size_of("40.416800,-3.703800"), 4);
    }

    #[test]
    fn permuted_input_produces_identical_groups() {
        let forward = vec![
            venue(1, "A", Some((40.4168, -3.7038))),
            venue(2, "B", Some((41.3874, 2.1686))),
            venue(3, "C", Some((40.4168, -3.7038))),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let mut left = CoordinateGroups::new();
        left.rebuild(forward);
        let mut right = CoordinateGroups::new();
        right.rebuild(reversed);

        let left_keys: Vec<&str> = left.keys().collect();
        let right_keys: Vec<&str> = right.keys().collect();
        assert_eq!(left_keys, right_keys);
        for key in left_keys {
            let left_ids: Vec<VenueId> = left
                .members(key)
                .unwrap()
                .iter()
                .map(MapPoint::point_id)
                .collect();
            let mut right_ids: Vec<VenueId> = right
                .members(key)
                .unwrap()
                .iter()
                .map(MapPoint::point_id)
                .collect();
            right_ids.sort_unstable();
            let mut left_sorted = left_ids.clone();
            left_sorted.sort_unstable();
            assert_eq!(left_sorted, right_ids);
        }
    }

    #[test]
    fn points_missing_coordinates_are_excluded() {
        let points = vec![
            venue(1, "A", Some((40.0, -3.0))),
            venue(2, "B", None),
            {
                let mut v = venue(3, "C", None);
                v.lat = Some(40.0); // longitude still missing
                v
            },
        ];
        let mut groups = CoordinateGroups::new();
        groups.rebuild(points);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.size_of("40.000000,-3.000000"), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let points = vec![
            venue(1, "A", Some((40.4168, -3.7038))),
            venue(2, "B", Some((41.3874, 2.1686))),
        ];
        let mut groups = CoordinateGroups::new();
        groups.rebuild(points.clone());
        let first: Vec<String> = groups.keys().map(str::to_string).collect();
        groups.rebuild(points);
        let second: Vec<String> = groups.keys().map(str::to_string).collect();
        assert_eq!(first, second);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn members_by_name_sorts_case_insensitively() {
        let at = Some((40.0, -3.0));
        let points = vec![
            venue(1, "zeta", at),
            venue(2, "Alfa", at),
            venue(3, "beta", at),
        ];
        let mut groups = CoordinateGroups::new();
        groups.rebuild(points);
        let names: Vec<&str> = groups
            .members_by_name("40.000000,-3.000000")
            .iter()
            .map(|point| point.point_name())
            .collect();
        assert_eq!(names, vec!["Alfa", "beta", "zeta"]);
    }

    #[test]
    fn membership_of_one_point_never_disturbs_another_group() {
        let mut points = vec![
            venue(1, "A", Some((40.4168, -3.7038))),
            venue(2, "B", Some((41.3874, 2.1686))),
        ];
        let mut groups = CoordinateGroups::new();
        groups.rebuild(points.clone());
        assert_eq!(groups.size_of("41.387400,2.168600"), 1);

        points.push(venue(3, "C", Some((40.4168, -3.7038))));
        groups.rebuild(points);
        assert_eq!(groups.size_of("40.416800,-3.703800"), 2);
        assert_eq!(groups.size_of("41.387400,2.168600"), 1);
    }
}
