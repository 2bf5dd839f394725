/**
 * CoSim
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashMap;
use scoped_pool::Pool;

use crate::shuffle;
use crate::types::{Event, ItemProfile, UserItemStat};

/// Reduces the ratings of an item into one `UserItemStat` per user. Users are emitted in order
/// of their first rating.
pub fn item_profile(item_id: &str, ratings: &[(String, f64)]) -> ItemProfile {

    let mut sums_and_counts: FnvHashMap<&str, (f64, u32)> =
        FnvHashMap::with_capacity_and_hasher(ratings.len(), Default::default());
    let mut users_in_order: Vec<&str> = Vec::new();

    for (user_id, rating) in ratings.iter() {
        let entry = sums_and_counts.entry(user_id.as_str()).or_insert_with(|| {
            users_in_order.push(user_id.as_str());
            (0.0, 0)
        });
        entry.0 += *rating;
        entry.1 += 1;
    }

    let stats = users_in_order.into_iter()
        .map(|user_id| {
            let (sum, visit_count) = sums_and_counts[user_id];
            UserItemStat {
                user_id: user_id.to_string(),
                item_id: item_id.to_string(),
                avg_rating: sum / visit_count as f64,
                visit_count,
            }
        })
        .collect();

    ItemProfile { item_id: item_id.to_string(), stats }
}

/// Groups the events by item and computes the profile of every item in parallel.
pub fn aggregate<I>(pool: &Pool, num_partitions: usize, events: I) -> Vec<ItemProfile>
    where I: IntoIterator<Item=Event> {

    let by_item = shuffle::group_by_key(
        events.into_iter().map(|event| (event.item_id, (event.user_id, event.rating))));

    shuffle::reduce_by_key(pool, num_partitions, by_item, |item_id: &String, ratings| {
        vec![item_profile(item_id, ratings)]
    })
}


#[cfg(test)]
mod tests {

    use scoped_pool::Pool;

    use super::*;
    use crate::types::Event;

    fn ratings(raw: &[(&str, f64)]) -> Vec<(String, f64)> {
        raw.iter().map(|(user, rating)| (user.to_string(), *rating)).collect()
    }

    #[test]
    fn averages_and_counts_visits() {
        let profile = item_profile("B1", &ratings(&[("U1", 5.0), ("U1", 3.0), ("U2", 4.0)]));

        assert_eq!(profile.item_id, "B1");
        assert_eq!(profile.stats.len(), 2);

        let u1 = &profile.stats[0];
        assert_eq!(u1.user_id, "U1");
        assert_eq!(u1.visit_count, 2);
        assert!((u1.avg_rating - 4.0).abs() < 1e-12);

        let u2 = &profile.stats[1];
        assert_eq!(u2.user_id, "U2");
        assert_eq!(u2.visit_count, 1);
        assert!((u2.avg_rating - 4.0).abs() < 1e-12);
    }

    #[test]
    fn visit_counts_add_up_to_events_and_averages_stay_in_scale() {
        let pool = Pool::new(2);

        let events = vec![
            Event::new("U1", "B1", 1.0),
            Event::new("U2", "B1", 5.0),
            Event::new("U1", "B1", 2.0),
            Event::new("U3", "B2", 3.0),
            Event::new("U1", "B2", 4.0),
            Event::new("U3", "B2", 5.0),
            Event::new("U3", "B2", 1.0),
        ];

        let profiles = aggregate(&pool, 2, events.clone());
        assert_eq!(profiles.len(), 2);

        for profile in profiles.iter() {
            let num_events = events.iter().filter(|e| e.item_id == profile.item_id).count();
            let num_visits: u32 = profile.stats.iter().map(|stat| stat.visit_count).sum();
            assert_eq!(num_visits as usize, num_events);

            for stat in profile.stats.iter() {
                assert!(stat.visit_count >= 1);
                assert!(stat.avg_rating >= 1.0 && stat.avg_rating <= 5.0);
            }
        }

        pool.shutdown();
    }

    #[test]
    fn rerunning_yields_identical_profiles() {
        let pool = Pool::new(2);

        let events = vec![
            Event::new("U1", "B1", 1.0),
            Event::new("U2", "B1", 5.0),
            Event::new("U2", "B3", 2.0),
        ];

        let mut first = aggregate(&pool, 2, events.clone());
        let mut second = aggregate(&pool, 2, events);
        first.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        second.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        assert_eq!(first, second);

        pool.shutdown();
    }
}
