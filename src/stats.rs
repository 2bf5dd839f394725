use fnv::FnvHashSet;

use crate::types::Event;

/// Basic statistics of an event log, gathered in a separate pass before the pipeline runs.
pub struct DataStatistics {
    num_events: u64,
    num_users: usize,
    num_items: usize,
}

impl DataStatistics {

    pub fn num_events(&self) -> u64 {
        self.num_events
    }

    pub fn num_users(&self) -> usize {
        self.num_users
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }
}

impl<'a, T> From<T> for DataStatistics where T: Iterator<Item=&'a Event> {

    fn from(events: T) -> Self {

        let mut users: FnvHashSet<&str> =
            FnvHashSet::with_capacity_and_hasher(100, Default::default());
        let mut items: FnvHashSet<&str> =
            FnvHashSet::with_capacity_and_hasher(100, Default::default());

        let mut num_events: u64 = 0;

        for event in events {
            users.insert(&event.user_id);
            items.insert(&event.item_id);
            num_events += 1;
        }

        DataStatistics { num_events, num_users: users.len(), num_items: items.len() }
    }
}
