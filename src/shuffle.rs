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

// In-process stand-in for a distributed map/reduce substrate. Records are regrouped by key and
// every key group is reduced independently on a worker of a scoped thread pool.

use std::hash::Hash;
use std::sync::Mutex;

use fnv::FnvHashMap;
use scoped_pool::Pool;

/// Delivers all values sharing a key together. No order is guaranteed within a key.
pub fn group_by_key<K, V, I>(records: I) -> FnvHashMap<K, Vec<V>>
    where K: Hash + Eq, I: IntoIterator<Item=(K, V)> {

    let mut groups: FnvHashMap<K, Vec<V>> = FnvHashMap::default();

    for (key, value) in records {
        groups.entry(key).or_insert_with(Vec::new).push(value);
    }

    groups
}

/// Runs `reducer` once per key, spreading the keys over `num_partitions` pool jobs.
pub fn reduce_by_key<K, V, O, F>(
    pool: &Pool,
    num_partitions: usize,
    groups: FnvHashMap<K, Vec<V>>,
    reducer: F,
) -> Vec<O>
    where K: Sync, V: Sync, O: Send, F: Fn(&K, &[V]) -> Vec<O> + Sync {

    let groups: Vec<(K, Vec<V>)> = groups.into_iter().collect();

    flat_map(pool, num_partitions, &groups, |group: &(K, Vec<V>)| reducer(&group.0, &group.1))
}

/// Data-parallel map stage, each input may produce any number of outputs. Outputs are
/// concatenated in partition order.
pub fn flat_map<I, O, F>(pool: &Pool, num_partitions: usize, inputs: &[I], mapper: F) -> Vec<O>
    where I: Sync, O: Send, F: Fn(&I) -> Vec<O> + Sync {

    if inputs.is_empty() {
        return Vec::new();
    }

    let num_partitions = std::cmp::max(num_partitions, 1);
    let partition_size = (inputs.len() + num_partitions - 1) / num_partitions;

    let partitions: Vec<&[I]> = inputs.chunks(partition_size).collect();
    let outputs: Vec<Mutex<Vec<O>>> = partitions.iter().map(|_| Mutex::new(Vec::new())).collect();

    pool.scoped(|scope| {
        for (partition, output) in partitions.iter().zip(outputs.iter()) {

            let mapper = &mapper;

            scope.execute(move || {
                let mut results = Vec::new();
                for input in partition.iter() {
                    results.extend(mapper(input));
                }

                let mut output = output.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *output = results;
            });
        }
    });

    outputs.into_iter()
        .flat_map(|output| output.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
        .collect()
}


/// Folds every partition of `inputs` into its own accumulator, one pool job per partition. The
/// partial results are returned in partition order, merging them is up to the caller.
pub fn fold_partitions<I, A, F>(pool: &Pool, num_partitions: usize, inputs: &[I], fold: F) -> Vec<A>
    where I: Sync, A: Default + Send, F: Fn(A, &I) -> A + Sync {

    if inputs.is_empty() {
        return Vec::new();
    }

    let num_partitions = std::cmp::max(num_partitions, 1);
    let partition_size = (inputs.len() + num_partitions - 1) / num_partitions;

    let partitions: Vec<&[I]> = inputs.chunks(partition_size).collect();
    let partials: Vec<Mutex<A>> = partitions.iter().map(|_| Mutex::new(A::default())).collect();

    pool.scoped(|scope| {
        for (partition, partial) in partitions.iter().zip(partials.iter()) {

            let fold = &fold;

            scope.execute(move || {
                let accumulated = partition.iter().fold(A::default(), |acc, input| fold(acc, input));

                let mut partial = partial.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                *partial = accumulated;
            });
        }
    });

    partials.into_iter()
        .map(|partial| partial.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
        .collect()
}

#[cfg(test)]
mod tests {

    use scoped_pool::Pool;
    use super::*;

    #[test]
    fn groups_values_by_key() {
        let records = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("a", 5)];

        let groups = group_by_key(records);

        assert_eq!(groups.len(), 3);
        let mut values_of_a = groups["a"].clone();
        values_of_a.sort();
        assert_eq!(values_of_a, vec![1, 3, 5]);
        assert_eq!(groups["b"], vec![2]);
        assert_eq!(groups["c"], vec![4]);
    }

    #[test]
    fn reduces_every_key_once() {
        let pool = Pool::new(3);

        let records: Vec<(u32, u32)> = (0..100).map(|n| (n % 7, n)).collect();
        let groups = group_by_key(records);

        let mut sums = reduce_by_key(&pool, 4, groups, |key, values| {
            vec![(*key, values.iter().sum::<u32>())]
        });
        sums.sort();

        assert_eq!(sums.len(), 7);
        let expected_sum_for_zero: u32 = (0..100).filter(|n| n % 7 == 0).sum();
        assert_eq!(sums[0], (0, expected_sum_for_zero));
        assert_eq!(sums.iter().map(|(_, sum)| sum).sum::<u32>(), (0..100).sum::<u32>());

        pool.shutdown();
    }

    #[test]
    fn flat_map_keeps_partition_order() {
        let pool = Pool::new(2);

        let inputs: Vec<u32> = (0..10).collect();
        let outputs = flat_map(&pool, 3, &inputs, |n| vec![*n, *n]);

        assert_eq!(outputs.len(), 20);
        assert_eq!(&outputs[..4], &[0, 0, 1, 1]);

        let nothing: Vec<u32> = flat_map(&pool, 3, &Vec::<u32>::new(), |n| vec![*n]);
        assert!(nothing.is_empty());

        pool.shutdown();
    }

    #[test]
    fn folds_each_partition_once() {
        let pool = Pool::new(2);

        let inputs: Vec<u32> = (1..=10).collect();
        let partials = fold_partitions(&pool, 3, &inputs, |sum: u32, n| sum + *n);

        assert_eq!(partials, vec![1 + 2 + 3 + 4, 5 + 6 + 7 + 8, 9 + 10]);

        let nothing: Vec<u32> = fold_partitions(&pool, 3, &Vec::<u32>::new(), |sum: u32, n| sum + *n);
        assert!(nothing.is_empty());

        pool.shutdown();
    }
}
