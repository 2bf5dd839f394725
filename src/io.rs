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

use std::fs::File;
use std::io::{self, stdout, BufWriter, Write};
use std::path::Path;

use serde_derive::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::types::{AccuracyResult, Event, Neighbor, NeighborList};

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(b',');
    builder
}

/// Reads a CSV input file. We expect NO headers, and a `user,item,rating` tuple per line, any
/// further columns are ignored.
pub fn csv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>> {
    let reader = reader_builder().from_path(path)?;
    Ok(reader)
}

pub fn csv_reader_from<R: io::Read>(input: R) -> csv::Reader<R> {
    reader_builder().from_reader(input)
}

/// Interprets the first three fields of a record. Records with fewer fields or an unparseable
/// rating yield nothing.
pub fn parse_event(record: &csv::StringRecord) -> Option<Event> {
    if record.len() < 3 {
        return None;
    }

    let rating: f64 = record[2].trim().parse().ok()?;
    if !rating.is_finite() {
        return None;
    }

    Some(Event::new(&record[0], &record[1], rating))
}

/// Silently drops malformed records, including records which are not valid UTF-8.
pub fn events_from_csv<'a, R>(reader: &'a mut csv::Reader<R>) -> impl Iterator<Item=Event> + 'a
    where R: io::Read {

    reader.records()
        .filter_map(|result| result.ok())
        .filter_map(|record| parse_event(&record))
}

/// Writes to a file at `path` if given, to stdout otherwise.
fn output(path: Option<&str>) -> Result<Box<dyn Write>> {
    let out: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(Path::new(path))?)),
        None => Box::new(stdout()),
    };
    Ok(out)
}

/// Struct used for JSON serialization of neighbor lists. Field names will be used in JSON.
#[derive(Serialize)]
struct Neighbors<'a> {
    for_user: &'a str,
    neighbors: &'a [Neighbor],
}

#[derive(Serialize)]
struct MostSimilar<'a> {
    for_user: &'a str,
    most_similar: &'a str,
    score: f64,
}

pub fn write_accuracy(result: &AccuracyResult, mode: &str, path: Option<&str>) -> Result<()> {
    let mut out = output(path)?;

    let accuracy_as_json = json!({
        "mode": mode,
        "baseline_accuracy": result.baseline,
        "model_accuracy": result.model,
    });

    writeln!(out, "{}", accuracy_as_json.to_string())?;
    out.flush()?;

    Ok(())
}

/// One line per user with its `k` highest scored neighbors.
pub fn write_neighbors(
    neighbor_lists: &[NeighborList],
    k: usize,
    path: Option<&str>,
) -> Result<()> {

    let mut out = output(path)?;

    for list in neighbor_lists.iter() {
        let neighbors = Neighbors { for_user: &list.user_id, neighbors: list.top_k(k) };
        writeln!(out, "{}", serde_json::to_string(&neighbors)?)?;
    }
    out.flush()?;

    Ok(())
}

pub fn write_clusters(components: &[Vec<String>], path: Option<&str>) -> Result<()> {
    let mut out = output(path)?;

    for members in components.iter() {
        writeln!(out, "{}", json!({ "cluster": members }).to_string())?;
    }
    out.flush()?;

    Ok(())
}

pub fn write_most_similar(most_similar: &[(String, Neighbor)], path: Option<&str>) -> Result<()> {
    let mut out = output(path)?;

    for (user_id, neighbor) in most_similar.iter() {
        let entry = MostSimilar {
            for_user: user_id,
            most_similar: &neighbor.user_id,
            score: neighbor.score,
        };
        writeln!(out, "{}", serde_json::to_string(&entry)?)?;
    }
    out.flush()?;

    Ok(())
}
